//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use inventory_gate::config::{InventoryConfig, SharedPolicy, ValidationPolicy};
use inventory_gate::flags::{FeatureGate, StaticFlagProvider};
use inventory_gate::gate::ValidationOrchestrator;
use inventory_gate::inventory::{
    HttpInventoryClient, InventoryAuthority, InventoryLevel, LookupError, ProductRecord,
};
use inventory_gate::observability::{InMemorySink, TelemetryEmitter};

/// Canned catalog response.
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl MockResponse {
    pub fn product(id: &str, available: u32) -> Self {
        Self {
            status: 200,
            body: product_json(id, available),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

pub fn product_json(id: &str, available: u32) -> String {
    serde_json::json!({
        "id": id,
        "name": "Explorascope",
        "description": "A telescope",
        "picture": "explorascope.jpg",
        "priceUsd": {"currencyCode": "USD", "units": 101, "nanos": 960000000},
        "categories": ["telescopes"],
        "inventory": {"schemaVersion": 1, "availableQuantity": available}
    })
    .to_string()
}

/// Start a programmable catalog on an ephemeral port.
///
/// `f` receives the zero-based call index. Returns the bound address and the
/// shared call counter.
pub async fn start_programmable_catalog<F, Fut>(f: F) -> (SocketAddr, Arc<AtomicU32>)
where
    F: Fn(u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let index = counter.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        read_request_head(&mut socket).await;
                        let response = f(index).await;
                        tokio::time::sleep(response.delay).await;

                        let status_text = match response.status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            504 => "504 Gateway Timeout",
                            _ => "200 OK",
                        };
                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            response.body.len(),
                            response.body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, calls)
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 512];
    let mut expected: Option<usize> = None;
    loop {
        if let Some(total) = expected {
            if buf.len() >= total {
                return;
            }
        } else if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            // Drain the body too; closing with unread bytes resets the connection.
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            expected = Some(end + 4 + body_len);
            continue;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

pub fn http_client(addr: SocketAddr) -> HttpInventoryClient {
    HttpInventoryClient::new(&InventoryConfig {
        base_url: format!("http://{addr}"),
        ..InventoryConfig::default()
    })
    .unwrap()
}

/// Behaviour of [`FakeAuthority`] for the next lookups.
#[derive(Clone)]
pub enum Behaviour {
    Available(u32),
    Fail(LookupError),
    Missing,
}

/// In-process authority with a call counter and optional delay.
pub struct FakeAuthority {
    behaviour: Mutex<Behaviour>,
    delay: Mutex<Duration>,
    calls: AtomicU32,
}

impl FakeAuthority {
    pub fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour: Mutex::new(behaviour),
            delay: Mutex::new(Duration::ZERO),
            calls: AtomicU32::new(0),
        })
    }

    pub fn set(&self, behaviour: Behaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryAuthority for FakeAuthority {
    async fn lookup(&self, product_id: &str) -> Result<ProductRecord, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let behaviour = self.behaviour.lock().unwrap().clone();
        match behaviour {
            Behaviour::Available(available) => Ok(ProductRecord {
                id: product_id.to_string(),
                inventory: Some(InventoryLevel {
                    schema_version: 1,
                    available_quantity: available,
                }),
                ..ProductRecord::default()
            }),
            Behaviour::Fail(error) => Err(error),
            Behaviour::Missing => Ok(ProductRecord {
                id: product_id.to_string(),
                ..ProductRecord::default()
            }),
        }
    }
}

/// Orchestrator over `authority` with an in-memory telemetry sink.
pub fn orchestrator(
    authority: Arc<dyn InventoryAuthority>,
    policy: ValidationPolicy,
    flag_enabled: bool,
) -> (Arc<ValidationOrchestrator>, Arc<InMemorySink>) {
    let sink = Arc::new(InMemorySink::default());
    let gate = FeatureGate::new(
        Arc::new(StaticFlagProvider::new(flag_enabled)),
        "cartInventoryValidation",
        Duration::from_millis(100),
    );
    let orchestrator = ValidationOrchestrator::new(
        gate,
        authority,
        TelemetryEmitter::new(vec![sink.clone()]),
        SharedPolicy::new(policy),
    );
    (Arc::new(orchestrator), sink)
}
