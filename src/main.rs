//! Inventory gate probe.
//!
//! Runs one validation through the production orchestrator so operators can
//! check flag, breaker and catalog wiring from a shell.
//!
//! # Architecture Overview
//!
//! ```text
//!   cart-mutation handler
//!          │
//!          ▼
//!   ┌────────────────────────────────────────────────────────────┐
//!   │                  ValidationOrchestrator                     │
//!   │                                                             │
//!   │  ┌─────────────┐   ┌────────────────┐   ┌───────────────┐  │
//!   │  │ FeatureGate │──▶│ CircuitBreaker │──▶│  Inventory    │──┼──▶ product catalog
//!   │  │  (flags)    │   │ (resilience)   │   │  Validator    │  │
//!   │  └─────────────┘   └────────────────┘   └───────┬───────┘  │
//!   │                                                  ▼          │
//!   │                         ┌─────────────┐   ┌───────────┐    │
//!   │                         │  Telemetry  │◀──│  decide   │    │
//!   │                         │  Emitter    │   │ (policy)  │    │
//!   │                         └─────────────┘   └─────┬─────┘    │
//!   └─────────────────────────────────────────────────┼──────────┘
//!                                                     ▼
//!                                   Admit / RejectBusiness / RejectSystem
//! ```
//!
//! Exit codes: 0 admit, 2 insufficient inventory, 3 validation unavailable.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use inventory_gate::config::{load_config, GateConfig, SharedPolicy};
use inventory_gate::gate::{CallerContext, ValidationOrchestrator, ValidationRequest, Verdict};
use inventory_gate::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "inventory-gate")]
#[command(about = "Validate a cart mutation against the inventory authority", long_about = None)]
struct Cli {
    /// TOML configuration file (defaults apply when omitted).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Caller user id used for flag targeting.
    #[arg(short, long)]
    user: Option<String>,

    /// Product to validate.
    product_id: String,

    /// Quantity the cart wants to add.
    quantity: u32,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GateConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "inventory-gate starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    tracing::info!(
        base_url = %config.inventory.base_url,
        flag_key = %config.feature_flag.flag_key,
        timeout_ms = config.policy.timeout_ms,
        fail_open = config.policy.fail_open,
        "Configuration loaded"
    );

    let policy = SharedPolicy::new(config.policy.clone());
    let orchestrator = ValidationOrchestrator::from_config(&config, policy)?;

    let mut caller = CallerContext::new();
    if let Some(user) = cli.user {
        caller = caller.with_user(user);
    }
    let request = ValidationRequest::new(cli.product_id, cli.quantity, caller)?;

    let evaluation = orchestrator.evaluate(&request).await;
    let code = match &evaluation.verdict {
        Verdict::Admit { degraded } => {
            println!(
                "admit{} (available: {})",
                if *degraded { " (degraded)" } else { "" },
                evaluation
                    .result
                    .available_quantity()
                    .map_or_else(|| "unknown".to_string(), |q| q.to_string())
            );
            ExitCode::SUCCESS
        }
        Verdict::RejectBusiness(detail) => {
            println!("reject: {detail}");
            ExitCode::from(2)
        }
        Verdict::RejectSystem => {
            println!("reject: inventory validation unavailable");
            ExitCode::from(3)
        }
    };

    Ok(code)
}
