//! Policy hot reload.
//!
//! The policy lives behind an `ArcSwap`; a reload swaps the whole value so a
//! call that already took its snapshot keeps seeing the old one.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::loader::load_config;
use crate::config::schema::ValidationPolicy;

/// Shared, atomically replaceable validation policy.
#[derive(Debug, Clone)]
pub struct SharedPolicy {
    inner: Arc<ArcSwap<ValidationPolicy>>,
}

impl SharedPolicy {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(policy)),
        }
    }

    /// Take a snapshot for the duration of one call.
    pub fn snapshot(&self) -> Arc<ValidationPolicy> {
        self.inner.load_full()
    }

    /// Replace the policy for all subsequent calls.
    pub fn replace(&self, policy: ValidationPolicy) {
        self.inner.store(Arc::new(policy));
    }
}

impl Default for SharedPolicy {
    fn default() -> Self {
        Self::new(ValidationPolicy::default())
    }
}

/// Watches the configuration file and swaps in the new policy on change.
pub struct PolicyWatcher {
    path: PathBuf,
    policy: SharedPolicy,
}

impl PolicyWatcher {
    pub fn new(path: &Path, policy: SharedPolicy) -> Self {
        Self {
            path: path.to_path_buf(),
            policy,
        }
    }

    /// Reload the file once. Invalid files leave the current policy in place.
    pub fn reload(&self) -> bool {
        reload_into(&self.path, &self.policy)
    }

    /// Start watching. The returned watcher must be kept alive.
    ///
    /// The parent directory is watched so editors that save by renaming a
    /// temporary file over the config are picked up too.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let policy = self.policy.clone();
        let file_name = self.path.file_name().map(|name| name.to_os_string());
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                        tracing::info!(
                            path = ?path,
                            "Config file change detected, reloading policy"
                        );
                        reload_into(&path, &policy);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Policy watcher started");
        Ok(watcher)
    }
}

fn reload_into(path: &Path, policy: &SharedPolicy) -> bool {
    match load_config(path) {
        Ok(config) => {
            tracing::info!(
                timeout_ms = config.policy.timeout_ms,
                fail_open = config.policy.fail_open,
                failure_threshold = config.policy.failure_threshold,
                "Validation policy reloaded"
            );
            policy.replace(config.policy);
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current policy");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Instant;

    // Write next to the config and rename over it, the way editors save.
    fn save(path: &Path, contents: &str) {
        let staging = path.with_extension("toml.tmp");
        std::fs::write(&staging, contents).unwrap();
        std::fs::rename(&staging, path).unwrap();
    }

    fn wait_for(shared: &SharedPolicy, timeout_ms: u64) -> bool {
        let give_up = Instant::now() + Duration::from_secs(10);
        while Instant::now() < give_up {
            if shared.snapshot().timeout_ms == timeout_ms {
                return true;
            }
            std::thread::sleep(Duration::from_millis(25));
        }
        false
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let shared = SharedPolicy::default();
        let before = shared.snapshot();

        let mut next = ValidationPolicy::default();
        next.fail_open = false;
        shared.replace(next);

        assert!(before.fail_open);
        assert!(!shared.snapshot().fail_open);
    }

    #[test]
    fn test_invalid_reload_keeps_policy() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[policy]\ntimeout_ms = 0\n").unwrap();

        let shared = SharedPolicy::default();
        let watcher = PolicyWatcher::new(file.path(), shared.clone());
        assert!(!watcher.reload());
        assert_eq!(shared.snapshot().timeout_ms, 500);
    }

    #[test]
    fn test_valid_reload_swaps_policy() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[policy]\ntimeout_ms = 900\nfail_open = false\n").unwrap();

        let shared = SharedPolicy::default();
        let watcher = PolicyWatcher::new(file.path(), shared.clone());
        assert!(watcher.reload());
        assert_eq!(shared.snapshot().timeout_ms, 900);
        assert!(!shared.snapshot().fail_open);
    }

    #[test]
    fn test_watcher_swaps_policy_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.toml");
        std::fs::write(&path, "[policy]\ntimeout_ms = 500\n").unwrap();

        let shared = SharedPolicy::default();
        let _watcher = PolicyWatcher::new(&path, shared.clone()).run().unwrap();

        save(&path, "[policy]\ntimeout_ms = 900\nfail_open = false\n");
        assert!(wait_for(&shared, 900), "policy was not reloaded");
        assert!(!shared.snapshot().fail_open);
    }

    #[test]
    fn test_watcher_keeps_policy_on_invalid_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.toml");
        std::fs::write(&path, "[policy]\ntimeout_ms = 500\n").unwrap();

        let shared = SharedPolicy::default();
        let _watcher = PolicyWatcher::new(&path, shared.clone()).run().unwrap();

        save(&path, "[policy]\ntimeout_ms = 800\n");
        assert!(wait_for(&shared, 800));

        save(&path, "[policy]\ntimeout_ms = 0\nfail_open = false\n");
        std::thread::sleep(Duration::from_millis(300));
        assert_eq!(shared.snapshot().timeout_ms, 800);
        assert!(shared.snapshot().fail_open);

        // Events are handled in order, so seeing 700 means the invalid save
        // was processed and rejected first.
        save(&path, "[policy]\ntimeout_ms = 700\n");
        assert!(wait_for(&shared, 700));
        assert!(shared.snapshot().fail_open);
    }
}
