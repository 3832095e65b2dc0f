//! Process-wide singleton lifecycle registry (§4.4, §9 "Global mutable
//! state"): a weak index keyed by PID, not an owning container. Teardown
//! runs in LIFO spawn order.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, Weak};

use tokio::sync::Mutex;

use crate::process::SessionProcess;

struct RegistryState {
    processes: BTreeMap<u32, Weak<Mutex<SessionProcess>>>,
    spawn_order: Vec<u32>,
}

pub struct ProcessRegistry {
    inner: Mutex<RegistryState>,
}

static REGISTRY: OnceLock<ProcessRegistry> = OnceLock::new();

impl ProcessRegistry {
    pub fn global() -> &'static ProcessRegistry {
        REGISTRY.get_or_init(|| ProcessRegistry {
            inner: Mutex::new(RegistryState {
                processes: BTreeMap::new(),
                spawn_order: Vec::new(),
            }),
        })
    }

    pub async fn register(&self, pid: u32, process: &Arc<Mutex<SessionProcess>>) {
        let mut state = self.inner.lock().await;
        state.processes.insert(pid, Arc::downgrade(process));
        state.spawn_order.push(pid);
    }

    pub async fn deregister(&self, pid: u32) {
        let mut state = self.inner.lock().await;
        state.processes.remove(&pid);
        state.spawn_order.retain(|existing| *existing != pid);
    }

    pub async fn live_count(&self) -> usize {
        let state = self.inner.lock().await;
        state
            .processes
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Tears down every still-live registered process, most-recently-spawned
    /// first. Processes already dropped (weak reference gone) are skipped.
    pub async fn teardown_all(&self, grace_period_ms: u64) {
        let order = {
            let state = self.inner.lock().await;
            state.spawn_order.clone()
        };
        for pid in order.into_iter().rev() {
            let handle = {
                let state = self.inner.lock().await;
                state.processes.get(&pid).and_then(Weak::upgrade)
            };
            if let Some(handle) = handle {
                let mut process = handle.lock().await;
                process.terminate(grace_period_ms).await;
            }
            self.deregister(pid).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use tokio::sync::Mutex;

    use super::ProcessRegistry;
    use crate::process::SessionProcess;

    #[tokio::test]
    async fn functional_register_and_deregister_tracks_live_count() {
        let registry = ProcessRegistry::global();
        let process = SessionProcess::spawn(
            "sh",
            &["-c".to_string(), "sleep 1".to_string()],
            &BTreeMap::new(),
            None,
        )
        .expect("should spawn");
        let pid = process.pid();
        let handle = Arc::new(Mutex::new(process));
        registry.register(pid, &handle).await;
        assert!(registry.live_count().await >= 1);
        registry.deregister(pid).await;

        let mut process = handle.lock().await;
        process.terminate(200).await;
    }
}
