use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace};

/// Task scope owned by one view-model.
///
/// Every state-mutating operation is launched here. Task bodies run one at
/// a time, so a read-modify-write inside one task never interleaves with
/// another. Cancelling the scope stops tasks that have not finished; tasks
/// launched afterwards end immediately.
pub struct ViewModelScope {
    tracker: TaskTracker,
    token: CancellationToken,
    gate: Arc<Mutex<()>>,
}

impl ViewModelScope {
    pub fn new() -> Self {
        Self {
            tracker: TaskTracker::new(),
            token: CancellationToken::new(),
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Launch a task on the scope. Must be called from within a Tokio runtime.
    pub fn launch<F>(&self, name: &'static str, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.token.clone();
        let gate = Arc::clone(&self.gate);
        self.tracker.spawn(async move {
            // The gate is held across the whole body, including its awaits
            let serialized = async {
                let _guard = gate.lock().await;
                task.await;
            };
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Task '{}' cancelled with its scope", name);
                }
                _ = serialized => {
                    trace!("Task '{}' finished", name);
                }
            }
        })
    }

    pub fn cancel(&self) {
        self.token.cancel();
        self.tracker.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Tasks launched and not yet finished
    pub fn active_tasks(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for launched tasks after the scope was cancelled
    pub async fn join(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl Default for ViewModelScope {
    fn default() -> Self {
        Self::new()
    }
}
