use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::error::{Result, ViewfinderError};

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Job),
    Shutdown,
}

/// Dedicated thread that runs capture callbacks one at a time.
///
/// Image decoding and rotation happen here so they never block the tasks that
/// publish state to observers.
pub struct CaptureWorker {
    name: String,
    handle: WorkerHandle,
    thread: Mutex<Option<JoinHandle<()>>>,
}

/// Cloneable submission side of a [`CaptureWorker`]
#[derive(Clone)]
pub struct WorkerHandle {
    sender: Sender<Message>,
    accepting: Arc<AtomicBool>,
    completed: Arc<AtomicU64>,
}

impl CaptureWorker {
    /// Spawn the worker thread
    pub fn spawn(name: &str) -> Result<Self> {
        let (sender, receiver) = channel::unbounded();
        let completed = Arc::new(AtomicU64::new(0));

        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn({
                let completed = Arc::clone(&completed);
                let name = name.to_string();
                move || run_worker(name, receiver, completed)
            })
            .map_err(|e| {
                ViewfinderError::component("capture_worker".to_string(), e.to_string())
            })?;

        info!("Capture worker '{}' started", name);

        Ok(Self {
            name: name.to_string(),
            handle: WorkerHandle {
                sender,
                accepting: Arc::new(AtomicBool::new(true)),
                completed,
            },
            thread: Mutex::new(Some(thread)),
        })
    }

    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_accepting()
    }

    /// Stop the worker and wait for the thread to exit.
    ///
    /// Jobs still queued behind the shutdown marker are dropped. Returns
    /// `false` when the worker had already been shut down.
    pub fn shutdown(&self) -> bool {
        let Some(thread) = self.thread.lock().take() else {
            debug!("Capture worker '{}' already shut down", self.name);
            return false;
        };

        self.handle.accepting.store(false, Ordering::SeqCst);
        let _ = self.handle.sender.send(Message::Shutdown);

        if thread.thread().id() == thread::current().id() {
            warn!("Capture worker '{}' shut down from its own thread", self.name);
            return true;
        }

        if thread.join().is_err() {
            error!("Capture worker '{}' panicked", self.name);
        }

        info!("Capture worker '{}' stopped", self.name);
        true
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl WorkerHandle {
    /// Queue a job. Returns `false` if the worker no longer accepts work.
    pub fn execute<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.is_accepting() {
            debug!("Capture worker is shut down; dropping job");
            return false;
        }

        self.sender.send(Message::Run(Box::new(job))).is_ok()
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Number of jobs run to completion
    pub fn completed_jobs(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}

fn run_worker(name: String, receiver: Receiver<Message>, completed: Arc<AtomicU64>) {
    while let Ok(message) = receiver.recv() {
        match message {
            Message::Run(job) => {
                job();
                completed.fetch_add(1, Ordering::Relaxed);
            }
            Message::Shutdown => break,
        }
    }

    let dropped = receiver.try_iter().count();
    if dropped > 0 {
        warn!("Capture worker '{}' dropped {} pending jobs", name, dropped);
    }
    debug!("Capture worker '{}' loop exited", name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_jobs_run_in_submission_order() {
        let worker = CaptureWorker::spawn("test-worker").unwrap();
        let handle = worker.handle();
        let (tx, rx) = mpsc::channel();

        for i in 0..5 {
            let tx = tx.clone();
            assert!(handle.execute(move || tx.send(i).unwrap()));
        }

        let received: Vec<i32> = (0..5)
            .map(|_| rx.recv_timeout(Duration::from_secs(1)).unwrap())
            .collect();
        assert_eq!(received, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_jobs_run_off_the_calling_thread() {
        let worker = CaptureWorker::spawn("capture-worker").unwrap();
        let (tx, rx) = mpsc::channel();

        worker.handle().execute(move || {
            tx.send(thread::current().name().map(str::to_string)).unwrap();
        });

        let name = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(name.as_deref(), Some("capture-worker"));
    }

    #[test]
    fn test_shutdown_refuses_new_work() {
        let worker = CaptureWorker::spawn("test-worker").unwrap();
        let handle = worker.handle();

        assert!(worker.shutdown());
        assert!(!worker.is_running());
        assert!(!handle.execute(|| {}));
    }

    #[test]
    fn test_shutdown_happens_once() {
        let worker = CaptureWorker::spawn("test-worker").unwrap();

        assert!(worker.shutdown());
        assert!(!worker.shutdown());
    }

    #[test]
    fn test_completed_jobs_counter() {
        let worker = CaptureWorker::spawn("test-worker").unwrap();
        let handle = worker.handle();
        handle.execute(|| {});
        handle.execute(|| {});

        worker.shutdown();
        assert_eq!(handle.completed_jobs(), 2);
    }
}
