use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Running,
    Paused,
    Cancelled,
}

/// One-second countdown bound to a single exam session. The tick task is a
/// spawned future steered through a watch channel; `on_expire` runs exactly
/// once when the counter reaches zero and never after [`Countdown::cancel`].
/// Dropping the handle cancels the task, so an abandoned session leaves no
/// orphaned callback behind.
pub struct Countdown {
    remaining: Arc<AtomicU64>,
    control: watch::Sender<Control>,
    task: JoinHandle<()>,
}

impl Countdown {
    pub fn start<F>(duration_seconds: u64, on_expire: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let remaining = Arc::new(AtomicU64::new(duration_seconds));
        let (control, mut watcher) = watch::channel(Control::Running);
        let counter = remaining.clone();

        let task = tokio::spawn(async move {
            let mut on_expire = Some(on_expire);
            loop {
                let state = *watcher.borrow_and_update();
                match state {
                    Control::Cancelled => return,
                    Control::Paused => {
                        if watcher.changed().await.is_err() {
                            return;
                        }
                    }
                    Control::Running => {
                        tokio::select! {
                            changed = watcher.changed() => {
                                if changed.is_err() {
                                    return;
                                }
                            }
                            _ = sleep(Duration::from_secs(1)) => {
                                let left = counter.load(Ordering::SeqCst).saturating_sub(1);
                                counter.store(left, Ordering::SeqCst);
                                if left == 0 {
                                    if *watcher.borrow() == Control::Cancelled {
                                        return;
                                    }
                                    if let Some(expire) = on_expire.take() {
                                        expire.await;
                                    }
                                    return;
                                }
                            }
                        }
                    }
                }
            }
        });

        Self { remaining, control, task }
    }

    /// Freezes the countdown; elapsed time stops advancing until
    /// [`Countdown::resume`].
    pub fn pause(&self) {
        if *self.control.borrow() == Control::Running {
            let _ = self.control.send(Control::Paused);
        }
    }

    pub fn resume(&self) {
        if *self.control.borrow() == Control::Paused {
            let _ = self.control.send(Control::Running);
        }
    }

    pub fn cancel(&self) {
        let _ = self.control.send(Control::Cancelled);
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
        self.task.abort();
    }
}
