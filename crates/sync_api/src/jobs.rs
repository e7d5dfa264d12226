//! Tracked background tasks. Post-payment processing runs out-of-band from
//! the webhook response; the counter lets tests and shutdown observe when
//! spawned work has finished instead of firing and forgetting.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Clone, Default)]
pub struct JobSet {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    active: AtomicUsize,
    idle: Notify,
}

impl JobSet {
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        inner.active.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            fut.await;
            if inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
                inner.idle.notify_waiters();
            }
        });
    }

    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Wait until every spawned job has completed.
    pub async fn wait_idle(&self) {
        loop {
            // Register interest before the check so a completion between the
            // check and the await still wakes us.
            let notified = self.inner.idle.notified();
            if self.active() == 0 {
                return;
            }
            notified.await;
        }
    }
}
