use futures::future::BoxFuture;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

type FireFn<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

struct Slot<T> {
    pending: Option<T>,
    /// Bumped on every schedule/flush/cancel; a timer only fires if its
    /// generation is still current when it wakes.
    generation: u64,
}

/// Single-slot debouncer
///
/// Holds at most one pending value. Each `schedule` replaces the value and
/// restarts the quiet period; only the latest value is ever delivered.
pub struct Debouncer<T> {
    quiet: Duration,
    slot: Arc<Mutex<Slot<T>>>,
    fire: FireFn<T>,
}

fn lock<T>(slot: &Mutex<Slot<T>>) -> MutexGuard<'_, Slot<T>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(quiet: Duration, fire: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            quiet,
            slot: Arc::new(Mutex::new(Slot {
                pending: None,
                generation: 0,
            })),
            fire: Arc::new(move |value: T| -> BoxFuture<'static, ()> { Box::pin(fire(value)) }),
        }
    }

    /// Replace the pending value and restart the timer
    pub fn schedule(&self, value: T) {
        let generation = {
            let mut slot = lock(&self.slot);
            slot.generation += 1;
            slot.pending = Some(value);
            slot.generation
        };

        let slot = Arc::clone(&self.slot);
        let fire = Arc::clone(&self.fire);
        let quiet = self.quiet;
        tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            let value = {
                let mut slot = lock(&slot);
                if slot.generation != generation {
                    return;
                }
                slot.pending.take()
            };
            if let Some(value) = value {
                fire(value).await;
            }
        });
    }

    /// Deliver the pending value immediately. Returns false if nothing was pending.
    pub async fn flush_now(&self) -> bool {
        let value = {
            let mut slot = lock(&self.slot);
            slot.generation += 1;
            slot.pending.take()
        };
        match value {
            Some(value) => {
                (self.fire)(value).await;
                true
            }
            None => false,
        }
    }

    /// Drop the pending value and disarm the timer
    pub fn cancel(&self) {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        slot.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.slot).pending.is_some()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        slot.pending = None;
    }
}
