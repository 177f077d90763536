use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Global send throttle shared by all workers: consecutive slots are
/// spaced at least `min_interval` apart, independent of pool size. The
/// lock is only held to reserve a slot, never across the wait itself.
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.min_interval);
            slot
        };

        tokio::time::sleep_until(slot).await;
    }
}
