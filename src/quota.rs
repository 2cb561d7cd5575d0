use std::sync::Mutex;
use std::time::Instant;

#[derive(Debug)]
struct BucketState {
    content: u64,
    last_content_update: Instant,
}

/// Token-bucket rate limiter tracking a provider's remaining call budget
///
/// Starts full and refills continuously at `rate` units per second. Only
/// whole units are ever credited; the refill timestamp moves forward only
/// when at least one unit is credited, so fractional elapsed time is not
/// lost across repeated polls. All mutation happens under one mutex.
#[derive(Debug)]
pub struct QuotaBucket {
    size: u64,
    rate: f64,
    state: Mutex<BucketState>,
}

impl QuotaBucket {
    pub fn new(size: u64, rate: f64) -> Self {
        Self {
            size,
            rate,
            state: Mutex::new(BucketState {
                content: size,
                last_content_update: Instant::now(),
            }),
        }
    }

    fn update(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_content_update).as_secs_f64();
        let to_add = (elapsed * self.rate).floor() as u64;
        if to_add > 0 {
            state.content = self.size.min(state.content + to_add);
            state.last_content_update = now;
        }
    }

    /// Try to take `amount` units out of the bucket
    ///
    /// Returns false without deducting anything when the remaining budget is
    /// insufficient. Exhaustion is advisory at this layer; the caller decides
    /// whether to proceed anyway.
    pub fn consume(&self, amount: u64) -> bool {
        let mut state = self.state.lock().expect("quota bucket mutex poisoned");
        self.update(&mut state);
        if state.content >= amount {
            state.content -= amount;
            true
        } else {
            false
        }
    }

    /// Current filled ratio, for observability
    pub fn fill_ratio(&self) -> f64 {
        let mut state = self.state.lock().expect("quota bucket mutex poisoned");
        self.update(&mut state);
        state.content as f64 / self.size as f64
    }

    pub fn content(&self) -> u64 {
        let mut state = self.state.lock().expect("quota bucket mutex poisoned");
        self.update(&mut state);
        state.content
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    #[cfg(test)]
    fn rewind(&self, duration: std::time::Duration) {
        let mut state = self.state.lock().unwrap();
        state.last_content_update -= duration;
    }
}
