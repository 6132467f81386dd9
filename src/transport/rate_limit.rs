use std::time::Duration;
use tokio::{
    sync::Mutex,
    time::{self, Instant},
};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Fixed-window limiter shared by every scope that talks to the same account.
#[derive(Debug)]
pub struct RateLimit {
    // The number of requests that can be made in one window.
    capacity: u64,
    period: Duration,
    window: Mutex<Window>,
}

#[derive(Debug)]
struct Window {
    used: u64,
    reset: Instant,
}

impl RateLimit {
    /// Allows `capacity` requests per `period`. A zero period is treated as 1ms.
    pub fn new(capacity: u64, period: Duration) -> Self {
        let period = period.max(MIN_PERIOD);
        Self {
            capacity: capacity.max(1),
            period,
            window: Mutex::new(Window {
                used: 0,
                reset: Instant::now() + period,
            }),
        }
    }

    pub fn per_second(capacity: u64) -> Self {
        Self::new(capacity, Duration::from_secs(1))
    }

    /// Takes a slot in the current window, or returns when the window resets.
    async fn try_acquire(&self) -> Result<(), Instant> {
        let mut window = self.window.lock().await;
        let now = Instant::now();

        if now >= window.reset {
            // Skip every window that elapsed while idle.
            while window.reset <= now {
                window.reset += self.period;
            }
            window.used = 0;
        }

        if window.used < self.capacity {
            window.used += 1;
            Ok(())
        } else {
            Err(window.reset)
        }
    }

    pub async fn ready(&self) {
        while let Err(reset) = self.try_acquire().await {
            time::sleep_until(reset).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn requests_within_capacity_do_not_wait() {
        let limit = RateLimit::per_second(3);
        let start = Instant::now();

        for _ in 0..3 {
            limit.ready().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn request_over_capacity_waits_for_next_window() {
        let limit = RateLimit::new(2, Duration::from_millis(500));
        let start = Instant::now();

        for _ in 0..5 {
            limit.ready().await;
        }

        // Two windows full, the fifth request lands in the third window.
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_still_advances() {
        let limit = RateLimit::new(1, Duration::ZERO);
        let start = Instant::now();

        for _ in 0..3 {
            limit.ready().await;
        }

        assert_eq!(start.elapsed(), Duration::from_millis(2));
    }
}
