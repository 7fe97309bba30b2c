use std::{collections::VecDeque, time::Duration};

use tokio::{
	sync::Mutex,
	time::{self, Instant},
};

/// Sliding-window limiter for completion calls.
///
/// Callers are delayed, never rejected: `acquire` returns only once admitting the caller keeps
/// the number of admissions inside any trailing `period` at or below `max_calls`.
#[derive(Debug)]
pub struct RateLimiter {
	max_calls: usize,
	period: Duration,
	window: Mutex<VecDeque<Instant>>,
}
impl RateLimiter {
	pub fn new(max_calls: u32, period: Duration) -> Self {
		let max_calls = (max_calls as usize).max(1);

		Self { max_calls, period, window: Mutex::new(VecDeque::with_capacity(max_calls)) }
	}

	pub fn from_config(cfg: &finrag_config::RateLimit) -> Self {
		Self::new(cfg.max_calls, Duration::from_millis(cfg.period_ms))
	}

	pub fn max_calls(&self) -> usize {
		self.max_calls
	}

	pub fn period(&self) -> Duration {
		self.period
	}

	pub async fn acquire(&self) {
		// The lock is held across the sleep so waiters are admitted in arrival order.
		let mut window = self.window.lock().await;

		loop {
			let now = Instant::now();

			while window.front().is_some_and(|oldest| now.duration_since(*oldest) >= self.period) {
				window.pop_front();
			}

			if window.len() < self.max_calls {
				window.push_back(now);

				return;
			}

			let Some(oldest) = window.front().copied() else {
				continue;
			};
			let wait = self.period.saturating_sub(now.duration_since(oldest));

			tracing::debug!(
				wait_ms = wait.as_millis() as u64,
				max_calls = self.max_calls,
				"Rate limit reached; delaying completion call."
			);

			time::sleep(wait).await;
		}
	}

	/// Admissions still inside the trailing window.
	pub async fn in_window(&self) -> usize {
		let window = self.window.lock().await;
		let now = Instant::now();

		window.iter().filter(|at| now.duration_since(**at) < self.period).count()
	}
}
