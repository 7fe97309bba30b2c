use std::time::Duration;

use futures::future;
use tokio::time::Instant;

use finrag_service::RateLimiter;

#[tokio::test(start_paused = true)]
async fn call_over_the_ceiling_is_delayed_not_rejected() {
	let limiter = RateLimiter::new(3, Duration::from_secs(60));
	let started = Instant::now();

	for _ in 0..3 {
		limiter.acquire().await;
	}

	assert_eq!(started.elapsed(), Duration::ZERO);

	limiter.acquire().await;

	assert!(started.elapsed() >= Duration::from_secs(60));
	assert!(limiter.in_window().await <= 3);
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_all_eventually_proceed() {
	let limiter = RateLimiter::new(2, Duration::from_secs(10));
	let started = Instant::now();
	let admitted = future::join_all((0..5).map(|_| async {
		limiter.acquire().await;

		started.elapsed()
	}))
	.await;

	assert_eq!(admitted.len(), 5);
	assert_eq!(admitted.iter().filter(|elapsed| **elapsed < Duration::from_secs(10)).count(), 2);
	assert!(admitted.iter().all(|elapsed| *elapsed < Duration::from_secs(30)));
}
