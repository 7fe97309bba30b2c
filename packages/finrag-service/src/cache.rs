use std::{collections::HashMap, hash::Hash, sync::Mutex, time::Duration};

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
	pub value: V,
	pub inserted_at: Instant,
}
impl<V> CacheEntry<V> {
	pub fn is_stale(&self, now: Instant, ttl: Duration) -> bool {
		now.saturating_duration_since(self.inserted_at) >= ttl
	}
}

/// In-process map whose entries expire `ttl` after insertion. Staleness is checked on lookup.
#[derive(Debug)]
pub struct TtlCache<K, V> {
	ttl: Duration,
	entries: Mutex<HashMap<K, CacheEntry<V>>>,
}
impl<K, V> TtlCache<K, V>
where
	K: Eq + Hash,
	V: Clone,
{
	pub fn new(ttl: Duration) -> Self {
		Self { ttl, entries: Mutex::new(HashMap::new()) }
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	pub fn get(&self, key: &K) -> Option<V> {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let now = Instant::now();

		match entries.get(key) {
			Some(entry) if !entry.is_stale(now, self.ttl) => Some(entry.value.clone()),
			Some(_) => {
				entries.remove(key);

				None
			},
			None => None,
		}
	}

	pub fn insert(&self, key: K, value: V) {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let now = Instant::now();

		entries.retain(|_, entry| !entry.is_stale(now, self.ttl));
		entries.insert(key, CacheEntry { value, inserted_at: now });
	}

	pub fn len(&self) -> usize {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
