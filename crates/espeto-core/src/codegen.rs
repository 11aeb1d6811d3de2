//! Order code generation.

use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Generates order codes in the external `ESP` + nine digits format.
///
/// The first six digits derive from the creation time in milliseconds, the
/// trailing three from a wrapping counter seeded randomly at startup. Two
/// codes issued in the same millisecond therefore cannot collide in-process;
/// collisions across restarts remain possible within the nine-digit space
/// and are accepted as best-effort.
pub struct OrderCodeGenerator {
	counter: AtomicU64,
}

impl OrderCodeGenerator {
	/// Creates a generator with a randomly seeded counter.
	pub fn new() -> Self {
		let seed = rand::thread_rng().gen_range(0..1000u64);
		Self {
			counter: AtomicU64::new(seed),
		}
	}

	/// Returns the next order code.
	pub fn next_code(&self) -> String {
		let millis = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_millis() as u64)
			.unwrap_or(0);
		let suffix = self.counter.fetch_add(1, Ordering::Relaxed) % 1000;
		format!("ESP{:06}{:03}", millis % 1_000_000, suffix)
	}
}

impl Default for OrderCodeGenerator {
	fn default() -> Self {
		Self::new()
	}
}
