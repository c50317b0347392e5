//! Cache freshness policy shared by the acquisition paths.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenFamily, TokenRecord},
};

/// Decides whether a cached record is still good enough to hand out silently.
///
/// A record is refused once it is expired, or when its remaining lifetime falls inside the
/// preemptive window minus a per-key jitter. The jitter is derived from the family and scope
/// so different scopes do not all fall back to the token endpoint in the same second.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachePolicy {
	/// Lifetime below which a cached token is treated as a miss.
	pub preemptive_window: Duration,
}
impl CachePolicy {
	const DEFAULT_PREEMPTIVE_WINDOW: Duration = Duration::seconds(60);

	/// Overrides the preemptive window; negative values clamp to zero.
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Returns true when `record` may be served without contacting the identity provider.
	pub fn is_fresh(&self, record: &TokenRecord, now: OffsetDateTime) -> bool {
		if record.is_expired_at(now) {
			return false;
		}

		let window = self.effective_window(&record.family, &record.scope);

		window.is_zero() || record.expires_at - now > window
	}

	fn effective_window(&self, family: &TokenFamily, scope: &ScopeSet) -> Duration {
		let jitter = self.jitter(family, scope);

		self.preemptive_window.checked_sub(jitter).unwrap_or(Duration::ZERO)
	}

	fn jitter(&self, family: &TokenFamily, scope: &ScopeSet) -> Duration {
		let window_secs = self.preemptive_window.whole_seconds();

		if window_secs <= 1 {
			return Duration::ZERO;
		}

		let modulus = u64::try_from(window_secs).unwrap_or(u64::MAX);
		let mut hasher = DefaultHasher::new();

		family.hash(&mut hasher);
		scope.hash(&mut hasher);

		let jitter_secs = hasher.finish() % modulus;

		Duration::seconds(i64::try_from(jitter_secs).unwrap_or(i64::MAX))
	}
}
impl Default for CachePolicy {
	fn default() -> Self {
		Self { preemptive_window: Self::DEFAULT_PREEMPTIVE_WINDOW }
	}
}
