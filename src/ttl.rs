//! Time-to-live value type.

use std::fmt;

// == TTL ==
/// How long an entry stays valid after it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ttl {
    /// Never expires; only capacity eviction or explicit removal drops it.
    #[default]
    Forever,
    /// Expires this many seconds after the write.
    Seconds(u64),
}

impl Ttl {
    /// Absolute expiry in Unix milliseconds for a write at `now_ms`.
    pub fn expires_at_ms(self, now_ms: u64) -> Option<u64> {
        match self {
            Ttl::Forever => None,
            Ttl::Seconds(secs) => Some(now_ms.saturating_add(secs.saturating_mul(1000))),
        }
    }

    pub fn is_forever(self) -> bool {
        matches!(self, Ttl::Forever)
    }
}

/// Negative seconds mean "never expires".
impl From<i64> for Ttl {
    fn from(seconds: i64) -> Self {
        if seconds < 0 {
            Ttl::Forever
        } else {
            Ttl::Seconds(seconds as u64)
        }
    }
}

impl From<i32> for Ttl {
    fn from(seconds: i32) -> Self {
        Ttl::from(i64::from(seconds))
    }
}

impl From<u64> for Ttl {
    fn from(seconds: u64) -> Self {
        Ttl::Seconds(seconds)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttl::Forever => write!(f, "forever"),
            Ttl::Seconds(secs) => write!(f, "{}s", secs),
        }
    }
}
