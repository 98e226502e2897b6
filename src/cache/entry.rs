//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// On-disk serialization of the "no expiry" instant.
///
/// Matches the zero value of the snapshot/AOF time encoding so that files are
/// readable across restarts regardless of which entries carry a TTL.
pub const NO_EXPIRY_SENTINEL: &str = "0001-01-01T00:00:00Z";

// == Expiry ==
/// Expiration state of a cache entry.
///
/// An explicit sum type rather than a magic timestamp, so that "never
/// expires" cannot be confused with any real instant. Serialization still
/// interoperates with the documented zero-time sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The entry never expires.
    Never,
    /// The entry expires at the given instant.
    At(DateTime<Utc>),
}

impl Expiry {
    /// Builds the expiry for a SET with the given TTL.
    ///
    /// `ttl_seconds == 0` means no expiry.
    pub fn from_ttl(now: DateTime<Utc>, ttl_seconds: u64) -> Self {
        if ttl_seconds > 0 {
            Expiry::At(now + Duration::seconds(ttl_seconds as i64))
        } else {
            Expiry::Never
        }
    }

    /// Returns true if the expiry instant has passed at `now`.
    ///
    /// Entries without expiry are never expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(instant) => now > *instant,
        }
    }
}

/// The instant encoded by [`NO_EXPIRY_SENTINEL`].
fn sentinel_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0)
        .single()
        .expect("sentinel instant is valid")
}

impl Serialize for Expiry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = match self {
            Expiry::Never => NO_EXPIRY_SENTINEL.to_string(),
            Expiry::At(instant) => instant.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        };
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Expiry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let instant = DateTime::parse_from_rfc3339(&text)
            .map_err(serde::de::Error::custom)?
            .with_timezone(&Utc);
        if instant == sentinel_instant() {
            Ok(Expiry::Never)
        } else {
            Ok(Expiry::At(instant))
        }
    }
}

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: String,
    /// When the entry expires
    pub expires_at: Expiry,
    /// Last access instant, used for LRU ordering only; never persisted
    pub last_access: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates a new cache entry.
    ///
    /// `ttl_seconds == 0` means the entry never expires.
    pub fn new(value: String, ttl_seconds: u64, now: DateTime<Utc>) -> Self {
        Self {
            value,
            expires_at: Expiry::from_ttl(now, ttl_seconds),
            last_access: now,
        }
    }

    /// Checks if the entry has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_expired(now)
    }
}
