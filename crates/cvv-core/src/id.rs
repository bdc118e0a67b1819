//! Replica identifiers and versions.
//!
//! Both types validate on construction so the rest of the crate can treat
//! them as plain, totally-ordered values.

use crate::error::{CvvError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Identifier of a store instance.
///
/// Ordered lexicographically over its string form, which is what the
/// last-writer-wins tie-break relies on.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReplicaId(String);

impl ReplicaId {
    /// Create a replica id. Empty ids are rejected.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(CvvError::InvalidArgument(
                "replica id must not be empty".to_string(),
            ));
        }
        Ok(ReplicaId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ReplicaId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ReplicaId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ReplicaId {
    type Err = CvvError;

    fn from_str(s: &str) -> Result<Self> {
        ReplicaId::new(s)
    }
}

impl TryFrom<String> for ReplicaId {
    type Error = CvvError;

    fn try_from(value: String) -> Result<Self> {
        ReplicaId::new(value)
    }
}

impl TryFrom<&str> for ReplicaId {
    type Error = CvvError;

    fn try_from(value: &str) -> Result<Self> {
        ReplicaId::new(value)
    }
}

impl From<ReplicaId> for String {
    fn from(id: ReplicaId) -> Self {
        id.0
    }
}

/// A write version: wall-clock milliseconds, possibly bumped by a fraction.
///
/// Always finite and within `±Version::MAX`, so it is totally ordered and
/// every bump stays representable. Versions of different replicas are only
/// ever compared for equal/greater/less.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Version(f64);

impl Version {
    /// The version of a replica that has never written.
    pub const ZERO: Version = Version(0.0);

    /// Largest accepted magnitude: 2^53 milliseconds, past which whole
    /// milliseconds are no longer exact.
    pub const MAX: Version = Version(9_007_199_254_740_992.0);

    /// Create a version, rejecting NaN, infinities and magnitudes beyond
    /// [`Version::MAX`].
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(CvvError::InvalidArgument(format!(
                "version must be a finite number, got {}",
                value
            )));
        }
        if value.abs() > Self::MAX.0 {
            return Err(CvvError::InvalidArgument(format!(
                "version {} is out of range, magnitude must not exceed {}",
                value,
                Self::MAX.0
            )));
        }
        // Fold -0.0 into 0.0 so equality and ordering agree.
        Ok(Version(if value == 0.0 { 0.0 } else { value }))
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// The smallest version strictly greater than `self` reachable by adding
    /// `epsilon`. Falls back to the next representable float when `epsilon`
    /// is too small to change `self`.
    ///
    /// Saturates at [`Version::MAX`], the only input it does not raise.
    pub fn bumped(self, epsilon: f64) -> Version {
        let candidate = self.0 + epsilon.abs();
        let raised = if candidate > self.0 {
            candidate
        } else {
            next_up(self.0)
        };
        Version(raised.min(Self::MAX.0))
    }
}

fn next_up(x: f64) -> f64 {
    if x == 0.0 {
        return f64::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<f64> for Version {
    type Error = CvvError;

    fn try_from(value: f64) -> Result<Self> {
        Version::new(value)
    }
}

impl From<Version> for f64 {
    fn from(v: Version) -> Self {
        v.0
    }
}
