use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Two distinct user ids in canonical order (smaller id first).
///
/// `swapped` records whether the caller's first argument ended up in the
/// second slot, so callers can map "their" side back onto the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalPair {
    pub first: Uuid,
    pub second: Uuid,
    pub swapped: bool,
}

impl CanonicalPair {
    pub fn key(&self) -> PairKey {
        PairKey(self.first, self.second)
    }
}

/// Normalize an unordered pair of users. Every ledger entry point goes
/// through here so `(a, b)` and `(b, a)` address the same record.
pub fn canonical_pair(a: Uuid, b: Uuid) -> Result<CanonicalPair> {
    if a == b {
        return Err(AppError::InvalidArgument(
            "cannot swipe on yourself".to_string(),
        ));
    }

    Ok(if a < b {
        CanonicalPair {
            first: a,
            second: b,
            swapped: false,
        }
    } else {
        CanonicalPair {
            first: b,
            second: a,
            swapped: true,
        }
    })
}

/// Order-independent identity of a user pair, used as the compatibility cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey(Uuid, Uuid);

impl PairKey {
    /// Build a key for any two ids, including identical ones.
    pub fn of(a: Uuid, b: Uuid) -> Self {
        if a <= b {
            PairKey(a, b)
        } else {
            PairKey(b, a)
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_pair_is_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let ab = canonical_pair(a, b).unwrap();
        let ba = canonical_pair(b, a).unwrap();

        assert_eq!(ab.first, ba.first);
        assert_eq!(ab.second, ba.second);
        assert!(ab.first < ab.second);
        assert_ne!(ab.swapped, ba.swapped);
        assert_eq!(ab.key(), ba.key());
    }

    #[test]
    fn test_canonical_pair_rejects_self() {
        let a = Uuid::new_v4();
        assert!(matches!(
            canonical_pair(a, a),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_uuid_order_matches_string_order() {
        let a = Uuid::parse_str("0a000000-0000-0000-0000-000000000000").unwrap();
        let b = Uuid::parse_str("f0000000-0000-0000-0000-000000000000").unwrap();

        let pair = canonical_pair(b, a).unwrap();
        assert_eq!(pair.first, a);
        assert!(pair.swapped);
        assert!(a.to_string() < b.to_string());
    }

    #[test]
    fn test_pair_key_display() {
        let a = Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
        let b = Uuid::parse_str("00000000-0000-0000-0000-000000000002").unwrap();

        assert_eq!(
            PairKey::of(b, a).to_string(),
            "00000000-0000-0000-0000-000000000001_00000000-0000-0000-0000-000000000002"
        );
    }
}
