//! Conflict resolution strategies.
//!
//! A resolver is only consulted for genuinely concurrent writes to the same
//! key. It must be a pure, deterministic function of its two inputs so that
//! every replica resolving the same conflict picks the same winner without
//! communicating.

use crate::error::{CvvError, Result};
use crate::item::Item;
use std::cmp::Ordering;

/// Strategy for picking the surviving item of a concurrent conflict.
pub trait ConflictResolver<V> {
    /// Elect a winner between two items for the same key.
    ///
    /// Implementations must fail with
    /// [`CvvError::ConflictInvariantViolation`] when both items claim the same
    /// `(owner, version)` but carry different values.
    fn resolve(&self, a: &Item<V>, b: &Item<V>) -> Result<Item<V>>;
}

impl<V, F> ConflictResolver<V> for F
where
    F: Fn(&Item<V>, &Item<V>) -> Result<Item<V>>,
{
    fn resolve(&self, a: &Item<V>, b: &Item<V>) -> Result<Item<V>> {
        self(a, b)
    }
}

/// Last-writer-wins.
///
/// The higher version wins. On a version tie the lexicographically smaller
/// owner wins. If owner and version both tie the values must be equal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LastWriterWins;

impl<V: Clone + PartialEq> ConflictResolver<V> for LastWriterWins {
    fn resolve(&self, a: &Item<V>, b: &Item<V>) -> Result<Item<V>> {
        let a_wins = match a.version.cmp(&b.version) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => match a.owner.cmp(&b.owner) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => {
                    if a.value != b.value {
                        return Err(CvvError::ConflictInvariantViolation {
                            key: a.key.clone(),
                            owner: a.owner.clone(),
                            version: a.version,
                        });
                    }
                    true
                }
            },
        };

        if a_wins {
            Ok(a.clone())
        } else {
            Ok(b.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(value: i32, owner: &str, version: f64) -> Item<i32> {
        Item::from_raw("key", value, owner, version).unwrap()
    }

    #[test]
    fn test_lww_higher_version_wins() {
        let a = item(0, "a", 1.0);
        let b = item(0, "b", 0.0);
        assert_eq!(LastWriterWins.resolve(&a, &b).unwrap(), a);
        assert_eq!(LastWriterWins.resolve(&b, &a).unwrap(), a);
    }

    #[test]
    fn test_lww_tie_break_smaller_owner() {
        let first = item(1, "first", 0.0);
        let second = item(2, "second", 0.0);
        assert_eq!(LastWriterWins.resolve(&first, &second).unwrap(), first);
        assert_eq!(LastWriterWins.resolve(&second, &first).unwrap(), first);
    }

    #[test]
    fn test_lww_same_write_returns_first() {
        let a = item(7, "id", 0.0);
        let b = item(7, "id", 0.0);
        assert_eq!(LastWriterWins.resolve(&a, &b).unwrap(), a);
    }

    #[test]
    fn test_lww_same_write_different_values_is_error() {
        let a = Item::from_raw("k", "v1".to_string(), "id", 5.0).unwrap();
        let b = Item::from_raw("k", "v2".to_string(), "id", 5.0).unwrap();

        match LastWriterWins.resolve(&a, &b) {
            Err(CvvError::ConflictInvariantViolation { key, owner, version }) => {
                assert_eq!(key, "k");
                assert_eq!(owner.as_str(), "id");
                assert_eq!(version.as_f64(), 5.0);
            }
            other => panic!("Expected ConflictInvariantViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_closure_resolver() {
        let keep_larger = |a: &Item<i32>, b: &Item<i32>| -> Result<Item<i32>> {
            Ok(if a.value >= b.value { a.clone() } else { b.clone() })
        };
        let a = item(3, "a", 9.0);
        let b = item(5, "b", 1.0);
        assert_eq!(keep_larger.resolve(&a, &b).unwrap().value, 5);
    }
}
