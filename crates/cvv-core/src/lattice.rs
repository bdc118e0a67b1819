//! Join-semilattice abstraction.
//!
//! Knowledge is merged with a join (⊔) that is commutative, associative and
//! idempotent, so replicas that fold the same set of ledgers in any order,
//! any number of times, end up with the same result.

use std::cmp::Ordering;

pub trait Lattice: Clone + PartialEq {
    /// Identity for [`Lattice::join`].
    fn bottom() -> Self;

    /// Least upper bound.
    fn join(&self, other: &Self) -> Self;

    /// Fold `other` into `self`. Returns whether `self` grew.
    fn join_assign(&mut self, other: &Self) -> bool {
        let joined = self.join(other);
        let grew = joined != *self;
        *self = joined;
        grew
    }

    /// `self ⊑ other`: `other` already covers everything in `self`.
    fn leq(&self, other: &Self) -> bool {
        other.join(self) == *other
    }

    /// Order under ⊑. `None` when each side has something the other lacks.
    fn lattice_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.leq(other), other.leq(self)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }

    /// Join of every element, `bottom` for none.
    fn join_all<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
        Self: 'a,
    {
        items
            .into_iter()
            .fold(Self::bottom(), |acc, item| acc.join(item))
    }
}
