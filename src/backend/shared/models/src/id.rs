use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

/// Source of fresh identifiers for transient entities.
pub trait IdGenerator<ID>: Send + Sync {
    /// `None` once the generator has run out of ids.
    fn next_id(&self) -> Option<ID>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator<Uuid> for UuidGenerator {
    fn next_id(&self) -> Option<Uuid> {
        Some(Uuid::new_v4())
    }
}

/// Monotonic integer ids, starting at 1. Ends after handing out `i64::MAX`.
#[derive(Debug)]
pub struct SequenceGenerator {
    next: Mutex<Option<i64>>,
}

impl SequenceGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: i64) -> Self {
        Self {
            next: Mutex::new(Some(first)),
        }
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator<i64> for SequenceGenerator {
    fn next_id(&self) -> Option<i64> {
        let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
        let id = (*next)?;
        *next = id.checked_add(1);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_starts_at_one_and_increments() {
        let ids = SequenceGenerator::new();
        assert_eq!(ids.next_id(), Some(1));
        assert_eq!(ids.next_id(), Some(2));
        assert_eq!(ids.next_id(), Some(3));
    }

    #[test]
    fn sequence_honours_custom_start() {
        let ids = SequenceGenerator::starting_at(100);
        assert_eq!(ids.next_id(), Some(100));
    }

    #[test]
    fn sequence_stops_instead_of_wrapping() {
        let ids = SequenceGenerator::starting_at(i64::MAX - 1);
        assert_eq!(ids.next_id(), Some(i64::MAX - 1));
        assert_eq!(ids.next_id(), Some(i64::MAX));
        assert_eq!(ids.next_id(), None);
        assert_eq!(ids.next_id(), None);
    }

    #[test]
    fn uuids_are_unique() {
        let ids = UuidGenerator;
        assert_ne!(ids.next_id(), ids.next_id());
    }
}
