pub mod id;

pub use id::{IdGenerator, SequenceGenerator, UuidGenerator};

use chrono::{DateTime, Utc};

// Common shared types and traits

/// An entity that can be addressed by an identifier.
///
/// Entities start out transient (`id()` returns `None`) and receive an id
/// when a store persists them.
pub trait Identifiable {
    type Id;

    fn id(&self) -> Option<&Self::Id>;

    fn set_id(&mut self, id: Self::Id);

    /// Called by stores right before the entity is written, as if it were
    /// new. Server-maintained fields supplied by the client are overwritten.
    fn touch(&mut self, _now: DateTime<Utc>) {}

    /// Called after `touch` when the entity replaces `previous`, to carry
    /// over fields that must survive a replace (such as the creation time).
    fn inherit_from(&mut self, _previous: &Self) {}
}

pub trait Timestamped {
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn updated_at(&self) -> Option<DateTime<Utc>>;
}
