//! Strongly typed identifier wrappers.
//!
//! Every id in the simulation is a thin `String` wrapper rather than an
//! integer index: the population is small (tens of characters, a handful of
//! maps), so there is no SoA-index pressure, and string ids round-trip
//! cleanly through the map/character JSON bundles and the durable store's
//! primary keys without a lookup table.

use std::fmt;

/// Generate a typed id wrapper around an owned `String`.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

typed_id! {
    /// Id of a character (the sole kind of playable/simulated agent).
    pub struct CharacterId;
}

typed_id! {
    /// Id of a non-player character (conversation partner, not independently
    /// simulated by `ts-mobility`/`ts-actions`).
    pub struct NpcId;
}

typed_id! {
    /// Id of a map (one grid-of-rooms level).
    pub struct MapId;
}

typed_id! {
    /// Id of a navigation-graph node within a single map. Unique only within
    /// its owning map — cross-map references always pair a `MapId` with a
    /// `NodeId`.
    pub struct NodeId;
}

typed_id! {
    /// Id of a facility (owned or public tagged region).
    pub struct FacilityId;
}

typed_id! {
    /// Id of an action definition (`eat`, `sleep`, `toilet`, ...).
    pub struct ActionId;
}

typed_id! {
    /// Id of a job definition.
    pub struct JobId;
}

typed_id! {
    /// Id of a conversation session.
    pub struct SessionId;
}

typed_id! {
    /// Id of a mid-term memory entry.
    pub struct MemoryId;
}
