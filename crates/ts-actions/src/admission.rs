//! `canExecuteAction`'s structured failure reason (spec.md §4.4): the five
//! admission checks return a typed reason rather than throwing, so callers
//! (behavior decisions, UI) can explain a rejected action without parsing a
//! string.

use std::fmt;

use ts_core::{ActionId, FacilityId};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AdmissionFailure {
    /// Check 2: the character already has a `currentAction` and
    /// `ignoreCurrentAction` was not set.
    AlreadyHasAction,
    /// The requested action id isn't in the action table.
    UnknownAction(ActionId),
    /// Check 3: no facility on the character's map carries a required tag
    /// and is currently accessible (owner/cost gating).
    NoAccessibleFacility { required_tags: Vec<String> },
    /// Check 4: the character's facility has no job, or the job doesn't
    /// match the character's employment.
    NotEmployedHere { facility_id: Option<FacilityId> },
    /// Check 4: the current hour falls outside the job's `workHours`.
    OutsideWorkHours { start: u8, end: u8 },
    /// Check 5: no NPC at a cardinal neighbor of the character's node.
    NoNpcNearby,
}

impl fmt::Display for AdmissionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionFailure::AlreadyHasAction => write!(f, "character already has a current action"),
            AdmissionFailure::UnknownAction(id) => write!(f, "unknown action {id}"),
            AdmissionFailure::NoAccessibleFacility { required_tags } => {
                write!(f, "no accessible facility on this map carries any of {required_tags:?}")
            }
            AdmissionFailure::NotEmployedHere { facility_id } => {
                write!(f, "character is not employed at facility {facility_id:?}")
            }
            AdmissionFailure::OutsideWorkHours { start, end } => {
                write!(f, "outside work hours {start}:00-{end}:00")
            }
            AdmissionFailure::NoNpcNearby => write!(f, "no NPC at a cardinal neighbor"),
        }
    }
}
