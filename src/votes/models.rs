//! Vote toggle outcome models

use serde::{Deserialize, Serialize};

/// What a toggle did to the (voter, target) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteTransition {
    /// No vote existed; a new record was inserted.
    Created,
    /// The same direction was voted again; the record was deleted.
    Removed,
    /// The opposite direction was voted; the record's direction changed.
    Flipped,
}

/// The state transition reported by a vote toggle.
///
/// `previous`/`current` are the vote direction before and after; `None`
/// means no vote record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub transition: VoteTransition,
    pub previous: Option<bool>,
    pub current: Option<bool>,
}

impl VoteOutcome {
    pub(crate) fn created(is_up: bool) -> Self {
        Self {
            transition: VoteTransition::Created,
            previous: None,
            current: Some(is_up),
        }
    }

    pub(crate) fn removed(was_up: bool) -> Self {
        Self {
            transition: VoteTransition::Removed,
            previous: Some(was_up),
            current: None,
        }
    }

    pub(crate) fn flipped(now_up: bool) -> Self {
        Self {
            transition: VoteTransition::Flipped,
            previous: Some(!now_up),
            current: Some(now_up),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_report_the_transition() {
        let created = VoteOutcome::created(true);
        assert_eq!(created.transition, VoteTransition::Created);
        assert_eq!(created.previous, None);
        assert_eq!(created.current, Some(true));

        let removed = VoteOutcome::removed(false);
        assert_eq!(removed.transition, VoteTransition::Removed);
        assert_eq!(removed.previous, Some(false));
        assert_eq!(removed.current, None);

        let flipped = VoteOutcome::flipped(false);
        assert_eq!(flipped.transition, VoteTransition::Flipped);
        assert_eq!(flipped.previous, Some(true));
        assert_eq!(flipped.current, Some(false));
    }

    #[test]
    fn transition_serializes_snake_case() {
        let serialized = serde_json::to_string(&VoteTransition::Flipped).unwrap();
        assert_eq!(serialized, "\"flipped\"");
    }
}
