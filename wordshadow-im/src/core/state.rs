//! Session state enums
//!
//! Space handling and commit bookkeeping shared by the composer and the
//! composition session.

use serde::Serialize;

/// Pending-space state between words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceState {
    /// Nothing owed
    #[default]
    None,
    /// A space is owed before the next word, materialized only if that word
    /// does not start with a separator
    Phantom,
}

impl SpaceState {
    pub fn is_phantom(&self) -> bool {
        matches!(self, Self::Phantom)
    }
}

/// How a word reached the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitType {
    /// Picked explicitly from the suggestions
    ManualPick,
    /// Committed exactly as typed, e.g. when the field loses focus
    UserTypedWord,
}
