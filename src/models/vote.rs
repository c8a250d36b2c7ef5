/// Vote state and vote endpoint results
use serde::{Deserialize, Serialize};

/// The session's last known intent for one post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteState {
    #[default]
    None,
    Upvoted,
    Downvoted,
}

/// Which vote endpoint a mutation goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }

    /// State reached when a vote in this direction is added
    pub fn voted_state(&self) -> VoteState {
        match self {
            VoteDirection::Up => VoteState::Upvoted,
            VoteDirection::Down => VoteState::Downvoted,
        }
    }
}

/// Requested target state for a vote mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteIntent {
    ToUpvoted,
    ToDownvoted,
    ToNone,
}

impl VoteIntent {
    /// Intent produced by clicking a vote button given the current state.
    ///
    /// Clicking the direction already voted removes the vote.
    pub fn toggle(current: VoteState, direction: VoteDirection) -> Self {
        match (current, direction) {
            (VoteState::Upvoted, VoteDirection::Up) => VoteIntent::ToNone,
            (VoteState::Downvoted, VoteDirection::Down) => VoteIntent::ToNone,
            (_, VoteDirection::Up) => VoteIntent::ToUpvoted,
            (_, VoteDirection::Down) => VoteIntent::ToDownvoted,
        }
    }
}

/// Server's report of what the toggle endpoint did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Added,
    Removed,
}

/// Authoritative result of a vote request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteReceipt {
    pub direction: VoteDirection,
    /// New value of the counter for `direction`
    pub count: i64,
    pub action: VoteAction,
}

impl VoteReceipt {
    pub fn resulting_state(&self) -> VoteState {
        match self.action {
            VoteAction::Added => self.direction.voted_state(),
            VoteAction::Removed => VoteState::None,
        }
    }
}
