/// Feed synchronization drivers
///
/// - `pagination`: single-flight forward paging (Idle / Fetching / Exhausted)
/// - `refresh`: pull-to-refresh gesture and its single-flight guard
/// - `mutation`: optimistic votes with rollback, comment bookkeeping

pub mod mutation;
pub mod pagination;
pub mod refresh;

pub use mutation::{MutationController, VotePhase, VotePlan, VoteSnapshot, VoteStart};
pub use pagination::{PaginationDriver, PaginationState};
pub use refresh::{RefreshDriver, RefreshState, ScrollTracker};
