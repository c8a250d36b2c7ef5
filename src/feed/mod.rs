/// Feed state: the store, the merge engine and the category projection

pub mod filter;
pub mod merge;
pub mod store;

pub use filter::{filter, CategoryFilter, ALL_CATEGORIES};
pub use merge::{merge, MergeMode, MergeOutcome};
pub use store::FeedStore;
