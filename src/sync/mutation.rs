/// Optimistic Mutation Controller
///
/// Per-post vote state machines (Idle / Mutating) with snapshot rollback,
/// plus bookkeeping for outstanding comment submissions. Every function
/// here is synchronous; the session performs the network round-trip
/// between `begin_vote` and `commit_vote` / `rollback_vote`.
use crate::error::{FeedError, FeedResult};
use crate::feed::FeedStore;
use crate::models::{Comment, PostId, VoteDirection, VoteIntent, VoteReceipt, VoteState};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Everything needed to undo an optimistic vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteSnapshot {
    pub state: VoteState,
    pub upvotes: i64,
    pub downvotes: i64,
}

/// An accepted vote mutation awaiting its server response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotePlan {
    /// Unique per controller, including across `reset`
    pub seq: u64,
    pub post_id: PostId,
    pub direction: VoteDirection,
    /// Optimistic target state
    pub target: VoteState,
    pub snapshot: VoteSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VotePhase {
    #[default]
    Idle,
    Mutating(VotePlan),
}

#[derive(Debug, Clone, Copy, Default)]
struct VoteSlot {
    state: VoteState,
    phase: VotePhase,
}

/// Result of asking to start a vote
#[derive(Debug, Clone)]
pub enum VoteStart {
    /// Request must be issued; `store` already shows the optimistic effect
    Issue { plan: VotePlan, store: FeedStore },
    /// A vote on this post is already in flight
    Busy,
    /// Requested state equals the current one
    Unchanged,
}

#[derive(Debug, Default)]
pub struct MutationController {
    votes: HashMap<PostId, VoteSlot>,
    comments_pending: HashMap<PostId, usize>,
    next_seq: u64,
}

impl MutationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every post. Plans issued before the reset no longer match.
    pub fn reset(&mut self) {
        self.votes.clear();
        self.comments_pending.clear();
    }

    pub fn vote_state(&self, post_id: PostId) -> VoteState {
        self.votes
            .get(&post_id)
            .map(|slot| slot.state)
            .unwrap_or_default()
    }

    pub fn vote_phase(&self, post_id: PostId) -> VotePhase {
        self.votes
            .get(&post_id)
            .map(|slot| slot.phase)
            .unwrap_or_default()
    }

    pub fn is_voting(&self, post_id: PostId) -> bool {
        matches!(self.vote_phase(post_id), VotePhase::Mutating(_))
    }

    /// Snapshot, apply the optimistic state and mark the post in flight
    pub fn begin_vote(
        &mut self,
        store: &FeedStore,
        post_id: PostId,
        intent: VoteIntent,
    ) -> FeedResult<VoteStart> {
        let post = store
            .get(post_id)
            .ok_or_else(|| FeedError::NotFound(format!("Post {} is not in the feed", post_id)))?;

        let slot = self.votes.entry(post_id).or_default();
        if let VotePhase::Mutating(_) = slot.phase {
            debug!("Vote on post {} already in flight, rejected", post_id);
            return Ok(VoteStart::Busy);
        }

        let (direction, target) = match (intent, slot.state) {
            (VoteIntent::ToUpvoted, VoteState::Upvoted)
            | (VoteIntent::ToDownvoted, VoteState::Downvoted)
            | (VoteIntent::ToNone, VoteState::None) => return Ok(VoteStart::Unchanged),
            (VoteIntent::ToUpvoted, _) => (VoteDirection::Up, VoteState::Upvoted),
            (VoteIntent::ToDownvoted, _) => (VoteDirection::Down, VoteState::Downvoted),
            (VoteIntent::ToNone, VoteState::Upvoted) => (VoteDirection::Up, VoteState::None),
            (VoteIntent::ToNone, VoteState::Downvoted) => (VoteDirection::Down, VoteState::None),
        };

        self.next_seq += 1;
        let plan = VotePlan {
            seq: self.next_seq,
            post_id,
            direction,
            target,
            snapshot: VoteSnapshot {
                state: slot.state,
                upvotes: post.upvotes,
                downvotes: post.downvotes,
            },
        };

        // Only a vote being added moves a counter; removals wait for the server.
        let store = if target == VoteState::None {
            store.clone()
        } else {
            store
                .with_post_updated(post_id, |post| match direction {
                    VoteDirection::Up => post.upvotes += 1,
                    VoteDirection::Down => post.downvotes += 1,
                })
                .unwrap_or_else(|| store.clone())
        };

        slot.state = target;
        slot.phase = VotePhase::Mutating(plan);
        debug!("Vote on post {}: {:?} -> {:?}", post_id, plan.snapshot.state, target);

        Ok(VoteStart::Issue { plan, store })
    }

    /// Replace the optimistic counter with the server's value.
    ///
    /// Returns the new store, or `None` when the post has left the feed
    /// (or the mutation was already resolved) and there is nothing to write.
    pub fn commit_vote(
        &mut self,
        store: &FeedStore,
        plan: &VotePlan,
        receipt: &VoteReceipt,
    ) -> Option<FeedStore> {
        let slot = self.votes.get_mut(&plan.post_id)?;
        if slot.phase != VotePhase::Mutating(*plan) {
            return None;
        }

        let confirmed = receipt.resulting_state();
        if confirmed != plan.target {
            warn!(
                "Server reported vote {:?} on post {} but {:?} was expected; using server state",
                receipt.action, plan.post_id, plan.target
            );
        }
        slot.state = confirmed;
        slot.phase = VotePhase::Idle;

        store.with_post_updated(plan.post_id, |post| match receipt.direction {
            VoteDirection::Up => post.upvotes = receipt.count,
            VoteDirection::Down => post.downvotes = receipt.count,
        })
    }

    /// Restore the pre-mutation snapshot exactly
    pub fn rollback_vote(&mut self, store: &FeedStore, plan: &VotePlan) -> Option<FeedStore> {
        let slot = self.votes.get_mut(&plan.post_id)?;
        if slot.phase != VotePhase::Mutating(*plan) {
            return None;
        }

        slot.state = plan.snapshot.state;
        slot.phase = VotePhase::Idle;
        debug!("Vote on post {} rolled back to {:?}", plan.post_id, plan.snapshot.state);

        store.with_post_updated(plan.post_id, |post| {
            post.upvotes = plan.snapshot.upvotes;
            post.downvotes = plan.snapshot.downvotes;
        })
    }

    /// Forget all state for a post that left the feed
    pub fn forget(&mut self, post_id: PostId) {
        self.votes.remove(&post_id);
        self.comments_pending.remove(&post_id);
    }

    /// Validate a comment and count it as outstanding.
    ///
    /// Returns the trimmed text to send.
    pub fn begin_comment(
        &mut self,
        store: &FeedStore,
        post_id: PostId,
        text: &str,
    ) -> FeedResult<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FeedError::Validation("Comment cannot be empty".to_string()));
        }
        if !store.contains(post_id) {
            return Err(FeedError::NotFound(format!(
                "Post {} is not in the feed",
                post_id
            )));
        }

        *self.comments_pending.entry(post_id).or_insert(0) += 1;
        Ok(text.to_string())
    }

    pub fn finish_comment(&mut self, post_id: PostId) {
        if let Some(pending) = self.comments_pending.get_mut(&post_id) {
            *pending = pending.saturating_sub(1);
            if *pending == 0 {
                self.comments_pending.remove(&post_id);
            }
        }
    }

    pub fn is_commenting(&self, post_id: PostId) -> bool {
        self.comments_pending.contains_key(&post_id)
    }

    /// Append a server-confirmed comment to the post's single comment list
    pub fn append_comment(store: &FeedStore, post_id: PostId, comment: Comment) -> Option<FeedStore> {
        store.with_post_updated(post_id, |post| post.comments.push(comment))
    }
}
