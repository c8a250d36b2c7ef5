/// Feed Session
///
/// The single owner of a feed: the store, both fetch drivers, the scroll
/// tracker and the mutation controller live behind one lock. Every
/// operation follows the same shape: decide under the lock, release it
/// for the network round-trip, then apply the result under the lock.
/// Nothing that suspends ever runs while the lock is held.
use crate::{
    config::FeedConfig,
    error::{FeedError, FeedResult},
    feed::{filter, CategoryFilter, FeedStore, MergeMode},
    gateway::FeedGateway,
    metrics,
    models::{Comment, FeedScope, Post, PostId, VoteDirection, VoteIntent, VoteState},
    sync::{MutationController, PaginationDriver, PaginationState, RefreshDriver, ScrollTracker, VoteStart},
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Result of a proximity signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// A page was fetched and these ids were new
    Loaded { added: Vec<PostId> },
    /// No further pages exist
    Exhausted,
    /// Signal dropped (fetch in flight, or response no longer wanted)
    Skipped,
}

/// Result of a refresh signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed { added: Vec<PostId> },
    Skipped,
}

/// Result of a vote request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Server confirmed; `count` is the authoritative counter for the voted direction
    Committed { state: VoteState, count: i64 },
    /// Another vote on the same post is in flight
    Busy,
    /// Post already in the requested state
    Unchanged,
    /// Server answered after the post left the feed or the session was
    /// reloaded; nothing was written
    Discarded,
}

struct SessionState {
    store: Arc<FeedStore>,
    pagination: PaginationDriver,
    refresh: RefreshDriver,
    scroll: ScrollTracker,
    mutations: MutationController,
    open_post: Option<PostId>,
    /// Bumped by `reload`; responses from an older epoch are discarded
    epoch: u64,
}

impl SessionState {
    fn new(config: &FeedConfig) -> Self {
        Self {
            store: Arc::new(FeedStore::new()),
            pagination: PaginationDriver::new(
                config.paging.page_size,
                config.scroll.pagination_margin,
            ),
            refresh: RefreshDriver::new(),
            scroll: ScrollTracker::new(config.scroll.refresh_top_threshold),
            mutations: MutationController::new(),
            open_post: None,
            epoch: 0,
        }
    }

    fn try_begin_refresh(&mut self) -> bool {
        let pagination_busy = self.pagination.is_fetching();
        if self.refresh.begin(pagination_busy) {
            true
        } else {
            metrics::record_signal_dropped("refresh");
            false
        }
    }

    fn replace_store(&mut self, store: FeedStore) {
        self.store = Arc::new(store);
    }
}

/// Feed session over a gateway
pub struct FeedSession<G: FeedGateway + ?Sized> {
    gateway: Arc<G>,
    scope: FeedScope,
    refresh_limit: u32,
    state: Arc<RwLock<SessionState>>,
}

impl<G: FeedGateway + ?Sized> Clone for FeedSession<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            scope: self.scope,
            refresh_limit: self.refresh_limit,
            state: Arc::clone(&self.state),
        }
    }
}

impl<G: FeedGateway + ?Sized> FeedSession<G> {
    /// Create an empty session; nothing is fetched until the first signal
    pub fn new(gateway: Arc<G>, config: &FeedConfig) -> Self {
        Self::with_scope(gateway, config, FeedScope::All)
    }

    /// Session listing only the posts in `scope`, e.g. one user's profile
    pub fn with_scope(gateway: Arc<G>, config: &FeedConfig, scope: FeedScope) -> Self {
        Self {
            gateway,
            scope,
            refresh_limit: config.paging.refresh_limit,
            state: Arc::new(RwLock::new(SessionState::new(config))),
        }
    }

    pub fn scope(&self) -> FeedScope {
        self.scope
    }

    // ========== Pagination ==========

    /// Proximity signal: fetch the next page unless one is already in flight
    pub async fn load_next_page(&self) -> FeedResult<PageOutcome> {
        let (cursor, epoch) = {
            let mut state = self.state.write().await;
            match state.pagination.begin() {
                Some(cursor) => (cursor, state.epoch),
                None if state.pagination.is_exhausted() => return Ok(PageOutcome::Exhausted),
                None => {
                    metrics::record_signal_dropped("pagination");
                    return Ok(PageOutcome::Skipped);
                }
            }
        };

        info!("Fetching page {} (limit {})", cursor.page(), cursor.limit());
        let started = Instant::now();
        let result = self.gateway.fetch_page(self.scope, cursor).await;
        let elapsed = started.elapsed().as_secs_f64();

        let mut state = self.state.write().await;
        match result {
            Ok(page) => {
                metrics::record_fetch("page", "ok", elapsed);
                if state.epoch != epoch || !state.pagination.complete(cursor, page.next_cursor) {
                    debug!("Discarding stale response for page {}", cursor.page());
                    return Ok(PageOutcome::Skipped);
                }

                let fetched = page.posts.len();
                let (store, added) = state.store.with_merged(page.posts, MergeMode::Append);
                metrics::record_merge(MergeMode::Append.as_str(), added.len(), store.len());
                debug!(
                    "Page {}: {} fetched, {} new, {} duplicates dropped",
                    cursor.page(),
                    fetched,
                    added.len(),
                    fetched - added.len()
                );
                state.replace_store(store);

                Ok(PageOutcome::Loaded { added })
            }
            Err(e) => {
                metrics::record_fetch("page", e.label(), elapsed);
                if state.epoch == epoch {
                    state.pagination.fail(cursor);
                }
                warn!("Failed to fetch page {}: {}", cursor.page(), e);
                Err(e)
            }
        }
    }

    /// Viewport signal: the end sentinel is `distance_to_end` away
    pub async fn on_viewport(&self, distance_to_end: f64) -> FeedResult<PageOutcome> {
        let near_end = self.state.read().await.pagination.within_margin(distance_to_end);
        if near_end {
            self.load_next_page().await
        } else {
            Ok(PageOutcome::Skipped)
        }
    }

    // ========== Refresh ==========

    /// Scroll observation; runs a refresh when it completes the pull gesture
    pub async fn on_scroll(&self, offset: f64) -> FeedResult<RefreshOutcome> {
        let epoch = {
            let mut state = self.state.write().await;
            if !state.scroll.observe(offset) || !state.try_begin_refresh() {
                return Ok(RefreshOutcome::Skipped);
            }
            state.epoch
        };

        self.run_refresh(epoch).await
    }

    /// Explicit refresh (retry affordance); same guards as the gesture
    pub async fn refresh(&self) -> FeedResult<RefreshOutcome> {
        let epoch = {
            let mut state = self.state.write().await;
            if !state.try_begin_refresh() {
                return Ok(RefreshOutcome::Skipped);
            }
            state.epoch
        };

        self.run_refresh(epoch).await
    }

    async fn run_refresh(&self, epoch: u64) -> FeedResult<RefreshOutcome> {
        info!("Refreshing newest {} posts", self.refresh_limit);
        let started = Instant::now();
        let result = self.gateway.fetch_latest(self.scope, self.refresh_limit).await;
        let elapsed = started.elapsed().as_secs_f64();

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            debug!("Discarding refresh response from before reload");
            return Ok(RefreshOutcome::Skipped);
        }
        state.refresh.finish();

        match result {
            Ok(page) => {
                metrics::record_fetch("latest", "ok", elapsed);
                let (store, added) = state.store.with_merged(page.posts, MergeMode::Prepend);
                metrics::record_merge(MergeMode::Prepend.as_str(), added.len(), store.len());
                info!(
                    "Refresh added {} posts (as of {:?})",
                    added.len(),
                    store.as_of()
                );
                state.replace_store(store);

                Ok(RefreshOutcome::Refreshed { added })
            }
            Err(e) => {
                metrics::record_fetch("latest", e.label(), elapsed);
                warn!("Refresh failed: {}", e);
                Err(e)
            }
        }
    }

    // ========== Votes ==========

    /// Move a post to the vote state named by `intent`.
    ///
    /// On failure the pre-vote state and counts are restored before the
    /// error is returned.
    pub async fn vote(&self, post_id: PostId, intent: VoteIntent) -> FeedResult<VoteOutcome> {
        let (plan, epoch) = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            match state.mutations.begin_vote(&state.store, post_id, intent)? {
                VoteStart::Issue { plan, store } => {
                    state.replace_store(store);
                    (plan, state.epoch)
                }
                VoteStart::Busy => {
                    metrics::record_signal_dropped("vote");
                    return Ok(VoteOutcome::Busy);
                }
                VoteStart::Unchanged => return Ok(VoteOutcome::Unchanged),
            }
        };

        let result = self.gateway.vote(post_id, plan.direction).await;

        let mut guard = self.state.write().await;
        let state = &mut *guard;
        if state.epoch != epoch {
            metrics::record_vote(plan.direction.as_str(), result.is_ok());
            debug!("Discarding vote response on post {} from before reload", post_id);
            return result.map(|_| VoteOutcome::Discarded);
        }

        match result {
            Ok(receipt) => {
                metrics::record_vote(plan.direction.as_str(), true);
                let store = match state.mutations.commit_vote(&state.store, &plan, &receipt) {
                    Some(store) => store,
                    None => {
                        debug!("Post {} left the feed before its vote resolved", post_id);
                        return Ok(VoteOutcome::Discarded);
                    }
                };
                state.replace_store(store);
                info!(
                    "Vote on post {} committed: {} count {}",
                    post_id,
                    plan.direction.as_str(),
                    receipt.count
                );

                Ok(VoteOutcome::Committed {
                    state: state.mutations.vote_state(post_id),
                    count: receipt.count,
                })
            }
            Err(e) => {
                metrics::record_vote(plan.direction.as_str(), false);
                if let Some(store) = state.mutations.rollback_vote(&state.store, &plan) {
                    state.replace_store(store);
                }
                warn!("Vote on post {} failed, rolled back: {}", post_id, e);
                Err(e)
            }
        }
    }

    /// Click on an up/down control: same direction again removes the vote
    pub async fn toggle_vote(
        &self,
        post_id: PostId,
        direction: VoteDirection,
    ) -> FeedResult<VoteOutcome> {
        let current = self.vote_state(post_id).await;
        self.vote(post_id, VoteIntent::toggle(current, direction))
            .await
    }

    // ========== Comments ==========

    /// Create a comment and append the server's copy to the post
    pub async fn submit_comment(&self, post_id: PostId, text: &str) -> FeedResult<Comment> {
        let (text, epoch) = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            let text = state.mutations.begin_comment(&state.store, post_id, text)?;
            (text, state.epoch)
        };

        let result = self.gateway.add_comment(post_id, &text).await;

        let mut guard = self.state.write().await;
        let state = &mut *guard;
        if state.epoch != epoch {
            metrics::record_comment(result.is_ok());
            debug!("Discarding comment response on post {} from before reload", post_id);
            return result;
        }
        state.mutations.finish_comment(post_id);
        match result {
            Ok(comment) => {
                metrics::record_comment(true);
                match MutationController::append_comment(&state.store, post_id, comment.clone()) {
                    Some(store) => {
                        state.replace_store(store);
                        info!("Comment appended to post {}", post_id);
                    }
                    None => debug!("Post {} left the feed before its comment resolved", post_id),
                }
                Ok(comment)
            }
            Err(e) => {
                metrics::record_comment(false);
                warn!("Comment on post {} failed: {}", post_id, e);
                Err(e)
            }
        }
    }

    // ========== Open post view ==========

    pub async fn open_post(&self, post_id: PostId) -> FeedResult<()> {
        let mut state = self.state.write().await;
        if !state.store.contains(post_id) {
            return Err(FeedError::NotFound(format!(
                "Post {} is not in the feed",
                post_id
            )));
        }
        state.open_post = Some(post_id);
        Ok(())
    }

    pub async fn close_post(&self) {
        self.state.write().await.open_post = None;
    }

    /// The open post as currently held by the store
    pub async fn open_post_view(&self) -> Option<Post> {
        let state = self.state.read().await;
        state
            .open_post
            .and_then(|id| state.store.get(id))
            .cloned()
    }

    // ========== Removal and reload ==========

    /// Delete a post on the server, then drop it from the feed
    pub async fn remove_post(&self, post_id: PostId) -> FeedResult<()> {
        if !self.state.read().await.store.contains(post_id) {
            return Err(FeedError::NotFound(format!(
                "Post {} is not in the feed",
                post_id
            )));
        }

        self.gateway.delete_post(post_id).await?;

        let mut state = self.state.write().await;
        if let Some(store) = state.store.without_post(post_id) {
            metrics::FEED_POSTS_LOADED.set(store.len() as i64);
            state.replace_store(store);
        }
        state.mutations.forget(post_id);
        if state.open_post == Some(post_id) {
            state.open_post = None;
        }
        info!("Removed post {}", post_id);
        Ok(())
    }

    /// Drop everything and start again from the first page.
    ///
    /// Responses to requests issued before the reload are discarded.
    pub async fn reload(&self) {
        let mut state = self.state.write().await;
        state.epoch += 1;
        state.store = Arc::new(FeedStore::new());
        state.pagination.reset();
        state.refresh.finish();
        state.mutations.reset();
        state.open_post = None;
        metrics::FEED_POSTS_LOADED.set(0);
        info!("Feed session reloaded (epoch {})", state.epoch);
    }

    // ========== Read accessors ==========

    /// Current store value; later writes never affect the returned snapshot
    pub async fn snapshot(&self) -> Arc<FeedStore> {
        Arc::clone(&self.state.read().await.store)
    }

    /// Posts matching `category`, in feed order
    pub async fn filtered(&self, category: &CategoryFilter) -> Vec<Post> {
        let store = self.snapshot().await;
        filter(store.posts(), category).into_iter().cloned().collect()
    }

    pub async fn categories(&self) -> Vec<String> {
        self.snapshot().await.categories()
    }

    pub async fn vote_state(&self, post_id: PostId) -> VoteState {
        self.state.read().await.mutations.vote_state(post_id)
    }

    pub async fn is_voting(&self, post_id: PostId) -> bool {
        self.state.read().await.mutations.is_voting(post_id)
    }

    pub async fn pagination_state(&self) -> PaginationState {
        self.state.read().await.pagination.state()
    }

    pub async fn is_refreshing(&self) -> bool {
        self.state.read().await.refresh.is_refreshing()
    }

    pub async fn is_commenting(&self, post_id: PostId) -> bool {
        self.state.read().await.mutations.is_commenting(post_id)
    }
}
