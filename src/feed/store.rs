/// Feed Store - the single authoritative ordered collection of posts
use crate::feed::merge::{merge, MergeMode};
use crate::models::{Post, PostId};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable feed value.
///
/// Every write returns a new store; posts are shared between versions and
/// copied only when one of them is modified.
#[derive(Debug, Clone, Default)]
pub struct FeedStore {
    posts: Vec<Arc<Post>>,
    index: HashMap<PostId, usize>,
    as_of: Option<PostId>,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_posts(posts: Vec<Post>) -> Self {
        Self::new().with_merged(posts, MergeMode::Append).0
    }

    fn from_parts(posts: Vec<Arc<Post>>, as_of: Option<PostId>) -> Self {
        let index = posts
            .iter()
            .enumerate()
            .map(|(pos, post)| (post.id, pos))
            .collect();
        Self {
            posts,
            index,
            as_of,
        }
    }

    pub fn posts(&self) -> impl Iterator<Item = &Post> + '_ {
        self.posts.iter().map(|p| p.as_ref())
    }

    pub fn ids(&self) -> Vec<PostId> {
        self.posts.iter().map(|p| p.id).collect()
    }

    pub fn get(&self, id: PostId) -> Option<&Post> {
        self.index.get(&id).map(|&pos| self.posts[pos].as_ref())
    }

    pub fn contains(&self, id: PostId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Newest post id known to the client
    pub fn as_of(&self) -> Option<PostId> {
        self.as_of
    }

    /// Merge a fetched batch; returns the new store and the ids it added
    pub fn with_merged(&self, incoming: Vec<Post>, mode: MergeMode) -> (FeedStore, Vec<PostId>) {
        let incoming = incoming.into_iter().map(Arc::new).collect();
        let outcome = merge(&self.posts, incoming, mode);

        let as_of = outcome.added.iter().copied().chain(self.as_of).max();

        (Self::from_parts(outcome.items, as_of), outcome.added)
    }

    /// Apply `update` to one post. `None` if the post is no longer present.
    pub fn with_post_updated<F>(&self, id: PostId, update: F) -> Option<FeedStore>
    where
        F: FnOnce(&mut Post),
    {
        let pos = *self.index.get(&id)?;
        let mut next = self.clone();
        update(Arc::make_mut(&mut next.posts[pos]));
        Some(next)
    }

    /// Drop one post. `None` if it was not present.
    pub fn without_post(&self, id: PostId) -> Option<FeedStore> {
        if !self.contains(id) {
            return None;
        }
        let posts = self.posts.iter().filter(|p| p.id != id).cloned().collect();
        Some(Self::from_parts(posts, self.as_of))
    }

    /// Distinct category tags in first-seen order
    pub fn categories(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for category in self.posts.iter().flat_map(|p| p.categories.iter()) {
            if !seen.contains(category) {
                seen.push(category.clone());
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(ids: &[i64]) -> FeedStore {
        FeedStore::from_posts(ids.iter().map(|&id| Post::new(id, "")).collect())
    }

    fn id_list(store: &FeedStore) -> Vec<i64> {
        store.ids().into_iter().map(|id| id.0).collect()
    }

    #[test]
    fn test_page_then_refresh_scenario() {
        let feed = store(&[10, 9, 8]);
        assert_eq!(feed.as_of(), Some(PostId(10)));

        let (feed, added) = feed.with_merged(
            vec![Post::new(7, ""), Post::new(6, "")],
            MergeMode::Append,
        );
        assert_eq!(id_list(&feed), vec![10, 9, 8, 7, 6]);
        assert_eq!(added.len(), 2);
        assert_eq!(feed.as_of(), Some(PostId(10)));

        let batch = [12, 11, 10, 9].iter().map(|&id| Post::new(id, "")).collect();
        let (feed, added) = feed.with_merged(batch, MergeMode::Prepend);
        assert_eq!(id_list(&feed), vec![12, 11, 10, 9, 8, 7, 6]);
        assert_eq!(added, vec![PostId(12), PostId(11)]);
        assert_eq!(feed.as_of(), Some(PostId(12)));
        assert_eq!(feed.get(PostId(8)).map(|p| p.id), Some(PostId(8)));
    }

    #[test]
    fn test_update_is_copy_on_write() {
        let before = store(&[3, 2, 1]);
        let after = before
            .with_post_updated(PostId(2), |post| post.upvotes = 9)
            .unwrap();

        assert_eq!(before.get(PostId(2)).unwrap().upvotes, 0);
        assert_eq!(after.get(PostId(2)).unwrap().upvotes, 9);
        assert!(after.with_post_updated(PostId(99), |_| {}).is_none());
    }

    #[test]
    fn test_remove_post() {
        let feed = store(&[3, 2, 1]);
        let trimmed = feed.without_post(PostId(2)).unwrap();

        assert_eq!(id_list(&trimmed), vec![3, 1]);
        assert!(!trimmed.contains(PostId(2)));
        assert_eq!(trimmed.get(PostId(1)).map(|p| p.id), Some(PostId(1)));
        assert!(trimmed.without_post(PostId(2)).is_none());
    }

    #[test]
    fn test_categories_first_seen_order() {
        let feed = FeedStore::from_posts(vec![
            Post::new(3, "").with_categories(["Blue", "Red"]),
            Post::new(2, "").with_categories(["Red", "Green"]),
            Post::new(1, ""),
        ]);
        assert_eq!(feed.categories(), vec!["Blue", "Red", "Green"]);
    }
}
