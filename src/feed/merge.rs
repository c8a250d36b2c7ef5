/// Merge/Dedup engine
use crate::models::{Post, PostId};
use std::collections::HashSet;
use std::sync::Arc;

/// Where a batch lands relative to the existing list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Forward pagination: older posts go after the existing ones
    Append,
    /// Refresh: newer posts go before the existing ones
    Prepend,
}

impl MergeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeMode::Append => "append",
            MergeMode::Prepend => "prepend",
        }
    }
}

/// Anything carrying a post identity
pub trait Keyed {
    fn key(&self) -> PostId;
}

impl Keyed for Post {
    fn key(&self) -> PostId {
        self.id
    }
}

impl<T: Keyed> Keyed for Arc<T> {
    fn key(&self) -> PostId {
        (**self).key()
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome<T> {
    pub items: Vec<T>,
    /// Ids that were not present before, in their merged order
    pub added: Vec<PostId>,
}

/// Combine `existing` with `incoming` by identity.
///
/// Existing entries always win over incoming duplicates. Duplicates inside
/// `incoming` keep their first occurrence.
/// Merging the same batch twice is the same as merging it once.
pub fn merge<T: Keyed + Clone>(existing: &[T], incoming: Vec<T>, mode: MergeMode) -> MergeOutcome<T> {
    let mut seen: HashSet<PostId> = existing.iter().map(Keyed::key).collect();

    let fresh: Vec<T> = incoming
        .into_iter()
        .filter(|item| seen.insert(item.key()))
        .collect();
    let added = fresh.iter().map(Keyed::key).collect();

    let items = match mode {
        MergeMode::Append => existing.iter().cloned().chain(fresh).collect(),
        MergeMode::Prepend => fresh.into_iter().chain(existing.iter().cloned()).collect(),
    };

    MergeOutcome { items, added }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posts(ids: &[i64]) -> Vec<Post> {
        ids.iter().map(|&id| Post::new(id, format!("post {}", id))).collect()
    }

    fn ids(items: &[Post]) -> Vec<i64> {
        items.iter().map(|p| p.id.0).collect()
    }

    #[test]
    fn test_append_skips_known_ids() {
        let outcome = merge(&posts(&[10, 9, 8]), posts(&[8, 7, 6]), MergeMode::Append);
        assert_eq!(ids(&outcome.items), vec![10, 9, 8, 7, 6]);
        assert_eq!(outcome.added, vec![PostId(7), PostId(6)]);
    }

    #[test]
    fn test_prepend_keeps_existing_order() {
        let outcome = merge(
            &posts(&[10, 9, 8, 7, 6]),
            posts(&[12, 11, 10, 9]),
            MergeMode::Prepend,
        );
        assert_eq!(ids(&outcome.items), vec![12, 11, 10, 9, 8, 7, 6]);
        assert_eq!(outcome.added, vec![PostId(12), PostId(11)]);
    }

    #[test]
    fn test_existing_copy_wins() {
        let existing = vec![Post::new(1, "local").with_votes(6, 0)];
        let incoming = vec![Post::new(1, "stale").with_votes(5, 0)];

        let outcome = merge(&existing, incoming, MergeMode::Prepend);
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].upvotes, 6);
        assert_eq!(outcome.items[0].content, "local");
        assert!(outcome.added.is_empty());
    }

    #[test]
    fn test_duplicates_within_batch() {
        let outcome = merge(&posts(&[5]), posts(&[4, 4, 3, 5, 3]), MergeMode::Append);
        assert_eq!(ids(&outcome.items), vec![5, 4, 3]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let cases: Vec<(Vec<i64>, Vec<i64>)> = vec![
            (vec![], vec![3, 2, 1]),
            (vec![10, 9, 8], vec![12, 11, 10, 9]),
            (vec![4, 3], vec![3, 3, 2, 7]),
            (vec![1, 2, 3], vec![]),
        ];

        for (existing, batch) in cases {
            for mode in [MergeMode::Append, MergeMode::Prepend] {
                let once = merge(&posts(&existing), posts(&batch), mode);
                let twice = merge(&once.items, posts(&batch), mode);
                assert_eq!(ids(&once.items), ids(&twice.items));
                assert!(twice.added.is_empty());

                let mut unique = ids(&once.items);
                unique.sort_unstable();
                unique.dedup();
                assert_eq!(unique.len(), once.items.len());
            }
        }
    }

    #[test]
    fn test_arc_items_merge() {
        let existing: Vec<Arc<Post>> = posts(&[2, 1]).into_iter().map(Arc::new).collect();
        let incoming: Vec<Arc<Post>> = posts(&[3, 2]).into_iter().map(Arc::new).collect();

        let outcome = merge(&existing, incoming, MergeMode::Prepend);
        assert_eq!(outcome.items.len(), 3);
        assert!(Arc::ptr_eq(&outcome.items[1], &existing[0]));
    }
}
