/// Pagination cursor and page results
use super::post::{Post, PostId};

/// Which posts a feed lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedScope {
    /// Global feed
    #[default]
    All,
    /// Posts by one user
    User(i64),
}

impl FeedScope {
    /// Collection path relative to the API base
    pub fn path(&self) -> String {
        match self {
            FeedScope::All => "/posts".to_string(),
            FeedScope::User(id) => format!("/users/{}/posts", id),
        }
    }
}

/// Where forward pagination resumes.
///
/// Callers treat this as opaque; only the gateway reads its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    page: u32,
    limit: u32,
}

impl PageCursor {
    /// Cursor for the most recent `limit` items
    pub fn first(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
        }
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            limit: self.limit,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// One normalized gateway response
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub posts: Vec<Post>,
    /// Present iff more pages exist
    pub next_cursor: Option<PageCursor>,
    /// Newest post id seen in this page
    pub as_of: Option<PostId>,
}

impl PageResult {
    pub fn new(posts: Vec<Post>, next_cursor: Option<PageCursor>) -> Self {
        let as_of = posts.iter().map(|p| p.id).max();
        Self {
            posts,
            next_cursor,
            as_of,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next_cursor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_advances() {
        let cursor = PageCursor::first(5);
        assert_eq!(cursor.page(), 1);
        assert_eq!(cursor.next().page(), 2);
        assert_eq!(cursor.next().limit(), 5);
        assert_eq!(PageCursor::first(0).limit(), 1);
    }

    #[test]
    fn test_scope_paths() {
        assert_eq!(FeedScope::default(), FeedScope::All);
        assert_eq!(FeedScope::All.path(), "/posts");
        assert_eq!(FeedScope::User(7).path(), "/users/7/posts");
    }

    #[test]
    fn test_page_result_as_of() {
        let page = PageResult::new(
            vec![Post::new(9, "a"), Post::new(12, "b"), Post::new(3, "c")],
            None,
        );
        assert_eq!(page.as_of, Some(PostId(12)));
        assert!(!page.has_next());
        assert_eq!(PageResult::new(vec![], None).as_of, None);
    }
}
