/// Post, comment and media records as held by the feed store
use crate::error::{FeedError, FeedResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use std::fmt;

/// Server-assigned post identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostId(pub i64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for PostId {
    fn from(id: i64) -> Self {
        PostId(id)
    }
}

/// Public summary of a post's author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub user_id: Option<i64>,
    pub username: String,
    pub full_name: Option<String>,
    pub profile_picture: Option<String>,
}

impl Author {
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Embedded media payload carried as a data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub kind: MediaKind,
    pub mime: String,
    pub data: String,
}

impl MediaAttachment {
    /// Classify a `data:<mime>;...` payload by its MIME prefix.
    ///
    /// Returns `None` for anything that is not an image or video data URL.
    pub fn sniff(data: &str) -> Option<Self> {
        let rest = data.strip_prefix("data:")?;
        let mime = rest.split([';', ',']).next()?.trim().to_ascii_lowercase();

        let kind = if mime.starts_with("image/") {
            MediaKind::Image
        } else if mime.starts_with("video/") {
            MediaKind::Video
        } else {
            return None;
        };

        Some(Self {
            kind,
            mime,
            data: data.to_string(),
        })
    }

    /// Decode the base64 payload into raw bytes
    pub fn decode(&self) -> FeedResult<Vec<u8>> {
        let (header, payload) = self
            .data
            .split_once(',')
            .ok_or_else(|| FeedError::Malformed("Data URL has no payload".to_string()))?;

        if !header.ends_with(";base64") {
            return Err(FeedError::Malformed(format!(
                "Unsupported data URL encoding: {}",
                header
            )));
        }

        STANDARD
            .decode(payload.trim())
            .map_err(|e| FeedError::Malformed(format!("Invalid base64 payload: {}", e)))
    }
}

/// Comment identity; the server has emitted both numeric and string ids
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommentId {
    Number(i64),
    Text(String),
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentId::Number(n) => write!(f, "{}", n),
            CommentId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// `None` until the server has assigned one
    pub id: Option<CommentId>,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub text: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Comment {
    /// Normalize an avatar reference into a data URL.
    ///
    /// Bare base64 payloads are assumed to be JPEG.
    pub fn normalize_avatar(raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else if raw.starts_with("data:") {
            Some(raw.to_string())
        } else {
            Some(format!("data:image/jpeg;base64,{}", raw))
        }
    }
}

/// A feed entry
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: PostId,
    author: Option<Author>,
    is_anonymous: bool,
    pub content: String,
    pub media: Vec<MediaAttachment>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub upvotes: i64,
    pub downvotes: i64,
    pub comments: Vec<Comment>,
    pub categories: Vec<String>,
}

impl Post {
    pub fn new(id: i64, content: impl Into<String>) -> Self {
        Self {
            id: PostId(id),
            author: None,
            is_anonymous: false,
            content: content.into(),
            media: Vec::new(),
            created_at: None,
            updated_at: None,
            upvotes: 0,
            downvotes: 0,
            comments: Vec::new(),
            categories: Vec::new(),
        }
    }

    /// Attach an author; discarded when the post is anonymous
    pub fn with_author(mut self, author: Option<Author>) -> Self {
        self.author = if self.is_anonymous { None } else { author };
        self
    }

    /// Mark the post anonymous, dropping any author identity it carried
    pub fn anonymous(mut self) -> Self {
        self.is_anonymous = true;
        self.author = None;
        self
    }

    pub fn with_votes(mut self, upvotes: i64, downvotes: i64) -> Self {
        self.upvotes = upvotes;
        self.downvotes = downvotes;
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.is_anonymous
    }

    /// Author identity, never exposed for anonymous posts
    pub fn author(&self) -> Option<&Author> {
        if self.is_anonymous {
            None
        } else {
            self.author.as_ref()
        }
    }

    pub fn author_label(&self) -> &str {
        match self.author() {
            Some(author) => author.display_name(),
            None => "Anonymous",
        }
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn images(&self) -> impl Iterator<Item = &MediaAttachment> {
        self.media.iter().filter(|m| m.kind == MediaKind::Image)
    }

    pub fn videos(&self) -> impl Iterator<Item = &MediaAttachment> {
        self.media.iter().filter(|m| m.kind == MediaKind::Video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Author {
        Author {
            user_id: Some(7),
            username: "alice".to_string(),
            full_name: Some("Alice Mokoena".to_string()),
            profile_picture: None,
        }
    }

    #[test]
    fn test_post_id_honors_width() {
        assert_eq!(format!("{:<4}|", PostId(7)), "7   |");
        assert_eq!(format!("{:>3}", PostId(42)), " 42");
        assert_eq!(PostId(-1).to_string(), "-1");
    }

    #[test]
    fn test_anonymous_post_hides_author() {
        let post = Post::new(1, "hello").with_author(Some(alice())).anonymous();
        assert!(post.author().is_none());
        assert_eq!(post.author_label(), "Anonymous");

        // Order of builder calls must not matter
        let post = Post::new(2, "hello").anonymous().with_author(Some(alice()));
        assert!(post.author().is_none());
    }

    #[test]
    fn test_author_label() {
        let post = Post::new(1, "hi").with_author(Some(alice()));
        assert_eq!(post.author_label(), "Alice Mokoena");

        let mut bare = alice();
        bare.full_name = Some(String::new());
        let post = Post::new(1, "hi").with_author(Some(bare));
        assert_eq!(post.author_label(), "alice");
    }

    #[test]
    fn test_media_sniffing() {
        let image = MediaAttachment::sniff("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(image.kind, MediaKind::Image);
        assert_eq!(image.mime, "image/png");

        let video = MediaAttachment::sniff("data:video/mp4;base64,AAAA").unwrap();
        assert_eq!(video.kind, MediaKind::Video);

        assert!(MediaAttachment::sniff("data:application/pdf;base64,AAAA").is_none());
        assert!(MediaAttachment::sniff("https://cdn.example/cat.png").is_none());
    }

    #[test]
    fn test_media_decode() {
        let image = MediaAttachment::sniff("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(image.decode().unwrap(), b"hello".to_vec());

        let broken = MediaAttachment::sniff("data:image/png;base64,@@@").unwrap();
        assert!(broken.decode().is_err());
    }

    #[test]
    fn test_avatar_normalization() {
        assert_eq!(
            Comment::normalize_avatar("abcd"),
            Some("data:image/jpeg;base64,abcd".to_string())
        );
        assert_eq!(
            Comment::normalize_avatar("data:image/png;base64,abcd"),
            Some("data:image/png;base64,abcd".to_string())
        );
        assert_eq!(Comment::normalize_avatar("   "), None);
    }
}
