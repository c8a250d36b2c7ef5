/// Category Filter - pure projection over loaded posts
use crate::models::Post;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

pub const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => post.has_category(name),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Named(s.to_string())
        })
    }
}

impl From<&str> for CategoryFilter {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(filter) => filter,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL_CATEGORIES),
            CategoryFilter::Named(name) => f.write_str(name),
        }
    }
}

/// Keep the posts tagged with `category`, in their original order
pub fn filter<'a, I>(posts: I, category: &CategoryFilter) -> Vec<&'a Post>
where
    I: IntoIterator<Item = &'a Post>,
{
    posts.into_iter().filter(|p| category.matches(p)).collect()
}
