//! Blog feed
//!
//! User posts are append-only and live in the session. The predefined posts
//! are static and always render after them.

use crate::error::{DashboardError, Result};
use crate::types::BlogPost;

/// A read-only post compiled into the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredefinedPost {
    pub title: &'static str,
    pub content: &'static str,
    pub image_url: &'static str,
    pub link: &'static str,
}

pub const PREDEFINED_POSTS: [PredefinedPost; 3] = [
    PredefinedPost {
        title: "Health Insurance",
        content: "Pre-existing Conditions and Health Insurance: What You Need to Know",
        image_url: "https://1finance.co.in/magazine/wp-content/uploads/2024/05/pasted-image-0-2.png",
        link: "https://1finance.co.in/blog/pre-existing-conditions-and-health-insurance-what-you-need-to-know/",
    },
    PredefinedPost {
        title: "CMP",
        content: "What Is CMP In The Stock Market?",
        image_url: "https://dbs7qpzv4mcv.cloudfront.net/981_1580986825.jpeg",
        link: "https://www.motilaloswal.com/blog-details/what-is-cmp-in-the-stock-market/22572",
    },
    PredefinedPost {
        title: "Stocks in India",
        content: "Best Tea Stocks To Invest In India In 2024",
        image_url: "https://dbs7qpzv4mcv.cloudfront.net/21_1593239577.jpeg",
        link: "https://www.motilaloswal.com/blog-details/best-tea-stocks-to-invest-in-india-in-2024/22571",
    },
];

/// Where a feed entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Predefined,
}

/// A borrowed view of one post in render order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedItem<'a> {
    pub origin: Origin,
    pub title: &'a str,
    pub content: &'a str,
    pub image_url: &'a str,
    pub link: &'a str,
}

/// Build a post, rejecting any empty field
pub fn compose(title: &str, content: &str, image_url: &str, link: &str) -> Result<BlogPost> {
    for (name, value) in [
        ("title", title),
        ("content", content),
        ("image_url", image_url),
        ("link", link),
    ] {
        if value.is_empty() {
            return Err(DashboardError::MissingField(name));
        }
    }
    Ok(BlogPost {
        title: title.to_string(),
        content: content.to_string(),
        image_url: image_url.to_string(),
        link: link.to_string(),
    })
}

/// Session posts in insertion order, then predefined posts in definition order
pub fn feed(posts: &[BlogPost]) -> impl Iterator<Item = FeedItem<'_>> {
    let user = posts.iter().map(|p| FeedItem {
        origin: Origin::User,
        title: &p.title,
        content: &p.content,
        image_url: &p.image_url,
        link: &p.link,
    });
    let predefined = PREDEFINED_POSTS.iter().map(|p| FeedItem {
        origin: Origin::Predefined,
        title: p.title,
        content: p.content,
        image_url: p.image_url,
        link: p.link,
    });
    user.chain(predefined)
}
