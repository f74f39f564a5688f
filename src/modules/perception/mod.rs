pub mod structs;
pub mod feed;

pub use structs::Article;
pub use feed::{FeedFetcher, NewsSource};
