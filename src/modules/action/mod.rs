pub mod sentinel;

pub use sentinel::{NewsSentinel, SentinelOptions};
