//! Walkthrough records: local catalog and post-recording discovery

mod catalog;
mod poller;

pub use catalog::{WalkthroughCatalog, WalkthroughEntry};
pub use poller::DiscoveryPoller;
