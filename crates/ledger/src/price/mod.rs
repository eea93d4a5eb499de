//! Price feed adapters

mod feed;

pub use feed::FeedPriceResolver;
