// Order book reconstruction engine
pub mod types;  // price levels, feed events, book views
pub mod side;   // one half of the book, encoded-key ordering
pub mod book;   // applies feed events and keeps the book uncrossed

pub use book::OrderBookEngine;
pub use side::BookSide;
pub use types::{BookSideKind, BookView, CrossPolicy, FeedEvent, PriceLevel, Side};
