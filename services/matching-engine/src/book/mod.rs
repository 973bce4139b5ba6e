//! Order book infrastructure module
//!
//! Contains price levels, the per-side book, and the two-sided product book.

pub mod price_level;
pub mod book_side;
pub mod product_book;

pub use price_level::PriceLevel;
pub use book_side::ProductBookSide;
pub use product_book::{AddOutcome, ProductBook};
