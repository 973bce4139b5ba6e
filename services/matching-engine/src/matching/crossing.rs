//! Crossing detection logic
//!
//! Determines when the best bid and best ask can trade

use types::numeric::Price;

/// Check if a bid and ask can match at given prices
///
/// For a buy order to match with a sell order the buy price must be >= the
/// sell price.
pub fn can_match(bid_price: Price, ask_price: Price) -> bool {
    bid_price.greater_or_equal(&ask_price)
}

/// Check whether a book with these tops is crossed
///
/// A book with an empty side is never crossed.
pub fn is_crossed(best_bid: Option<Price>, best_ask: Option<Price>) -> bool {
    match (best_bid, best_ask) {
        (Some(bid), Some(ask)) => can_match(bid, ask),
        _ => false,
    }
}
