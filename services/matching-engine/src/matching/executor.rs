//! Matching loop
//!
//! Repeatedly trades out the common volume at the top of both sides until
//! the book is no longer crossed. Each side fills at its own resting price;
//! no single execution price is negotiated between the two.

use types::errors::BookError;

use super::crossing;
use crate::book::ProductBookSide;
use crate::events::{FillEvent, FillSequence};

/// Match executor driving the cross-side trade-out loop
#[derive(Debug, Clone)]
pub struct MatchExecutor {
    sequence: FillSequence,
}

impl MatchExecutor {
    /// Create a new match executor with starting sequence number
    pub fn new(starting_sequence: u64) -> Self {
        Self {
            sequence: FillSequence::new(starting_sequence),
        }
    }

    /// Sequence number the next fill will receive
    pub fn next_sequence(&self) -> u64 {
        self.sequence.peek()
    }

    /// Trade both sides down until the book is uncrossed
    ///
    /// Returns every fill in execution order. Each iteration removes a
    /// positive amount of resting volume from both sides, so the loop ends.
    pub fn execute(
        &mut self,
        buy_side: &mut ProductBookSide,
        sell_side: &mut ProductBookSide,
    ) -> Result<Vec<FillEvent>, BookError> {
        let mut fills = Vec::new();

        while let (Some(best_buy), Some(best_sell)) = (buy_side.best_price(), sell_side.best_price()) {
            if !crossing::can_match(best_buy, best_sell) {
                break;
            }

            let volume = buy_side.best_volume().min(sell_side.best_volume());
            if volume == 0 {
                return Err(BookError::PreconditionViolation {
                    reason: format!("crossed levels at {} / {} hold no volume", best_buy, best_sell),
                });
            }

            fills.extend(sell_side.trade_out(best_sell, volume, &mut self.sequence)?);
            fills.extend(buy_side.trade_out(best_buy, volume, &mut self.sequence)?);
        }

        debug_assert!(!crossing::is_crossed(buy_side.best_price(), sell_side.best_price()));
        Ok(fills)
    }
}

impl Default for MatchExecutor {
    fn default() -> Self {
        Self::new(1)
    }
}
