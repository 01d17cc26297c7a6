use crate::error::{QuoteError, QuoteResult};
use crate::models::WeightBracket;

/// Upper bounds, in grams, of the brackets shared by every product
pub const WEIGHT_BOUNDARIES: [u32; 7] = [20, 50, 100, 250, 350, 1000, 2000];

/// Resolve `weight_grams` to the smallest bracket whose upper bound is not below it.
///
/// `boundaries` must be sorted ascending. A weight equal to a boundary belongs
/// to the bracket ending at that boundary.
pub fn resolve_weight_bracket(weight_grams: i64, boundaries: &[u32]) -> QuoteResult<WeightBracket> {
    let index = boundaries.partition_point(|&bound| i64::from(bound) < weight_grams);

    match boundaries.get(index) {
        Some(&max) => {
            let min = match index {
                0 => 1,
                _ => boundaries[index - 1] + 1,
            };
            Ok(WeightBracket { min, max })
        }
        None => Err(QuoteError::WeightOutOfRange {
            weight_grams,
            max_weight_grams: boundaries.last().copied().unwrap_or(0),
        }),
    }
}
