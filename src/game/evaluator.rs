//! Answer evaluation.
//!
//! "True" (`AssertHigher`) always means "the inequality as displayed holds",
//! so its meaning flips with the mode; "False" (`AssertLower`) claims the
//! strict opposite and `AssertEqual` claims both sides match. A pair of equal
//! numbers is therefore only won by `AssertEqual`.

use crate::error::Result;
use crate::model::{Answer, ComparisonMode, Relation, RoundNumbers};

pub fn evaluate(numbers: RoundNumbers, answer: Answer, mode: ComparisonMode) -> bool {
    use Answer::*;
    use ComparisonMode::*;
    use Relation::*;
    matches!(
        (mode, answer, numbers.relation()),
        (Greater, AssertHigher, LeftGreater)
            | (Greater, AssertLower, LeftLess)
            | (Less, AssertHigher, LeftLess)
            | (Less, AssertLower, LeftGreater)
            | (_, AssertEqual, Equal)
    )
}

/// Untyped entry point for callers holding button and mode names.
/// Unknown names are rejected instead of scoring as a loss.
pub fn evaluate_raw(left: u16, right: u16, answer: &str, mode: &str) -> Result<bool> {
    let answer: Answer = answer.parse()?;
    let mode: ComparisonMode = mode.parse()?;
    Ok(evaluate(RoundNumbers::new(left, right), answer, mode))
}

/// Whether the displayed statement `left <op> right` is true.
pub fn statement_holds(numbers: RoundNumbers, mode: ComparisonMode) -> bool {
    match mode {
        ComparisonMode::Greater => numbers.left > numbers.right,
        ComparisonMode::Less => numbers.left < numbers.right,
    }
}

/// The answer that wins this round.
pub fn correct_answer(numbers: RoundNumbers, mode: ComparisonMode) -> Answer {
    if numbers.is_equal() {
        Answer::AssertEqual
    } else if statement_holds(numbers, mode) {
        Answer::AssertHigher
    } else {
        Answer::AssertLower
    }
}
