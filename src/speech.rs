//! Spoken and tooltip text produced by the game core.
//!
//! Speech is English only; tooltips follow the selected language.

use crate::game::evaluator::statement_holds;
use crate::model::{ComparisonMode, HintReason, Language, Relation, RoundNumbers};

fn operator_phrase(mode: ComparisonMode) -> &'static str {
    match mode {
        ComparisonMode::Greater => "is greater than",
        ComparisonMode::Less => "is less than",
    }
}

/// Read out when a round starts, e.g. "812 is greater than 340. True or false?".
pub fn problem_text(numbers: RoundNumbers, mode: ComparisonMode) -> String {
    format!(
        "{} {} {}. True or false?",
        numbers.left,
        operator_phrase(mode),
        numbers.right
    )
}

/// Read out after a lost round: the real relation, then the verdict.
pub fn explanation_text(numbers: RoundNumbers, mode: ComparisonMode) -> String {
    let RoundNumbers { left, right } = numbers;
    let verdict = if statement_holds(numbers, mode) { "true" } else { "false" };
    match numbers.relation() {
        Relation::LeftGreater => {
            format!("{left} is greater than {right}, so the statement is {verdict}.")
        }
        Relation::LeftLess => format!("{left} is less than {right}, so the statement is {verdict}."),
        Relation::Equal => format!("{left} equals {right}, so the statement is {verdict}."),
    }
}

pub fn hint_text(reason: HintReason, language: Language) -> &'static str {
    use HintReason::*;
    match (language, reason) {
        (Language::En, WrongFirstTryGreater) => {
            "Look at the dots! If 🔴 RED is on the RIGHT, it's BIGGER!"
        }
        (Language::En, WrongFirstTryLess) => "Look at the dots! If 🔴 RED is on the LEFT, it's SMALLER!",
        (Language::Ko, WrongFirstTryGreater) => "점을 보세요! 🔴 빨간색이 오른쪽에 있으면 더 큽니다!",
        (Language::Ko, WrongFirstTryLess) => "점을 보세요! 🔴 빨간색이 왼쪽에 있으면 더 작습니다!",
        (Language::Ja, WrongFirstTryGreater) => "点を見て！🔴 赤が右側にあれば大きいです！",
        (Language::Ja, WrongFirstTryLess) => "点を見て！🔴 赤が左側にあれば小さいです！",
    }
}
