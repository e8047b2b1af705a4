//! Value types shared by the generator, evaluator, session and browser bridge.
//!
//! String forms match what the page stores in `localStorage` and what the
//! buttons / selectors send, so parsing here is the single place where
//! untrusted names become typed values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Largest number a round may show (inclusive). The smallest is 0.
pub const MAX_NUMBER: u16 = 1000;

/// The pair shown for one round. Immutable for the lifetime of the round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundNumbers {
    pub left: u16,
    pub right: u16,
}

impl RoundNumbers {
    pub fn new(left: u16, right: u16) -> Self {
        Self { left, right }
    }

    pub fn relation(&self) -> Relation {
        match self.left.cmp(&self.right) {
            std::cmp::Ordering::Greater => Relation::LeftGreater,
            std::cmp::Ordering::Less => Relation::LeftLess,
            std::cmp::Ordering::Equal => Relation::Equal,
        }
    }

    pub fn is_equal(&self) -> bool {
        self.left == self.right
    }
}

/// How `left` actually relates to `right`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relation {
    LeftGreater,
    LeftLess,
    Equal,
}

/// Which inequality the game is drilling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMode {
    #[default]
    Greater,
    Less,
}

impl ComparisonMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonMode::Greater => "greater",
            ComparisonMode::Less => "less",
        }
    }

    /// Operator shown between the two numbers.
    pub fn symbol(self) -> char {
        match self {
            ComparisonMode::Greater => '>',
            ComparisonMode::Less => '<',
        }
    }

    pub fn hint_reason(self) -> HintReason {
        match self {
            ComparisonMode::Greater => HintReason::WrongFirstTryGreater,
            ComparisonMode::Less => HintReason::WrongFirstTryLess,
        }
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonMode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greater" => Ok(ComparisonMode::Greater),
            "less" => Ok(ComparisonMode::Less),
            other => Err(GameError::InvalidArgument(format!(
                "unknown comparison mode '{other}'"
            ))),
        }
    }
}

/// The player's claim. `AssertHigher` is the "True" button, `AssertLower` the
/// "False" button; both are read against the current mode's operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    #[serde(rename = "higher")]
    AssertHigher,
    #[serde(rename = "lower")]
    AssertLower,
    #[serde(rename = "equal")]
    AssertEqual,
}

impl Answer {
    pub const ALL: [Answer; 3] = [Answer::AssertHigher, Answer::AssertLower, Answer::AssertEqual];

    pub fn as_str(self) -> &'static str {
        match self {
            Answer::AssertHigher => "higher",
            Answer::AssertLower => "lower",
            Answer::AssertEqual => "equal",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Answer {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "higher" => Ok(Answer::AssertHigher),
            "lower" => Ok(Answer::AssertLower),
            "equal" => Ok(Answer::AssertEqual),
            other => Err(GameError::InvalidArgument(format!("unknown answer '{other}'"))),
        }
    }
}

/// UI language. Only the codes with a phrase table are accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ko,
    Ja,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ko => "ko",
            Language::Ja => "ja",
        }
    }
}

impl FromStr for Language {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "ko" => Ok(Language::Ko),
            "ja" => Ok(Language::Ja),
            other => Err(GameError::InvalidArgument(format!("unsupported language '{other}'"))),
        }
    }
}

/// Why a first-click hint is shown; selects the tooltip message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HintReason {
    WrongFirstTryGreater,
    WrongFirstTryLess,
}
