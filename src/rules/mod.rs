//! Payout rules for number and color predictions.
//!
//! The outcome space is the digits 0 through 9. A number bet wins on an
//! exact match; a color bet wins when the drawn digit falls in the color's
//! winning set. Two digits are dual colored: 0 is violet and green at the
//! same time, 5 is red and green. Multipliers are exact ratios so payout
//! math stays in integer chips.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of distinct outcomes (digits 0-9)
pub const OUTCOME_SPACE: u8 = 10;

/// A drawn digit in the range 0-9
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outcome(u8);

impl Outcome {
    /// Create an outcome, validating the digit range
    pub fn new(digit: u8) -> Result<Self> {
        if digit >= OUTCOME_SPACE {
            return Err(Error::InvalidBet(format!(
                "outcome digit must be 0-9, got {}",
                digit
            )));
        }
        Ok(Outcome(digit))
    }

    /// Create an outcome from a digit already known to be in range
    pub fn new_unchecked(digit: u8) -> Self {
        debug_assert!(digit < OUTCOME_SPACE);
        Outcome(digit)
    }

    /// The drawn digit
    pub fn digit(&self) -> u8 {
        self.0
    }

    /// Display colors of this digit, duals first where applicable
    pub fn colors(&self) -> &'static [Color] {
        match self.0 {
            0 => &[Color::Violet, Color::Green],
            5 => &[Color::Red, Color::Green],
            n if n % 2 == 0 => &[Color::Violet],
            _ => &[Color::Red],
        }
    }

    /// True for the two digits that belong to two colors at once
    pub fn is_dual(&self) -> bool {
        self.0 == 0 || self.0 == 5
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bettable colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Green,
    Violet,
    Red,
}

impl Color {
    /// All bettable colors
    pub const ALL: [Color; 3] = [Color::Green, Color::Violet, Color::Red];

    /// Digits on which a bet on this color wins
    pub fn winning_digits(&self) -> &'static [u8] {
        match self {
            Color::Green => &[0, 5],
            Color::Violet => &[0, 2, 4, 6, 8],
            Color::Red => &[1, 3, 5, 7, 9],
        }
    }

    /// Whether the drawn outcome falls in this color's winning set
    pub fn covers(&self, outcome: Outcome) -> bool {
        self.winning_digits().contains(&outcome.digit())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Green => write!(f, "green"),
            Color::Violet => write!(f, "violet"),
            Color::Red => write!(f, "red"),
        }
    }
}

/// What a player wagered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Exact digit match
    Number(u8),
    /// Any digit in the color's winning set
    Color(Color),
}

impl Selection {
    /// Create a number selection, validating the digit range
    pub fn number(digit: u8) -> Result<Self> {
        if digit >= OUTCOME_SPACE {
            return Err(Error::InvalidBet(format!(
                "number bets take a digit 0-9, got {}",
                digit
            )));
        }
        Ok(Selection::Number(digit))
    }

    /// Create a color selection
    pub fn color(color: Color) -> Self {
        Selection::Color(color)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Number(digit) => write!(f, "number {}", digit),
            Selection::Color(color) => write!(f, "{}", color),
        }
    }
}

/// Payout multiplier expressed as an exact ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multiplier {
    pub numerator: u32,
    pub denominator: u32,
}

impl Multiplier {
    /// 9× paid on a standard exact digit match
    pub const NUMBER: Multiplier = Multiplier::new(9, 1);
    /// 10× paid when the matched digit is 0
    pub const NUMBER_ZERO: Multiplier = Multiplier::new(10, 1);
    /// 2× paid on green and red
    pub const DOUBLE: Multiplier = Multiplier::new(2, 1);
    /// 4.5× paid on violet
    pub const VIOLET: Multiplier = Multiplier::new(9, 2);

    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Payout in chips for a winning wager (integer division, truncating)
    pub fn calculate(&self, amount: u64) -> u64 {
        (amount * self.numerator as u64) / self.denominator as u64
    }

    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}x", self.numerator)
        } else {
            write!(f, "{}x", self.as_f64())
        }
    }
}

/// Static rule table mapping a selection and a drawn outcome to a multiplier
pub struct PayoutTable {
    color_payouts: HashMap<Color, Multiplier>,
}

impl PayoutTable {
    pub fn new() -> Self {
        let mut color_payouts = HashMap::new();
        color_payouts.insert(Color::Green, Multiplier::DOUBLE);
        color_payouts.insert(Color::Red, Multiplier::DOUBLE);
        color_payouts.insert(Color::Violet, Multiplier::VIOLET);

        Self { color_payouts }
    }

    /// Multiplier applied when `selection` wins against `outcome`;
    /// `None` when the bet does not match
    pub fn multiplier_for(&self, selection: Selection, outcome: Outcome) -> Option<Multiplier> {
        match selection {
            Selection::Number(digit) if digit == outcome.digit() => Some(if digit == 0 {
                Multiplier::NUMBER_ZERO
            } else {
                Multiplier::NUMBER
            }),
            Selection::Number(_) => None,
            Selection::Color(color) if color.covers(outcome) => {
                self.color_payouts.get(&color).copied()
            }
            Selection::Color(_) => None,
        }
    }

    /// Multiplier a winning bet on this selection would earn. Digit 0
    /// pays its own number rate.
    pub fn potential(&self, selection: Selection) -> Multiplier {
        match selection {
            Selection::Number(0) => Multiplier::NUMBER_ZERO,
            Selection::Number(_) => Multiplier::NUMBER,
            Selection::Color(color) => self
                .color_payouts
                .get(&color)
                .copied()
                .unwrap_or(Multiplier::DOUBLE),
        }
    }

    /// Largest multiplier in the table, the bound on any single payout
    pub fn max_multiplier(&self) -> Multiplier {
        Multiplier::NUMBER_ZERO
    }
}

impl Default for PayoutTable {
    fn default() -> Self {
        Self::new()
    }
}
