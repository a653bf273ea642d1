//! Token amount conditions
//!
//! Balance requirements are written as a number (exact) or a string with an
//! optional comparison operator: `">= 1000"`, `"< 5"`, `"== 2"`, `"7"`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;

static CONDITION: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^\s*(>=|<=|==|>|<)?\s*(\d+)\s*$").ok());

/// Comparison operator of an [`AmountCondition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `==`
    Exactly,
    /// `>=`
    AtLeast,
    /// `>`
    MoreThan,
    /// `<=`
    AtMost,
    /// `<`
    LessThan,
}

impl Comparison {
    fn symbol(self) -> &'static str {
        match self {
            Self::Exactly => "==",
            Self::AtLeast => ">=",
            Self::MoreThan => ">",
            Self::AtMost => "<=",
            Self::LessThan => "<",
        }
    }
}

/// Condition on a balance, in whatever unit `amount` is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AmountCondition {
    /// Operator
    pub comparison: Comparison,
    /// Right-hand side
    pub amount: u128,
}

impl AmountCondition {
    /// Create a condition
    #[inline]
    #[must_use]
    pub fn new(comparison: Comparison, amount: u128) -> Self {
        Self { comparison, amount }
    }

    /// Parse from a JSON number or condition string
    ///
    /// Returns `None` for anything else, including negative numbers and
    /// fractional amounts.
    #[must_use]
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .map(|amount| Self::new(Comparison::Exactly, u128::from(amount))),
            Value::String(s) => Self::parse_str(s),
            _ => None,
        }
    }

    /// Parse a condition string
    #[must_use]
    pub fn parse_str(input: &str) -> Option<Self> {
        let captures = CONDITION.as_ref()?.captures(input)?;
        let comparison = match captures.get(1).map(|m| m.as_str()) {
            None | Some("==") => Comparison::Exactly,
            Some(">=") => Comparison::AtLeast,
            Some(">") => Comparison::MoreThan,
            Some("<=") => Comparison::AtMost,
            Some("<") => Comparison::LessThan,
            Some(_) => return None,
        };
        let amount = captures.get(2)?.as_str().parse().ok()?;
        Some(Self::new(comparison, amount))
    }

    /// Same condition with the amount multiplied by `unit`
    ///
    /// Returns `None` on overflow.
    #[must_use]
    pub fn scaled(self, unit: u128) -> Option<Self> {
        self.amount
            .checked_mul(unit)
            .map(|amount| Self::new(self.comparison, amount))
    }

    /// Check a balance against the condition
    #[must_use]
    pub fn satisfied_by(&self, balance: u128) -> bool {
        match self.comparison {
            Comparison::Exactly => balance == self.amount,
            Comparison::AtLeast => balance >= self.amount,
            Comparison::MoreThan => balance > self.amount,
            Comparison::AtMost => balance <= self.amount,
            Comparison::LessThan => balance < self.amount,
        }
    }

    /// Closest balance to `current` satisfying the condition
    ///
    /// Returns `None` when no balance can satisfy it (`< 0`, or `> u128::MAX`).
    #[must_use]
    pub fn target(&self, current: u128) -> Option<u128> {
        if self.satisfied_by(current) {
            return Some(current);
        }
        match self.comparison {
            Comparison::Exactly | Comparison::AtLeast | Comparison::AtMost => Some(self.amount),
            Comparison::MoreThan => self.amount.checked_add(1),
            Comparison::LessThan => self.amount.checked_sub(1),
        }
    }
}

impl fmt::Display for AmountCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.comparison.symbol(), self.amount)
    }
}
