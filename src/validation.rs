//! Icon Validation - Rule/Policy Separation
//!
//! The size rule produces an outcome.
//! Policy maps outcomes to actions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::svg::SvgDocument;

/// Expected icon viewport: a square edge or an explicit pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ExpectedSize {
    Square(u32),
    Rect { width: u32, height: u32 },
}

impl ExpectedSize {
    pub fn width(&self) -> u32 {
        match self {
            ExpectedSize::Square(n) => *n,
            ExpectedSize::Rect { width, .. } => *width,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            ExpectedSize::Square(n) => *n,
            ExpectedSize::Rect { height, .. } => *height,
        }
    }

    pub fn matches(&self, width: f64, height: f64) -> bool {
        width == self.width() as f64 && height == self.height() as f64
    }
}

impl fmt::Display for ExpectedSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width(), self.height())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Accept,
    RejectDimensionMismatch {
        expected: ExpectedSize,
        width: f64,
        height: f64,
    },
    RejectParseError,
}

impl ValidationOutcome {
    pub fn is_accept(&self) -> bool {
        matches!(self, ValidationOutcome::Accept)
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationOutcome::Accept => f.write_str("accepted"),
            ValidationOutcome::RejectDimensionMismatch {
                expected,
                width,
                height,
            } => write!(f, "expected {}, found {}x{}", expected, width, height),
            ValidationOutcome::RejectParseError => f.write_str("icon could not be parsed"),
        }
    }
}

/// What to do with an icon whose viewport does not match.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SizeMismatchPolicy {
    /// Log a warning and keep the icon.
    #[default]
    Warn,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationAction {
    Keep,
    KeepWithWarning,
    Remove,
}

/// The size rule on its own.
pub fn validate_size(
    svg: &SvgDocument,
    expected: Option<ExpectedSize>,
    skip: bool,
) -> ValidationOutcome {
    let Some(expected) = expected.filter(|_| !skip) else {
        return ValidationOutcome::Accept;
    };
    if expected.matches(svg.width(), svg.height()) {
        ValidationOutcome::Accept
    } else {
        ValidationOutcome::RejectDimensionMismatch {
            expected,
            width: svg.width(),
            height: svg.height(),
        }
    }
}

/// Per-job validator: holds the size rule configuration and the policy.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    expected: Option<ExpectedSize>,
    skip: bool,
    policy: SizeMismatchPolicy,
}

impl Validator {
    pub fn new(expected: Option<ExpectedSize>, skip: bool) -> Self {
        Self {
            expected,
            skip,
            policy: SizeMismatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SizeMismatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// `None` stands for an icon that failed to load.
    pub fn validate(&self, svg: Option<&SvgDocument>) -> ValidationOutcome {
        match svg {
            Some(svg) => validate_size(svg, self.expected, self.skip),
            None => ValidationOutcome::RejectParseError,
        }
    }

    // Apply failure policy
    pub fn action(&self, outcome: &ValidationOutcome) -> ValidationAction {
        match (outcome, self.policy) {
            (ValidationOutcome::Accept, _) => ValidationAction::Keep,
            (ValidationOutcome::RejectParseError, _) => ValidationAction::Remove,
            (ValidationOutcome::RejectDimensionMismatch { .. }, SizeMismatchPolicy::Warn) => {
                ValidationAction::KeepWithWarning
            }
            (ValidationOutcome::RejectDimensionMismatch { .. }, SizeMismatchPolicy::Remove) => {
                ValidationAction::Remove
            }
        }
    }
}
