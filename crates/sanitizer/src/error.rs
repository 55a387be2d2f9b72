// ABOUTME: Error types for the sanitizer including ErrorCode, Stage and the SanitizeError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

use crate::dom::cleaners::Pass;

/// Error codes representing different categories of sanitize failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidInput,
    Parse,
    Step,
    Config,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidInput => "invalid input",
            ErrorCode::Parse => "parse error",
            ErrorCode::Step => "step error",
            ErrorCode::Config => "configuration error",
        };
        write!(f, "{}", s)
    }
}

/// The stage of the sanitize state machine a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configure,
    Validate,
    Parse,
    Transform(Pass),
    Unify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Configure => write!(f, "configure"),
            Stage::Validate => write!(f, "validate"),
            Stage::Parse => write!(f, "parse"),
            Stage::Transform(pass) => write!(f, "transform/{}", pass),
            Stage::Unify => write!(f, "unify"),
        }
    }
}

/// The main error type for sanitize and extraction operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct SanitizeError {
    pub code: ErrorCode,
    pub stage: Stage,
    pub product_id: Option<String>,
    pub reason: String,
}

impl fmt::Display for SanitizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sanitize: {}", self.stage)?;
        if let Some(ref id) = self.product_id {
            write!(f, " [{}]", id)?;
        }
        write!(f, ": {}: {}", self.code, self.reason)
    }
}

impl SanitizeError {
    /// Create an InvalidInput error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidInput,
            stage: Stage::Validate,
            product_id: None,
            reason: reason.into(),
        }
    }

    /// Create a Parse error.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Parse,
            stage: Stage::Parse,
            product_id: None,
            reason: reason.into(),
        }
    }

    /// Create a Step error for a failed transformation pass.
    pub fn step(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Step,
            stage,
            product_id: None,
            reason: reason.into(),
        }
    }

    /// Create a Config error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Config,
            stage: Stage::Configure,
            product_id: None,
            reason: reason.into(),
        }
    }

    /// Attach the product identifier the failing description belongs to.
    pub fn with_product_id(mut self, product_id: Option<&str>) -> Self {
        self.product_id = product_id.map(str::to_string);
        self
    }

    /// Returns true if this is an InvalidInput error.
    pub fn is_invalid_input(&self) -> bool {
        self.code == ErrorCode::InvalidInput
    }

    /// Returns true if this is a Parse error.
    pub fn is_parse(&self) -> bool {
        self.code == ErrorCode::Parse
    }

    /// Returns true if this is a Step error.
    pub fn is_step(&self) -> bool {
        self.code == ErrorCode::Step
    }

    /// Returns true if this is a Config error.
    pub fn is_config(&self) -> bool {
        self.code == ErrorCode::Config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_stage_product_and_reason() {
        let err = SanitizeError::step(Stage::Transform(Pass::ImageWrap), "node 7 has no parent")
            .with_product_id(Some("SKU-1"));
        assert_eq!(
            err.to_string(),
            "sanitize: transform/image-wrap [SKU-1]: step error: node 7 has no parent"
        );
        assert!(err.is_step());
    }

    #[test]
    fn display_without_product_id() {
        let err = SanitizeError::invalid_input("empty description");
        assert_eq!(
            err.to_string(),
            "sanitize: validate: invalid input: empty description"
        );
        assert!(err.is_invalid_input());
        assert!(!err.is_parse());
    }
}
