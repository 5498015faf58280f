//! conversion errors
//!
//! A conversion either succeeds for the whole document or fails with a single [ConvertError]:
//! - [ConvertError::Syntax] when the input is not valid HCL
//! - [ConvertError::Validation] when a resource that should be converted does not have the expected shape
//!
//! Resources that do not match a conversion at all are never an error, they pass through unchanged.

use hcl_edit::structure::Block;

#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("failed to parse configuration")]
    Syntax(#[from] hcl_edit::parser::Error),
    #[error("{address}: {issue}")]
    Validation { address: String, issue: Issue },
}

impl ConvertError {
    /// Attributes `issue` to the resource or data source declared by `block`
    pub(crate) fn validation(block: &Block, issue: Issue) -> Self {
        let address = block
            .labels
            .iter()
            .map(|label| label.as_str())
            .collect::<Vec<_>>()
            .join(".");

        ConvertError::Validation { address, issue }
    }

    /// The validation issue, unless this is a syntax error
    pub fn issue(&self) -> Option<&Issue> {
        match self {
            ConvertError::Syntax(_) => None,
            ConvertError::Validation { issue, .. } => Some(issue),
        }
    }
}

/// Everything that can be wrong with a resource we are asked to convert
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Issue {
    #[error("{context}: attribute {name} not found")]
    MissingAttribute {
        context: &'static str,
        name: &'static str,
    },
    #[error("{context}: {name} not found")]
    MissingBlock {
        context: &'static str,
        name: &'static str,
    },
    #[error("{parent} must have at least one {name}")]
    NoBlocks {
        parent: &'static str,
        name: &'static str,
    },
    #[error("setting priority: priority is {0} but must be between 1 and 7")]
    PriorityOutOfRange(i64),
    #[error("setting {name}: {name} is {value} but must be at least 1")]
    NonPositiveCount { name: &'static str, value: i64 },
    #[error("dynamic blocks are not supported for {0}")]
    UnsupportedDynamicBlock(String),
    #[error("dynamic block {0} must be the only block, see docs for more information")]
    MixedDynamicBlock(String),
    #[error("dynamic block {block}: {missing} not found")]
    IncompleteDynamicBlock {
        block: String,
        missing: &'static str,
    },
    #[error("{0}: key or value not found")]
    MissingKeyValue(String),
    #[error("generated expression for {name} is invalid: {reason}")]
    InvalidExpression { name: String, reason: String },
}
