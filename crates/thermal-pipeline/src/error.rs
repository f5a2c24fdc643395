//! Error types for the thermal pipeline.

use thiserror::Error;

use crate::record::GroupKey;

/// Errors that can occur while aggregating, validating, deriving or
/// encoding batches. Every variant is fatal for the run unless the
/// configured policy skips invalid batches.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to decode record: {0}")]
    Decode(String),

    #[error("Duplicate field '{field}' in group {key}: records of one group are not contiguous")]
    DuplicateField { field: String, key: GroupKey },

    #[error(
        "Incomplete batch {key}: missing [{}], unexpected [{}]",
        .missing.join(", "),
        .unexpected.join(", ")
    )]
    BatchIncomplete {
        key: GroupKey,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Inconsistent batch {key}: field '{field}' has {property} {found}, expected {expected}")]
    BatchInconsistent {
        key: GroupKey,
        field: String,
        property: &'static str,
        expected: String,
        found: String,
    },

    #[error("Failed to derive {index}: {reason}")]
    Derivation { index: String, reason: String },

    #[error("Failed to encode {index}: {reason}")]
    Encode { index: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_message_lists_fields() {
        let err = PipelineError::BatchIncomplete {
            key: GroupKey { step: 6, member: 0 },
            missing: vec!["2d".to_string()],
            unexpected: vec![],
        };
        assert_eq!(
            err.to_string(),
            "Incomplete batch step=6 member=0: missing [2d], unexpected []"
        );
    }

    #[test]
    fn test_inconsistent_message_names_field() {
        let err = PipelineError::BatchInconsistent {
            key: GroupKey { step: 12, member: 3 },
            field: "ssrd".to_string(),
            property: "grid shape",
            expected: "2x2".to_string(),
            found: "3x2".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("'ssrd'"));
        assert!(message.contains("grid shape 3x2, expected 2x2"));
    }
}
