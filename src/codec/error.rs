use std::fmt::{Display, Formatter};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodecError>;

/// The codec step an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Init,
    SetupSession,
    Compress,
    Decompress,
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operation::Init => "session init",
            Operation::SetupSession => "session setup",
            Operation::Compress => "compression",
            Operation::Decompress => "decompression",
        })
    }
}

/// Errors reported by codecs.
///
/// Backend status codes never leak out of this type except inside
/// [`CodecError::Unknown`] and [`CodecError::ResourceUnavailable`], where the
/// raw code is kept for diagnostics.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// The caller or the session configuration supplied invalid parameters.
    /// Not retryable without changing inputs.
    #[error("{0} failure: params is invalid")]
    InvalidParams(Operation),

    /// The backend declined the operation. The caller may retry or fall back.
    #[error("{0} failure: function did not succeed")]
    OperationFailed(Operation),

    /// An unclassified backend status.
    #[error("{op} failure with error: {code}")]
    Unknown { op: Operation, code: i32 },

    /// Streaming mode was requested from a codec that has none.
    #[error("streaming {0} unsupported")]
    UnsupportedOperation(Operation),

    /// No hardware device or not enough memory at setup time.
    #[error("{op} failure: no compression resources available (error {code})")]
    ResourceUnavailable { op: Operation, code: i32 },
}

impl CodecError {
    pub fn operation(&self) -> Operation {
        match *self {
            CodecError::InvalidParams(op)
            | CodecError::OperationFailed(op)
            | CodecError::UnsupportedOperation(op) => op,
            CodecError::Unknown { op, .. } | CodecError::ResourceUnavailable { op, .. } => op,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_operation() {
        assert_eq!(
            CodecError::InvalidParams(Operation::Compress).to_string(),
            "compression failure: params is invalid"
        );
        assert_eq!(
            CodecError::Unknown { op: Operation::Decompress, code: -4 }.to_string(),
            "decompression failure with error: -4"
        );
        assert_eq!(
            CodecError::UnsupportedOperation(Operation::Compress).to_string(),
            "streaming compression unsupported"
        );
    }

    #[test]
    fn operation_is_recoverable_from_every_variant() {
        let errors = [
            CodecError::InvalidParams(Operation::Init),
            CodecError::OperationFailed(Operation::Compress),
            CodecError::Unknown { op: Operation::Decompress, code: 7 },
            CodecError::UnsupportedOperation(Operation::Decompress),
            CodecError::ResourceUnavailable { op: Operation::SetupSession, code: -101 },
        ];
        let ops: Vec<_> = errors.iter().map(CodecError::operation).collect();
        assert_eq!(
            ops,
            [
                Operation::Init,
                Operation::Compress,
                Operation::Decompress,
                Operation::Decompress,
                Operation::SetupSession
            ]
        );
    }
}
