use std::fmt;

use html::ParseError;
use net::VerifyError;
use text_diff::PayloadMismatch;

/// Everything a strategy can fail with. Engine timeouts, missing
/// head/body and unresolved placeholders are not errors.
#[derive(Debug)]
pub enum DiffError {
    /// Source diff called with one text and one byte input.
    TypeMismatch(PayloadMismatch),
    /// A document could not be turned into a tree with a root element.
    Parse(ParseError),
    Verification(VerifyError),
    /// The strategy cannot work with the given input, e.g. raw bytes handed
    /// to an HTML strategy.
    UnsupportedInput {
        strategy: &'static str,
        reason: String,
    },
}

impl fmt::Display for DiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffError::TypeMismatch(e) => write!(f, "type mismatch: {e}"),
            DiffError::Parse(e) => write!(f, "parse failed: {e}"),
            DiffError::Verification(e) => write!(f, "remote verification failed: {e}"),
            DiffError::UnsupportedInput { strategy, reason } => {
                write!(f, "{strategy} cannot diff this input: {reason}")
            }
        }
    }
}

impl std::error::Error for DiffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiffError::TypeMismatch(e) => Some(e),
            DiffError::Parse(e) => Some(e),
            DiffError::Verification(e) => Some(e),
            DiffError::UnsupportedInput { .. } => None,
        }
    }
}

impl From<PayloadMismatch> for DiffError {
    fn from(e: PayloadMismatch) -> Self {
        DiffError::TypeMismatch(e)
    }
}

impl From<ParseError> for DiffError {
    fn from(e: ParseError) -> Self {
        DiffError::Parse(e)
    }
}

impl From<VerifyError> for DiffError {
    fn from(e: VerifyError) -> Self {
        DiffError::Verification(e)
    }
}
