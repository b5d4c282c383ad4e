// =============================================================================
// Error kinds shared by the indicator engine and the market-data boundary
// =============================================================================
//
// Numeric edge cases (zero trading range, zero average loss) are NOT errors:
// the indicator modules resolve them to defined values.  Only the kinds below
// ever leave the engine or a provider.
// =============================================================================

use thiserror::Error;

/// Typed error for engine and provider calls.
///
/// Application code wraps these with `anyhow::Context` when it needs to
/// propagate them further.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Empty series, non-positive window/span, mismatched lengths, non-finite
    /// values.  Reported to the caller, never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The data source failed or returned nothing usable.  Worth retrying.
    #[error("upstream unavailable for {symbol}: {reason}")]
    UpstreamUnavailable { symbol: String, reason: String },

    /// The data source answered but refused the request (unknown or delisted
    /// symbol, malformed query).  Asking again gives the same answer.
    #[error("upstream rejected {symbol}: {reason}")]
    UpstreamRejected { symbol: String, reason: String },
}

impl EngineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn upstream(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    pub fn rejected(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UpstreamRejected {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. })
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
