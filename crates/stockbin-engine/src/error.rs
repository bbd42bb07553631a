//! # Engine Error Types
//!
//! The allocation service distinguishes sharply between two failure
//! shapes:
//!
//! - **Data conditions** (unknown item, empty availability, partial
//!   fulfillment) are not errors. They surface as empty or short
//!   outcomes and the call succeeds.
//! - **Infrastructure failures** (the ledger database is unreachable,
//!   a query fails) abort the whole call, so a caller never acts on a
//!   partially-consulted ledger.

use thiserror::Error;

/// Errors that abort an allocation call.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The ledger layer failed. The entire call is abandoned.
    #[error("ledger failure: {0}")]
    Ledger(#[from] stockbin_ledger::LedgerError),
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use stockbin_ledger::LedgerError;

    #[test]
    fn test_ledger_error_converts() {
        let err: EngineError = LedgerError::not_found("Item", "WIDGET").into();
        assert!(err.to_string().contains("WIDGET"));
    }
}
