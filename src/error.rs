//! Error types for the event-detection and persistence pipeline.
//!
//! Mirrors the six error kinds named by the engine's contract: most are
//! recovered locally (logged and degraded to a best-estimate event), only
//! store and range errors actually propagate out of the coordinator.

use thiserror::Error;

/// The engine's unified error type.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Store connection lost or schema corrupt. Surfaced; the run is marked failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),

    /// A natural-key collision was not absorbed by the upsert. Logged, batch rolled back.
    #[error("store constraint violation: {0}")]
    StoreConstraintViolation(String),

    /// The ephemeris backend failed for a specific Julian Day / body.
    #[error("ephemeris unavailable for jd={jd}, body={body}: {reason}")]
    EphemerisUnavailable {
        jd: f64,
        body: String,
        reason: String,
    },

    /// A bracket contained no root, or the iteration budget was exceeded.
    #[error("root find diverged: {0}")]
    RootFindDiverged(String),

    /// `start_year > end_year`.
    #[error("invalid range: start_year {start_year} > end_year {end_year}")]
    InvalidRange { start_year: i32, end_year: i32 },

    /// A body referenced by a detector is absent from the catalog.
    #[error("catalog missing body: {0}")]
    CatalogMissing(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
