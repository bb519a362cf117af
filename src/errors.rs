//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`RimeError`] covers all failure modes including:
//! - Malformed asset descriptions (accessor bounds, skin mismatches)
//! - Degenerate transforms detected during world-matrix resolution or skinning
//! - Out-of-range frame / segment queries
//! - Asset import failures
//!
//! Structural errors are detected once at bake setup and abort the bake of
//! the affected clip; numeric degeneracies that can be recovered per vertex
//! (a singular skin matrix) are handled locally and never surface here.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, RimeError>`.

use thiserror::Error;

/// The main error type for the rime engine.
#[derive(Error, Debug)]
pub enum RimeError {
    // ========================================================================
    // Asset Errors
    // ========================================================================
    /// The asset description violates the read contract (missing required
    /// attribute buffer, accessor past buffer bounds, skin joint count not
    /// matching its inverse-bind matrices, ...).
    #[error("Malformed asset: {0}")]
    MalformedAsset(String),

    /// An index-addressed lookup fell outside the owning collection.
    #[error("Index out of range: {context} (index: {index})")]
    OutOfRange {
        /// Description of what was being accessed
        context: String,
        /// The invalid index
        index: usize,
    },

    // ========================================================================
    // Evaluation Errors
    // ========================================================================
    /// A near-singular matrix was encountered where an inversion is required,
    /// or an evaluation produced non-finite geometry.
    #[error("Degenerate transform: {0}")]
    DegenerateTransform(String),

    /// A path query needs at least two control points.
    #[error("Path query on {count} control point(s); at least 2 are required")]
    InsufficientPoints {
        /// Number of points the polyline currently holds
        count: usize,
    },

    // ========================================================================
    // Import & Infrastructure Errors
    // ========================================================================
    /// glTF parsing or decoding error.
    #[error("glTF error: {0}")]
    Gltf(String),

    /// File I/O error while reading an asset or its external buffers.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The bake worker pool could not be constructed.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<gltf::Error> for RimeError {
    fn from(err: gltf::Error) -> Self {
        RimeError::Gltf(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for RimeError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        RimeError::WorkerPool(err.to_string())
    }
}

/// Alias for `Result<T, RimeError>`.
pub type Result<T> = std::result::Result<T, RimeError>;
