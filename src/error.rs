//! Core error taxonomy for terrain synthesis.

use thiserror::Error;

/// Errors raised by mesh creation, deformation, scatter placement and
/// height queries.
///
/// Validation always happens before any mutation, so a failed call leaves
/// the mesh exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TerrainError {
    #[error("Invalid parameter '{parameter}' in {context}: {reason}")]
    InvalidParameter {
        /// Operation or stage that rejected the value.
        context: &'static str,
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Human-readable explanation including the rejected value.
        reason: String,
    },
    #[error("Height query against a mesh with no surface vertices")]
    EmptyMesh,
}

impl TerrainError {
    pub(crate) fn invalid(
        context: &'static str,
        parameter: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        TerrainError::InvalidParameter {
            context,
            parameter,
            reason: reason.into(),
        }
    }
}

/// Rejects non-finite or non-positive values.
pub(crate) fn ensure_positive(
    context: &'static str,
    parameter: &'static str,
    value: f32,
) -> Result<(), TerrainError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TerrainError::invalid(
            context,
            parameter,
            format!("must be a finite value > 0, got {}", value),
        ))
    }
}

/// Rejects NaN and infinities.
pub(crate) fn ensure_finite(
    context: &'static str,
    parameter: &'static str,
    value: f32,
) -> Result<(), TerrainError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TerrainError::invalid(
            context,
            parameter,
            format!("must be finite, got {}", value),
        ))
    }
}
