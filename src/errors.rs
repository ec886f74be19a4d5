//! Centralized error handling for rastercube
//!
//! This module provides structured error types for every cube, view and
//! calendar operation, enabling stable error kinds and useful messages.

use std::fmt;

/// Main error type for rastercube operations
#[derive(Debug)]
pub enum CubeError {
    /// A parameter failed the shared validation constraints
    ValidationError { parameter: String, reason: String },

    /// Period name outside the closed calendar-period set
    UnknownPeriod { period: String },

    /// A named dimension does not exist on the cube
    DimensionNotAvailable { dim: String },

    /// A dimension with this name already exists on the cube
    DimensionExists { dim: String },

    /// More than one candidate dimension and none was named explicitly
    TooManyDimensions { message: String },

    /// A temporal extent was fully open or had an unparseable bound
    InvalidExtent { message: String },

    /// A string could not be parsed as an RFC-3339 date, date-time or time
    InvalidTemporalString { value: String },

    /// Two output labels of a temporal aggregation coincide
    DuplicateLabel { label: String },

    /// Two cubes overlap but no overlap resolver was supplied
    OverlapResolverMissing,

    /// Dimension-shape or label invariant violated
    Internal(String),
}

impl CubeError {
    /// Stable kind name for this error, independent of the message text
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ValidationError { .. } => "ValidationError",
            Self::UnknownPeriod { .. } => "UnknownPeriod",
            Self::DimensionNotAvailable { .. } => "DimensionNotAvailable",
            Self::DimensionExists { .. } => "DimensionExists",
            Self::TooManyDimensions { .. } => "TooManyDimensions",
            Self::InvalidExtent { .. } => "InvalidExtent",
            Self::InvalidTemporalString { .. } => "InvalidTemporalString",
            Self::DuplicateLabel { .. } => "DuplicateLabel",
            Self::OverlapResolverMissing => "OverlapResolverMissing",
            Self::Internal(_) => "Internal",
        }
    }
}

impl fmt::Display for CubeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CubeError::ValidationError { parameter, reason } => {
                write!(f, "Invalid parameter '{}': {}", parameter, reason)
            }
            CubeError::UnknownPeriod { period } => {
                write!(f, "Unknown calendar period '{}'", period)
            }
            CubeError::DimensionNotAvailable { dim } => {
                write!(f, "Dimension '{}' is not available", dim)
            }
            CubeError::DimensionExists { dim } => {
                write!(f, "Dimension '{}' already exists", dim)
            }
            CubeError::TooManyDimensions { message } => write!(f, "{}", message),
            CubeError::InvalidExtent { message } => {
                write!(f, "Invalid temporal extent: {}", message)
            }
            CubeError::InvalidTemporalString { value } => {
                write!(f, "'{}' is not an RFC-3339 date, date-time or time", value)
            }
            CubeError::DuplicateLabel { label } => {
                write!(f, "Dimension label '{}' occurs more than once", label)
            }
            CubeError::OverlapResolverMissing => write!(
                f,
                "Overlapping data cubes, but no overlap resolver has been specified"
            ),
            CubeError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CubeError {}

impl From<String> for CubeError {
    fn from(message: String) -> Self {
        CubeError::Internal(message)
    }
}

impl From<&str> for CubeError {
    fn from(message: &str) -> Self {
        CubeError::Internal(message.to_string())
    }
}

/// Result type alias for rastercube operations
pub type Result<T> = std::result::Result<T, CubeError>;
