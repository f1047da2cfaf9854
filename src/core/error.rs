//! Error handling and error types for exact-gbdt.
//!
//! Training itself never fails on numeric edge cases (degenerate split
//! candidates are skipped, tiny curvature sums floor the leaf output to
//! zero). Errors are reserved for inputs that violate a precondition at the
//! crate boundary and for I/O around datasets and model files.

use std::io;
use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum GbdtError {
    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Malformed dataset (labels, counts, ordering, value ranges)
    #[error("Dataset error: {message}")]
    Dataset { message: String },

    /// Data dimension mismatch errors
    #[error("Data dimension mismatch: {message}")]
    DataDimensionMismatch { message: String },

    /// Data loading and parsing errors
    #[error("Data loading error: {message}")]
    DataLoading { message: String },

    /// Training-related errors
    #[error("Training error: {message}")]
    Training { message: String },

    /// Tree structure errors (invalid node arrays, broken invariants)
    #[error("Tree construction error: {message}")]
    TreeConstruction { message: String },

    /// Prediction errors
    #[error("Prediction error: {message}")]
    Prediction { message: String },

    /// Model serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// CSV parsing errors
    #[error("CSV parsing error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Bincode serialization errors
    #[error("Bincode error: {source}")]
    Bincode {
        #[from]
        source: bincode::Error,
    },

    /// Thread pool construction errors
    #[error("Threading error: {message}")]
    Threading { message: String },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Dimension mismatch errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },
}

/// Type alias for Results using GbdtError
pub type Result<T> = std::result::Result<T, GbdtError>;

impl GbdtError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        GbdtError::Config {
            message: message.into(),
        }
    }

    /// Create a dataset error
    pub fn dataset<S: Into<String>>(message: S) -> Self {
        GbdtError::Dataset {
            message: message.into(),
        }
    }

    /// Create a data dimension mismatch error
    pub fn data_dimension_mismatch<S: Into<String>>(message: S) -> Self {
        GbdtError::DataDimensionMismatch {
            message: message.into(),
        }
    }

    /// Create a data loading error
    pub fn data_loading<S: Into<String>>(message: S) -> Self {
        GbdtError::DataLoading {
            message: message.into(),
        }
    }

    /// Create a training error
    pub fn training<S: Into<String>>(message: S) -> Self {
        GbdtError::Training {
            message: message.into(),
        }
    }

    /// Create a tree construction error
    pub fn tree_construction<S: Into<String>>(message: S) -> Self {
        GbdtError::TreeConstruction {
            message: message.into(),
        }
    }

    /// Create a prediction error
    pub fn prediction<S: Into<String>>(message: S) -> Self {
        GbdtError::Prediction {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        GbdtError::Serialization {
            message: message.into(),
        }
    }

    /// Create a threading error
    pub fn threading<S: Into<String>>(message: S) -> Self {
        GbdtError::Threading {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        GbdtError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        GbdtError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            GbdtError::Config { .. } => "config",
            GbdtError::Dataset { .. } => "dataset",
            GbdtError::DataDimensionMismatch { .. } => "data_dimension_mismatch",
            GbdtError::DataLoading { .. } => "data_loading",
            GbdtError::Training { .. } => "training",
            GbdtError::TreeConstruction { .. } => "tree_construction",
            GbdtError::Prediction { .. } => "prediction",
            GbdtError::Serialization { .. } => "serialization",
            GbdtError::IO { .. } => "io",
            GbdtError::Csv { .. } => "csv",
            GbdtError::Json { .. } => "json",
            GbdtError::Bincode { .. } => "bincode",
            GbdtError::Threading { .. } => "threading",
            GbdtError::InvalidParameter { .. } => "invalid_parameter",
            GbdtError::DimensionMismatch { .. } => "dimension_mismatch",
        }
    }
}

/// Convenience macros for error creation
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::error::GbdtError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::GbdtError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! dataset_error {
    ($msg:expr) => {
        $crate::core::error::GbdtError::dataset($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::GbdtError::dataset(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}
