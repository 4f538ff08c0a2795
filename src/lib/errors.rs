//! Custom error types for svprep operations.

use thiserror::Error;

/// Result type alias for svprep operations
pub type Result<T> = std::result::Result<T, SvPrepError>;

/// Error type for svprep operations
#[derive(Error, Debug)]
pub enum SvPrepError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "BAM", "hotspot TSV")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// Required reference sequence not found
    #[error("Reference sequence '{ref_name}' not found in header")]
    ReferenceNotFound {
        /// The reference sequence name
        ref_name: String,
    },

    /// A region string could not be parsed
    #[error("Invalid region '{region}': {reason}")]
    InvalidRegion {
        /// The region as given
        region: String,
        /// Explanation of the problem
        reason: String,
    },

    /// Scanning a partition failed
    #[error("Partition {partition_id} ({region}) failed: {reason}")]
    PartitionFailed {
        /// The partition task id
        partition_id: usize,
        /// The partition's genome region
        region: String,
        /// The underlying failure
        reason: String,
    },

    /// A worker could not start or panicked
    #[error("Worker {worker} failed: {reason}")]
    WorkerFailed {
        /// The worker index
        worker: usize,
        /// The underlying failure
        reason: String,
    },

    /// A worker observed that another worker failed and stopped early
    #[error("Scan cancelled after an earlier failure")]
    Cancelled,
}
