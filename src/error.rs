//! Platform error taxonomy.
//!
//! Accessor internals return these variants so diagnostics stay structured;
//! the host-facing boundary (`FirmwareDevice`) maps every failure to the
//! contract's `None`/`false` after logging it. Nothing here is process-fatal.

use std::path::PathBuf;

use thiserror::Error;

pub type PlatformResult<T> = Result<T, PlatformError>;

#[derive(Debug, Error)]
pub enum PlatformError {
    /// Sysfs attribute missing or unreadable.
    #[error("cannot read {}: {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Command output or attribute content did not match the expected shape.
    #[error("malformed response from {origin}: {detail}")]
    MalformedResponse { origin: String, detail: String },

    /// The component has no defined behavior for the requested operation.
    #[error("{component} does not support {operation}")]
    UnsupportedComponent {
        component: String,
        operation: &'static str,
    },

    /// Supplied firmware image path does not exist.
    #[error("firmware image not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    /// External tool could not be spawned or exited nonzero.
    #[error("{tool} failed: {detail}")]
    ToolExecutionFailed { tool: String, detail: String },

    /// Index outside the fixed component table.
    #[error("component index {index} out of range (table has {count} entries)")]
    IndexOutOfRange { index: usize, count: usize },

    /// Filesystem error while staging a firmware image for flashing.
    #[error("failed to stage firmware image: {0}")]
    Staging(#[source] std::io::Error),
}
