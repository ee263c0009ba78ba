use std::fmt;

use dualmat_device::Layout;
use snafu::Snafu;

/// Which of a matrix's two buffers an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Host,
    Device,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Host => f.write_str("host"),
            Side::Device => f.write_str("device"),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("device operation failed: {source}"))]
    Device { source: dualmat_device::Error },

    #[snafu(display("{side} buffer is not allocated"))]
    NotAllocated { side: Side },

    #[snafu(display("index ({row}, {col}) is out of bounds for a {rows}x{cols} matrix"))]
    IndexOutOfBounds { row: usize, col: usize, rows: usize, cols: usize },

    #[snafu(display("a {rows}x{cols} matrix needs {expected} elements, got {actual}"))]
    ElementCount { rows: usize, cols: usize, expected: usize, actual: usize },

    #[snafu(display("a {rows}x{cols} matrix has more elements than are addressable"))]
    TooLarge { rows: usize, cols: usize },

    #[snafu(display("device buffer holds {actual} data, {requested} read requested"))]
    LayoutMismatch { requested: Layout, actual: Layout },

    #[snafu(display("device buffer has no recorded layout"))]
    DeviceLayoutUnknown,

    #[snafu(display("invalid tolerance '{value}'"))]
    InvalidTolerance { value: String },

    #[snafu(display("failed to write matrix"))]
    Write { source: std::io::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// The underlying device error, when the failure came from the runtime.
    pub fn device_error(&self) -> Option<&dualmat_device::Error> {
        match self {
            Error::Device { source } => Some(source),
            _ => None,
        }
    }
}
