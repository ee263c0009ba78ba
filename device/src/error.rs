use snafu::Snafu;

use crate::policy::Operation;
use crate::status::{BlasStatus, Status};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// System memory could not satisfy a host buffer request.
    #[snafu(display("host allocation of {len} elements failed"))]
    HostAllocation { len: usize },

    /// An accelerator runtime primitive reported a failure status.
    #[snafu(display("{operation} of {len} elements on {device} failed: {status}"))]
    Runtime { operation: Operation, device: String, len: usize, status: Status },

    /// A numeric kernel returned a non-success library status.
    #[snafu(display("kernel '{kernel}' failed: [{code}] {}", BlasStatus::describe(*code)))]
    Kernel { kernel: String, code: i32 },

    #[snafu(display("size mismatch: expected {expected}, got {actual}"))]
    SizeMismatch { expected: usize, actual: usize },

    /// Invalid device specification.
    #[snafu(display("invalid device: {device}"))]
    InvalidDevice { device: String },

    /// Unrecognized error policy name.
    #[snafu(display("invalid error policy '{value}', expected 'propagate' or 'abort'"))]
    InvalidPolicy { value: String },

    /// The device is known but could not be opened.
    #[snafu(display("device {device} unavailable: {status}"))]
    Unavailable { device: String, status: Status },
}

impl Error {
    /// Whether the failure came from a host or device allocation request.
    pub fn is_allocation(&self) -> bool {
        matches!(
            self,
            Error::HostAllocation { .. } | Error::Runtime { operation: Operation::DeviceAlloc, .. }
        )
    }

    /// Whether the failure came from a host/device copy.
    pub fn is_transfer(&self) -> bool {
        matches!(self, Error::Runtime { operation, .. } if operation.is_transfer())
    }

    /// Runtime status attached to this error, if the runtime produced one.
    pub fn status(&self) -> Option<&Status> {
        match self {
            Error::Runtime { status, .. } | Error::Unavailable { status, .. } => Some(status),
            _ => None,
        }
    }
}
