//! Status codes reported by the accelerator runtime and the numeric kernel library.

use std::fmt;

/// A failure status reported by an accelerator runtime primitive.
///
/// Carries the runtime's numeric code and its human-readable description so
/// that diagnostics can show both, whichever backend produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: i32,
    pub description: String,
}

impl Status {
    pub fn new(code: i32, description: impl Into<String>) -> Self {
        Self { code, description: description.into() }
    }

    /// An argument was outside the range accepted by the runtime.
    pub fn invalid_value() -> Self {
        Self::new(1, "invalid argument")
    }

    /// The runtime could not satisfy an allocation request.
    pub fn out_of_memory() -> Self {
        Self::new(2, "out of memory")
    }

    /// The address does not name a live device allocation.
    pub fn invalid_device_pointer() -> Self {
        Self::new(17, "invalid device pointer")
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.description)
    }
}

#[cfg(feature = "cuda")]
impl From<cudarc::driver::DriverError> for Status {
    fn from(error: cudarc::driver::DriverError) -> Self {
        let description = error
            .error_string()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown error".to_string());
        Self { code: error.0 as i32, description }
    }
}

/// Status codes returned by the dense linear algebra library that consumes device buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlasStatus {
    Success,
    NotInitialized,
    AllocFailed,
    InvalidValue,
    ArchMismatch,
    MappingError,
    ExecutionFailed,
    InternalError,
}

impl BlasStatus {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Success,
            1 => Self::NotInitialized,
            3 => Self::AllocFailed,
            7 => Self::InvalidValue,
            8 => Self::ArchMismatch,
            11 => Self::MappingError,
            13 => Self::ExecutionFailed,
            14 => Self::InternalError,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::NotInitialized => 1,
            Self::AllocFailed => 3,
            Self::InvalidValue => 7,
            Self::ArchMismatch => 8,
            Self::MappingError => 11,
            Self::ExecutionFailed => 13,
            Self::InternalError => 14,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "CUBLAS_STATUS_SUCCESS",
            Self::NotInitialized => "CUBLAS_STATUS_NOT_INITIALIZED",
            Self::AllocFailed => "CUBLAS_STATUS_ALLOC_FAILED",
            Self::InvalidValue => "CUBLAS_STATUS_INVALID_VALUE",
            Self::ArchMismatch => "CUBLAS_STATUS_ARCH_MISMATCH",
            Self::MappingError => "CUBLAS_STATUS_MAPPING_ERROR",
            Self::ExecutionFailed => "CUBLAS_STATUS_EXECUTION_FAILED",
            Self::InternalError => "CUBLAS_STATUS_INTERNAL_ERROR",
        }
    }

    /// Symbolic name for a raw status code, or `"unknown error"` outside the table.
    pub fn describe(code: i32) -> &'static str {
        Self::from_code(code).map_or("unknown error", Self::name)
    }
}

impl fmt::Display for BlasStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
