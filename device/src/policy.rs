//! Fail-fast checking of accelerator runtime calls.
//!
//! Every runtime primitive is checked right after it returns, before any
//! later operation runs. What happens to a failure is decided by the
//! [`ErrorPolicy`]: it is always logged, then either handed back to the
//! caller or the process is aborted on the spot.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::allocator::{Allocator, CpuAllocator};
use crate::error::{Error, HostAllocationSnafu, InvalidPolicySnafu, KernelSnafu, Result, RuntimeSnafu};
use crate::status::{BlasStatus, Status};

/// Runtime operation being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    DeviceAlloc,
    DeviceFree,
    CopyHostToDevice,
    CopyDeviceToHost,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::DeviceAlloc => "device alloc",
            Operation::DeviceFree => "device free",
            Operation::CopyHostToDevice => "host-to-device copy",
            Operation::CopyDeviceToHost => "device-to-host copy",
        }
    }

    pub fn is_transfer(self) -> bool {
        matches!(self, Operation::CopyHostToDevice | Operation::CopyDeviceToHost)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Response to a failed allocation or transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Return the error to the caller.
    #[default]
    Propagate,
    /// Log the failure and abort the process immediately.
    ///
    /// The structured report is a `tracing` event, visible only through a
    /// subscriber installed by the application. A one-line summary with the
    /// operation, status code and description also goes to stderr.
    Abort,
}

impl ErrorPolicy {
    /// Read the policy from `DUALMAT_ON_ERROR` (`propagate` or `abort`).
    pub fn from_env() -> Self {
        match std::env::var("DUALMAT_ON_ERROR") {
            Ok(value) => value.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %value, "unrecognized DUALMAT_ON_ERROR, using propagate");
                ErrorPolicy::Propagate
            }),
            Err(_) => ErrorPolicy::default(),
        }
    }

    /// Log `error` and apply the policy to it.
    pub fn escalate(self, error: Error) -> Error {
        match error.status() {
            Some(status) => tracing::error!(
                code = status.code,
                description = %status.description,
                policy = ?self,
                "{error}"
            ),
            None => tracing::error!(policy = ?self, "{error}"),
        }

        if self == ErrorPolicy::Abort {
            eprintln!("{}", abort_report(&error));
            std::process::abort();
        }
        error
    }

    /// Check a status code returned by a numeric kernel library call.
    pub fn check_kernel(self, kernel: &str, code: i32) -> Result<()> {
        if code == BlasStatus::Success.code() {
            return Ok(());
        }
        Err(self.escalate(KernelSnafu { kernel, code }.build()))
    }
}

/// Last words printed under [`ErrorPolicy::Abort`].
pub(crate) fn abort_report(error: &Error) -> String {
    format!("dualmat: aborting after fatal error: {error}")
}

impl FromStr for ErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" => Ok(ErrorPolicy::Propagate),
            "abort" => Ok(ErrorPolicy::Abort),
            _ => InvalidPolicySnafu { value: s }.fail(),
        }
    }
}

/// An accelerator runtime together with the policy applied to its failures.
///
/// Cloning is cheap; every clone talks to the same allocator.
#[derive(Debug, Clone)]
pub struct DeviceContext {
    allocator: Arc<dyn Allocator>,
    policy: ErrorPolicy,
}

impl DeviceContext {
    pub fn new(allocator: Arc<dyn Allocator>, policy: ErrorPolicy) -> Self {
        Self { allocator, policy }
    }

    /// Fresh emulated device with the propagating policy.
    pub fn cpu() -> Self {
        Self::new(Arc::new(CpuAllocator::new()), ErrorPolicy::Propagate)
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn allocator(&self) -> &dyn Allocator {
        &*self.allocator
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn device_name(&self) -> &str {
        self.allocator.name()
    }

    /// Check the outcome of a runtime primitive that touched `len` elements.
    pub fn check<T>(&self, operation: Operation, len: usize, result: Result<T, Status>) -> Result<T> {
        result.map_err(|status| {
            let error = RuntimeSnafu { operation, device: self.device_name(), len, status }.build();
            self.policy.escalate(error)
        })
    }

    /// Report a failed host allocation through the policy.
    pub(crate) fn host_allocation_failed(&self, len: usize) -> Error {
        self.policy.escalate(HostAllocationSnafu { len }.build())
    }
}
