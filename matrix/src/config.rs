//! Matrix configuration.
//!
//! Explicit configuration goes through [`MatrixConfig::builder`]; the
//! process-wide defaults used by [`Matrix::new`](crate::Matrix::new) come
//! from the environment.

use dualmat_device::registry::registry;
use dualmat_device::{DeviceContext, DeviceSpec, ErrorPolicy};
use once_cell::sync::Lazy;
use snafu::ResultExt;

use crate::error::{DeviceSnafu, Error, Result};

/// Tolerance used by [`Matrix::approx_eq`](crate::Matrix::approx_eq) unless configured otherwise.
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq, bon::Builder)]
pub struct MatrixConfig {
    /// Accelerator new matrices are bound to.
    #[builder(default)]
    pub device: DeviceSpec,
    /// Response to failed allocations and transfers.
    #[builder(default)]
    pub policy: ErrorPolicy,
    /// Default bound for elementwise comparison.
    #[builder(default = DEFAULT_TOLERANCE)]
    pub tolerance: f64,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self { device: DeviceSpec::Cpu, policy: ErrorPolicy::Propagate, tolerance: DEFAULT_TOLERANCE }
    }
}

impl MatrixConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `DUALMAT_DEVICE` - Device spec such as `CPU` or `CUDA:0` (default: `CPU`)
    /// * `DUALMAT_ON_ERROR` - `propagate` or `abort` (default: `propagate`)
    /// * `DUALMAT_TOLERANCE` - Comparison tolerance (default: 1e-3)
    pub fn from_env() -> Result<Self> {
        let device = DeviceSpec::from_env().context(DeviceSnafu)?;
        let policy = ErrorPolicy::from_env();
        let tolerance = match std::env::var("DUALMAT_TOLERANCE") {
            Ok(value) => parse_tolerance(&value)?,
            Err(_) => DEFAULT_TOLERANCE,
        };
        Ok(Self { device, policy, tolerance })
    }

    /// Open the configured device and pair it with the configured policy.
    pub fn context(&self) -> Result<DeviceContext> {
        let allocator = registry().get(&self.device).context(DeviceSnafu)?;
        Ok(DeviceContext::new(allocator, self.policy))
    }

    /// Process-wide configuration, read from the environment on first use.
    pub fn global() -> &'static MatrixConfig {
        &GLOBAL_CONFIG
    }
}

pub(crate) fn parse_tolerance(value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(tolerance) if tolerance.is_finite() && tolerance >= 0.0 => Ok(tolerance),
        _ => Err(Error::InvalidTolerance { value: value.to_string() }),
    }
}

static GLOBAL_CONFIG: Lazy<MatrixConfig> = Lazy::new(|| {
    MatrixConfig::from_env().unwrap_or_else(|error| {
        tracing::warn!(%error, "invalid matrix configuration in environment, using defaults");
        MatrixConfig::default()
    })
});

static DEFAULT_CONTEXT: Lazy<DeviceContext> = Lazy::new(|| {
    let config = MatrixConfig::global();
    config.context().unwrap_or_else(|error| {
        tracing::warn!(device = %config.device, %error, "configured device unavailable, using CPU emulator");
        DeviceContext::cpu().with_policy(config.policy)
    })
});

/// Context that [`Matrix::new`](crate::Matrix::new) and [`Matrix::default`](crate::Matrix) bind to.
pub fn default_context() -> DeviceContext {
    DEFAULT_CONTEXT.clone()
}
