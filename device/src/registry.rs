use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::allocator::{Allocator, CpuAllocator};
use crate::error::{Error, InvalidDeviceSnafu, Result};

/// Which accelerator a matrix lives on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum DeviceSpec {
    /// Accelerator emulated in system memory.
    #[default]
    Cpu,
    Cuda { device_id: usize },
}

impl DeviceSpec {
    /// Parse a device string.
    ///
    /// Examples:
    /// - "CPU" -> DeviceSpec::Cpu
    /// - "CUDA:1" -> DeviceSpec::Cuda { device_id: 1 }
    /// - "gpu" -> DeviceSpec::Cuda { device_id: 0 } (default to device 0)
    pub fn parse(s: &str) -> Result<Self> {
        let upper = s.trim().to_uppercase();
        let (kind, id) = match upper.split_once(':') {
            Some((kind, id)) => (kind, Some(id)),
            None => (upper.as_str(), None),
        };

        match (kind, id) {
            ("CPU", None) => Ok(DeviceSpec::Cpu),
            ("CUDA" | "GPU", None) => Ok(DeviceSpec::Cuda { device_id: 0 }),
            ("CUDA" | "GPU", Some(id)) => {
                let device_id = id.parse().map_err(|_| Error::InvalidDevice { device: s.to_string() })?;
                Ok(DeviceSpec::Cuda { device_id })
            }
            _ => InvalidDeviceSnafu { device: s }.fail(),
        }
    }

    /// Read the device from `DUALMAT_DEVICE`, defaulting to the CPU emulator.
    pub fn from_env() -> Result<Self> {
        match std::env::var("DUALMAT_DEVICE") {
            Ok(value) => Self::parse(&value),
            Err(_) => Ok(DeviceSpec::Cpu),
        }
    }

    pub fn canonicalize(&self) -> String {
        match self {
            DeviceSpec::Cpu => "CPU".to_string(),
            DeviceSpec::Cuda { device_id } => format!("CUDA:{device_id}"),
        }
    }
}

impl FromStr for DeviceSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonicalize())
    }
}

/// Process-wide table of opened accelerators.
pub struct DeviceRegistry {
    devices: RwLock<HashMap<DeviceSpec, Arc<dyn Allocator>>>,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self { devices: RwLock::new(HashMap::new()) }
    }

    /// Get or open a device allocator.
    pub fn get(&self, spec: &DeviceSpec) -> Result<Arc<dyn Allocator>> {
        // Fast path: read lock
        {
            let devices = self.devices.read();
            if let Some(allocator) = devices.get(spec) {
                return Ok(Arc::clone(allocator));
            }
        }

        let mut devices = self.devices.write();

        // Double-check after acquiring write lock
        if let Some(allocator) = devices.get(spec) {
            return Ok(Arc::clone(allocator));
        }

        let allocator = Self::open(spec)?;
        tracing::debug!(device = %spec, "opened device");
        devices.insert(spec.clone(), Arc::clone(&allocator));
        Ok(allocator)
    }

    /// Get a device by parsing a device string.
    pub fn get_device(&self, device: &str) -> Result<Arc<dyn Allocator>> {
        self.get(&DeviceSpec::parse(device)?)
    }

    fn open(spec: &DeviceSpec) -> Result<Arc<dyn Allocator>> {
        match spec {
            DeviceSpec::Cpu => Ok(Arc::new(CpuAllocator::new())),
            #[cfg(feature = "cuda")]
            DeviceSpec::Cuda { device_id } => {
                let allocator = crate::allocator::CudaAllocator::new(*device_id)
                    .map_err(|status| Error::Unavailable { device: spec.canonicalize(), status })?;
                Ok(Arc::new(allocator))
            }
            #[cfg(not(feature = "cuda"))]
            DeviceSpec::Cuda { .. } => {
                InvalidDeviceSnafu { device: format!("{spec} (built without the cuda feature)") }.fail()
            }
        }
    }
}

static REGISTRY: Lazy<DeviceRegistry> = Lazy::new(DeviceRegistry::new);

/// Get the global device registry.
pub fn registry() -> &'static DeviceRegistry {
    &REGISTRY
}

/// Convenience function to get a device allocator by string.
pub fn get_device(device: &str) -> Result<Arc<dyn Allocator>> {
    registry().get_device(device)
}

/// Convenience function to get the shared CPU emulator.
pub fn cpu() -> Result<Arc<dyn Allocator>> {
    registry().get(&DeviceSpec::Cpu)
}
