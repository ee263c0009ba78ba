use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "cuda")]
use std::sync::Arc;

#[cfg(feature = "cuda")]
use cudarc::driver::CudaContext;
use parking_lot::Mutex;

use crate::status::Status;

/// Address of an allocation in accelerator memory.
///
/// Opaque to the host: it can only be handed back to the [`Allocator`] that
/// produced it or to a kernel running on the same device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DevicePtr(u64);

impl DevicePtr {
    pub const NULL: DevicePtr = DevicePtr(0);

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> u64 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for DevicePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// The accelerator memory runtime.
///
/// Lengths are in `f64` elements. Every primitive reports failure through a
/// [`Status`]; callers check it right after the call via
/// [`DeviceContext::check`](crate::DeviceContext::check).
pub trait Allocator: Send + Sync + fmt::Debug {
    fn alloc(&self, len: usize) -> Result<DevicePtr, Status>;

    /// Freeing [`DevicePtr::NULL`] is a no-op.
    fn free(&self, ptr: DevicePtr) -> Result<(), Status>;

    fn copy_htod(&self, src: &[f64], dst: DevicePtr) -> Result<(), Status>;

    fn copy_dtoh(&self, src: DevicePtr, dst: &mut [f64]) -> Result<(), Status>;

    fn synchronize(&self) -> Result<(), Status> {
        Ok(())
    }

    fn name(&self) -> &str;
}

/// Accelerator emulated in system memory.
///
/// Each allocation lives in a table keyed by a synthetic device address, so
/// the emulator rejects the same misuse a real runtime would: unknown or
/// already-freed addresses, copies larger than the allocation, and requests
/// beyond an optional capacity.
#[derive(Debug, Default)]
pub struct CpuAllocator {
    state: Mutex<CpuState>,
}

#[derive(Debug, Default)]
struct CpuState {
    next: u64,
    live: HashMap<u64, Box<[f64]>>,
    in_use: usize,
    capacity: Option<usize>,
}

/// Spacing between synthetic addresses; keeps them non-null and distinct.
const ADDRESS_STRIDE: u64 = 0x100;

impl CpuAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emulated device with room for at most `elements` live `f64` values.
    pub fn with_capacity(elements: usize) -> Self {
        Self { state: Mutex::new(CpuState { capacity: Some(elements), ..Default::default() }) }
    }

    /// Number of allocations not yet freed.
    pub fn live_allocations(&self) -> usize {
        self.state.lock().live.len()
    }

    /// Total elements held by live allocations.
    pub fn elements_in_use(&self) -> usize {
        self.state.lock().in_use
    }

    /// Run `f` over the device memory at `ptr`, as a kernel on this device would.
    pub fn with_slice_mut<R>(&self, ptr: DevicePtr, f: impl FnOnce(&mut [f64]) -> R) -> Result<R, Status> {
        let mut state = self.state.lock();
        let data = state.live.get_mut(&ptr.as_raw()).ok_or_else(Status::invalid_device_pointer)?;
        Ok(f(data))
    }
}

impl Allocator for CpuAllocator {
    fn alloc(&self, len: usize) -> Result<DevicePtr, Status> {
        let mut state = self.state.lock();
        if let Some(capacity) = state.capacity
            && state.in_use.saturating_add(len) > capacity
        {
            return Err(Status::out_of_memory());
        }

        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| Status::out_of_memory())?;
        data.resize(len, 0.0);

        state.next += ADDRESS_STRIDE;
        let address = state.next;
        state.live.insert(address, data.into_boxed_slice());
        state.in_use += len;
        Ok(DevicePtr(address))
    }

    fn free(&self, ptr: DevicePtr) -> Result<(), Status> {
        if ptr.is_null() {
            return Ok(());
        }

        let mut state = self.state.lock();
        let data = state.live.remove(&ptr.as_raw()).ok_or_else(Status::invalid_device_pointer)?;
        state.in_use -= data.len();
        Ok(())
    }

    fn copy_htod(&self, src: &[f64], dst: DevicePtr) -> Result<(), Status> {
        let mut state = self.state.lock();
        let data = state.live.get_mut(&dst.as_raw()).ok_or_else(Status::invalid_device_pointer)?;
        let target = data.get_mut(..src.len()).ok_or_else(Status::invalid_value)?;
        target.copy_from_slice(src);
        Ok(())
    }

    fn copy_dtoh(&self, src: DevicePtr, dst: &mut [f64]) -> Result<(), Status> {
        let state = self.state.lock();
        let data = state.live.get(&src.as_raw()).ok_or_else(Status::invalid_device_pointer)?;
        let source = data.get(..dst.len()).ok_or_else(Status::invalid_value)?;
        dst.copy_from_slice(source);
        Ok(())
    }

    fn name(&self) -> &str {
        "CPU"
    }
}

/// CUDA allocator using the driver's synchronous memory API.
#[cfg(feature = "cuda")]
#[derive(Debug, Clone)]
pub struct CudaAllocator {
    context: Arc<CudaContext>,
    device_id: usize,
    name: String,
}

#[cfg(feature = "cuda")]
impl CudaAllocator {
    pub fn new(device_id: usize) -> Result<Self, Status> {
        let context = CudaContext::new(device_id)?;
        Ok(Self { context, device_id, name: format!("CUDA:{device_id}") })
    }

    pub fn device_id(&self) -> usize {
        self.device_id
    }
}

#[cfg(feature = "cuda")]
impl Allocator for CudaAllocator {
    fn alloc(&self, len: usize) -> Result<DevicePtr, Status> {
        // The driver rejects zero-byte requests.
        if len == 0 {
            return Ok(DevicePtr::NULL);
        }

        self.context.bind_to_thread()?;
        let raw = unsafe { cudarc::driver::result::malloc_sync(len * size_of::<f64>()) }?;
        Ok(DevicePtr(raw))
    }

    fn free(&self, ptr: DevicePtr) -> Result<(), Status> {
        if ptr.is_null() {
            return Ok(());
        }

        self.context.bind_to_thread()?;
        unsafe { cudarc::driver::result::free_sync(ptr.as_raw()) }?;
        Ok(())
    }

    fn copy_htod(&self, src: &[f64], dst: DevicePtr) -> Result<(), Status> {
        if src.is_empty() {
            return Ok(());
        }

        self.context.bind_to_thread()?;
        unsafe { cudarc::driver::result::memcpy_htod_sync(dst.as_raw(), src) }?;
        Ok(())
    }

    fn copy_dtoh(&self, src: DevicePtr, dst: &mut [f64]) -> Result<(), Status> {
        if dst.is_empty() {
            return Ok(());
        }

        self.context.bind_to_thread()?;
        unsafe { cudarc::driver::result::memcpy_dtoh_sync(dst, src.as_raw()) }?;
        Ok(())
    }

    fn synchronize(&self) -> Result<(), Status> {
        self.context.synchronize()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
