use std::fmt;
use std::ops::{Deref, DerefMut};

use snafu::ensure;

use crate::allocator::DevicePtr;
use crate::error::{Result, SizeMismatchSnafu};
use crate::policy::{DeviceContext, Operation};

/// Element order of a linear matrix buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Element `(i, j)` at offset `i * cols + j`.
    RowMajor,
    /// Element `(i, j)` at offset `j * rows + i`.
    ColumnMajor,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::RowMajor => f.write_str("row-major"),
            Layout::ColumnMajor => f.write_str("column-major"),
        }
    }
}

/// Exclusively-owned buffer of `f64` values in system memory.
#[derive(Debug, PartialEq)]
pub struct HostBuffer {
    data: Box<[f64]>,
}

impl HostBuffer {
    /// Zero-filled buffer of `len` elements.
    ///
    /// Exhausted system memory is reported through the context's policy
    /// instead of aborting inside the global allocator.
    pub fn alloc(context: &DeviceContext, len: usize) -> Result<Self> {
        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            return Err(context.host_allocation_failed(len));
        }
        data.resize(len, 0.0);
        Ok(Self { data: data.into_boxed_slice() })
    }

    pub fn from_vec(data: Vec<f64>) -> Self {
        Self { data: data.into_boxed_slice() }
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data.into_vec()
    }
}

impl Deref for HostBuffer {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.data
    }
}

impl DerefMut for HostBuffer {
    fn deref_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// Exclusively-owned allocation in accelerator memory.
///
/// The allocation is returned to its runtime when the buffer is dropped. The
/// buffer remembers the [`Layout`] of the data last written into it so that
/// readers can tell how to interpret it; a fresh allocation has none.
#[derive(Debug)]
pub struct DeviceBuffer {
    ptr: DevicePtr,
    len: usize,
    layout: Option<Layout>,
    context: DeviceContext,
}

impl DeviceBuffer {
    pub fn alloc(context: &DeviceContext, len: usize) -> Result<Self> {
        let ptr = context.check(Operation::DeviceAlloc, len, context.allocator().alloc(len))?;
        tracing::debug!(device = context.device_name(), %ptr, len, "device buffer allocated");
        Ok(Self { ptr, len, layout: None, context: context.clone() })
    }

    pub fn ptr(&self) -> DevicePtr {
        self.ptr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Layout of the last write, if any.
    pub fn layout(&self) -> Option<Layout> {
        self.layout
    }

    /// Record that the contents are now in `layout`, e.g. after a kernel wrote them.
    pub fn assume_layout(&mut self, layout: Layout) {
        self.layout = Some(layout);
    }

    pub fn context(&self) -> &DeviceContext {
        &self.context
    }

    /// Copy `src` from host memory into this buffer, recording its layout.
    pub fn copyin(&mut self, src: &[f64], layout: Layout) -> Result<()> {
        let expected = self.len;
        let actual = src.len();
        ensure!(expected == actual, SizeMismatchSnafu { expected, actual });

        let result = self.context.allocator().copy_htod(src, self.ptr);
        self.context.check(Operation::CopyHostToDevice, self.len, result)?;
        self.layout = Some(layout);

        tracing::debug!(device = self.context.device_name(), ptr = %self.ptr, len = self.len, %layout, "copied host to device");
        Ok(())
    }

    /// Copy this buffer's contents into host memory.
    pub fn copyout(&self, dst: &mut [f64]) -> Result<()> {
        let expected = self.len;
        let actual = dst.len();
        ensure!(expected == actual, SizeMismatchSnafu { expected, actual });

        let result = self.context.allocator().copy_dtoh(self.ptr, dst);
        self.context.check(Operation::CopyDeviceToHost, self.len, result)?;

        tracing::debug!(device = self.context.device_name(), ptr = %self.ptr, len = self.len, "copied device to host");
        Ok(())
    }

    /// Free the allocation now, checking the runtime's answer.
    pub fn release(mut self) -> Result<()> {
        let ptr = std::mem::replace(&mut self.ptr, DevicePtr::NULL);
        let result = self.context.allocator().free(ptr);
        self.context.check(Operation::DeviceFree, self.len, result)
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        if self.ptr.is_null() {
            return;
        }

        // Drop has nowhere to report to; release() is the checked path.
        if let Err(status) = self.context.allocator().free(self.ptr) {
            tracing::warn!(device = self.context.device_name(), ptr = %self.ptr, %status, "failed to free device buffer");
        }
    }
}
