//! Handing device buffers to numeric kernels.
//!
//! Kernels live outside this crate. They receive the raw device address,
//! the matrix shape and the layout the buffer was written in, which is
//! enough to pick leading dimensions and transpose flags.

use dualmat_device::{DevicePtr, Layout};
use snafu::{OptionExt, ResultExt};

use crate::error::{DeviceLayoutUnknownSnafu, DeviceSnafu, NotAllocatedSnafu, Result, Side};
use crate::matrix::Matrix;

/// Offset of element `(i, j)` in a column-major array with leading dimension `ld`.
pub const fn idx2c(i: usize, j: usize, ld: usize) -> usize {
    j * ld + i
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelArgs {
    pub ptr: DevicePtr,
    pub rows: usize,
    pub cols: usize,
    pub layout: Layout,
}

impl KernelArgs {
    /// Stride between consecutive rows (row-major) or columns (column-major).
    ///
    /// Never below one, as BLAS rejects a zero leading dimension.
    pub fn leading_dimension(&self) -> usize {
        match self.layout {
            Layout::RowMajor => self.cols.max(1),
            Layout::ColumnMajor => self.rows.max(1),
        }
    }

    /// Offset of element `(i, j)` in the device buffer.
    pub fn offset(&self, i: usize, j: usize) -> usize {
        match self.layout {
            Layout::RowMajor => i * self.cols + j,
            Layout::ColumnMajor => idx2c(i, j, self.rows),
        }
    }
}

impl Matrix {
    /// Arguments for a kernel reading the device buffer.
    pub fn kernel_args(&self) -> Result<KernelArgs> {
        let device = self.device.as_ref().context(NotAllocatedSnafu { side: Side::Device })?;
        let layout = device.layout().context(DeviceLayoutUnknownSnafu)?;
        Ok(KernelArgs { ptr: device.ptr(), rows: self.rows, cols: self.cols, layout })
    }

    /// Arguments for a kernel that will write the device buffer in `layout`.
    ///
    /// Allocates the device buffer if needed and records `layout` as its
    /// contents, so a later pull of the matching variant reads it back.
    pub fn kernel_output(&mut self, layout: Layout) -> Result<KernelArgs> {
        if self.device.is_none() {
            self.alloc_device()?;
        }
        let device = self.device.as_mut().context(NotAllocatedSnafu { side: Side::Device })?;
        device.assume_layout(layout);
        Ok(KernelArgs { ptr: device.ptr(), rows: self.rows, cols: self.cols, layout })
    }

    /// Check a status code returned by a kernel run against this matrix.
    pub fn check_kernel(&self, kernel: &str, code: i32) -> Result<()> {
        self.context.policy().check_kernel(kernel, code).context(DeviceSnafu)
    }
}
