use dualmat_device::{DeviceBuffer, DeviceContext, HostBuffer};
use snafu::{OptionExt, ResultExt, ensure};

use crate::config::default_context;
use crate::error::{
    DeviceSnafu, ElementCountSnafu, IndexOutOfBoundsSnafu, NotAllocatedSnafu, Result, Side, TooLargeSnafu,
};

/// A `rows x cols` matrix of `f64` owning one buffer in host memory and one
/// on the accelerator.
///
/// The host buffer is always row-major. The device buffer holds whatever the
/// last push or kernel wrote, in the layout it recorded. Either buffer may be
/// absent; keeping them in sync is up to the caller, who sequences the
/// pushes and pulls.
///
/// `Matrix` is move-only. Moving transfers both buffers; [`Matrix::take`]
/// moves out of a place and leaves an empty matrix behind. Duplicating the
/// buffers is an explicit [`Matrix::try_clone`]. One owner drives a matrix at
/// a time; distinct matrices may be used from different threads.
#[derive(Debug)]
pub struct Matrix {
    pub(crate) host: Option<HostBuffer>,
    pub(crate) device: Option<DeviceBuffer>,
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    pub(crate) context: DeviceContext,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::empty_in(default_context())
    }
}

impl Matrix {
    /// Matrix with `cols` columns and `rows` rows on the default device.
    ///
    /// Note the argument order: columns first. No buffer is allocated yet.
    pub fn new(cols: usize, rows: usize) -> Self {
        Self::new_in(cols, rows, default_context())
    }

    pub fn new_in(cols: usize, rows: usize, context: DeviceContext) -> Self {
        Self { host: None, device: None, rows, cols, context }
    }

    /// 0x0 matrix with no buffers.
    pub fn empty_in(context: DeviceContext) -> Self {
        Self::new_in(0, 0, context)
    }

    /// Matrix whose host buffer holds `values` in row-major order.
    pub fn from_row_major(cols: usize, rows: usize, values: Vec<f64>) -> Result<Self> {
        Self::from_row_major_in(cols, rows, values, default_context())
    }

    pub fn from_row_major_in(cols: usize, rows: usize, values: Vec<f64>, context: DeviceContext) -> Result<Self> {
        let mut matrix = Self::new_in(cols, rows, context);
        let expected = matrix.checked_size()?;
        let actual = values.len();
        ensure!(expected == actual, ElementCountSnafu { rows, cols, expected, actual });

        matrix.host = Some(HostBuffer::from_vec(values));
        Ok(matrix)
    }

    /// Move the matrix out, leaving an empty one on the same device in its place.
    pub fn take(&mut self) -> Self {
        let context = self.context.clone();
        std::mem::replace(self, Self::empty_in(context))
    }

    /// Deep copy of both buffers. The device copy keeps the recorded layout.
    pub fn try_clone(&self) -> Result<Self> {
        let mut clone = Self::new_in(self.cols, self.rows, self.context.clone());

        if let Some(host) = &self.host {
            let mut copy = HostBuffer::alloc(&self.context, host.len()).context(DeviceSnafu)?;
            copy.copy_from_slice(host);
            clone.host = Some(copy);
        }

        if let Some(device) = &self.device {
            let mut copy = DeviceBuffer::alloc(&self.context, device.len()).context(DeviceSnafu)?;
            if let Some(layout) = device.layout() {
                let mut staging = HostBuffer::alloc(&self.context, device.len()).context(DeviceSnafu)?;
                device.copyout(&mut staging).context(DeviceSnafu)?;
                copy.copyin(&staging, layout).context(DeviceSnafu)?;
            }
            clone.device = Some(copy);
        }

        Ok(clone)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element count, `rows * cols`, saturating at `usize::MAX`.
    ///
    /// When the product overflows, allocating either buffer fails with
    /// [`Error::TooLarge`](crate::Error::TooLarge).
    pub fn size(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    /// Element count, or an error if `rows * cols` overflows.
    pub fn checked_size(&self) -> Result<usize> {
        let (rows, cols) = (self.rows, self.cols);
        rows.checked_mul(cols).context(TooLargeSnafu { rows, cols })
    }

    pub fn context(&self) -> &DeviceContext {
        &self.context
    }

    pub fn is_host_allocated(&self) -> bool {
        self.host.is_some()
    }

    pub fn is_device_allocated(&self) -> bool {
        self.device.is_some()
    }

    /// Free and reallocate the host buffer. Previous host contents are lost.
    pub fn alloc_host(&mut self) -> Result<()> {
        let len = self.checked_size()?;
        self.free_host();
        self.host = Some(HostBuffer::alloc(&self.context, len).context(DeviceSnafu)?);
        Ok(())
    }

    /// Free and reallocate the device buffer. Previous device contents are lost.
    pub fn alloc_device(&mut self) -> Result<()> {
        let len = self.checked_size()?;
        self.free_device()?;
        self.device = Some(DeviceBuffer::alloc(&self.context, len).context(DeviceSnafu)?);
        Ok(())
    }

    pub fn free_host(&mut self) {
        self.host = None;
    }

    /// Release the device buffer, if any, checking the runtime's answer.
    pub fn free_device(&mut self) -> Result<()> {
        match self.device.take() {
            Some(device) => device.release().context(DeviceSnafu),
            None => Ok(()),
        }
    }

    /// Row-major host data.
    pub fn host(&self) -> Result<&[f64]> {
        self.host.as_deref().context(NotAllocatedSnafu { side: Side::Host })
    }

    pub fn host_mut(&mut self) -> Result<&mut [f64]> {
        self.host.as_deref_mut().context(NotAllocatedSnafu { side: Side::Host })
    }

    pub fn device(&self) -> Option<&DeviceBuffer> {
        self.device.as_ref()
    }

    /// Host element at row `i`, column `j`.
    pub fn at(&self, i: usize, j: usize) -> Result<f64> {
        let host = self.host()?;
        Ok(host[self.offset(i, j)?])
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) -> Result<()> {
        self.host()?;
        let offset = self.offset(i, j)?;
        self.host_mut()?[offset] = value;
        Ok(())
    }

    /// Row-major offset of `(row, col)`. Only called with a host buffer
    /// present, so `rows * cols` is known to fit.
    fn offset(&self, row: usize, col: usize) -> Result<usize> {
        let (rows, cols) = (self.rows, self.cols);
        ensure!(row < rows && col < cols, IndexOutOfBoundsSnafu { row, col, rows, cols });
        Ok(row * cols + col)
    }
}
