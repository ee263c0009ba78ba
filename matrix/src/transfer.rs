//! Host <-> device transfers.
//!
//! The host side is always row-major. The column-major variants transpose
//! through a temporary host buffer on the way in and out, so the device can
//! hold the layout a kernel expects without the host representation changing.

use dualmat_device::{DeviceBuffer, DeviceContext, HostBuffer, Layout};
use snafu::{OptionExt, ResultExt};

use crate::error::{DeviceLayoutUnknownSnafu, DeviceSnafu, LayoutMismatchSnafu, NotAllocatedSnafu, Result, Side};
use crate::matrix::Matrix;

/// Write the transpose of the `rows x cols` row-major `src` into `dst`, which
/// then holds a `cols x rows` row-major array.
pub(crate) fn transpose_into(src: &[f64], rows: usize, cols: usize, dst: &mut [f64]) {
    debug_assert_eq!(src.len(), rows * cols);
    debug_assert_eq!(dst.len(), rows * cols);

    for i in 0..rows {
        for j in 0..cols {
            dst[j * rows + i] = src[i * cols + j];
        }
    }
}

impl Matrix {
    /// Copy the host buffer to the device as-is, allocating the device buffer if needed.
    pub fn push_row_major(&mut self) -> Result<()> {
        let host = self.host.as_ref().context(NotAllocatedSnafu { side: Side::Host })?;
        let device = ensure_device(&mut self.device, &self.context, host.len())?;
        device.copyin(host, Layout::RowMajor).context(DeviceSnafu)
    }

    /// Copy the host buffer to the device in column-major order, allocating
    /// the device buffer if needed. The host buffer is left untouched.
    pub fn push_column_major(&mut self) -> Result<()> {
        let host = self.host.as_ref().context(NotAllocatedSnafu { side: Side::Host })?;

        let mut staging = HostBuffer::alloc(&self.context, host.len()).context(DeviceSnafu)?;
        transpose_into(host, self.rows, self.cols, &mut staging);

        let device = ensure_device(&mut self.device, &self.context, staging.len())?;
        device.copyin(&staging, Layout::ColumnMajor).context(DeviceSnafu)
    }

    /// Copy a row-major device buffer back to the host, allocating the host buffer if needed.
    pub fn pull_row_major(&mut self) -> Result<()> {
        let device = readable_device(&self.device, Layout::RowMajor)?;
        if self.host.is_none() {
            self.host = Some(HostBuffer::alloc(&self.context, device.len()).context(DeviceSnafu)?);
        }

        let host = self.host.as_mut().context(NotAllocatedSnafu { side: Side::Host })?;
        device.copyout(host).context(DeviceSnafu)
    }

    /// Copy a column-major device buffer back to the host and restore row-major order.
    pub fn pull_column_major(&mut self) -> Result<()> {
        let device = readable_device(&self.device, Layout::ColumnMajor)?;

        let mut staging = HostBuffer::alloc(&self.context, device.len()).context(DeviceSnafu)?;
        device.copyout(&mut staging).context(DeviceSnafu)?;

        let mut host = match self.host.take() {
            Some(host) => host,
            None => HostBuffer::alloc(&self.context, staging.len()).context(DeviceSnafu)?,
        };
        // The device data is the transpose, a cols x rows row-major array.
        transpose_into(&staging, self.cols, self.rows, &mut host);
        self.host = Some(host);
        Ok(())
    }
}

fn ensure_device<'a>(
    device: &'a mut Option<DeviceBuffer>,
    context: &DeviceContext,
    len: usize,
) -> Result<&'a mut DeviceBuffer> {
    if device.is_none() {
        *device = Some(DeviceBuffer::alloc(context, len).context(DeviceSnafu)?);
    }
    device.as_mut().context(NotAllocatedSnafu { side: Side::Device })
}

fn readable_device(device: &Option<DeviceBuffer>, requested: Layout) -> Result<&DeviceBuffer> {
    let device = device.as_ref().context(NotAllocatedSnafu { side: Side::Device })?;
    let actual = device.layout().context(DeviceLayoutUnknownSnafu)?;
    snafu::ensure!(actual == requested, LayoutMismatchSnafu { requested, actual });
    Ok(device)
}
