//! Dense `f64` matrices with paired host and accelerator storage.
//!
//! A [`Matrix`] is filled on the host, pushed to the device (row-major or
//! column-major), handed to external kernels through [`KernelArgs`], and
//! pulled back. Both buffers are owned by the matrix and released when it is
//! dropped; there is no sharing and no implicit copying.
//!
//! # Examples
//!
//! ```
//! use dualmat::{DeviceContext, Matrix};
//!
//! let mut m = Matrix::from_row_major_in(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DeviceContext::cpu())?;
//! m.push_column_major()?;
//! m.pull_column_major()?;
//! assert_eq!(m.at(1, 2)?, 6.0);
//! # Ok::<(), dualmat::Error>(())
//! ```

mod compare;
pub mod config;
pub mod error;
mod format;
pub mod kernel;
mod matrix;
mod transfer;


pub use config::{DEFAULT_TOLERANCE, MatrixConfig, default_context};
pub use dualmat_device::{DeviceContext, DevicePtr, ErrorPolicy, Layout};
pub use error::{Error, Result, Side};
pub use kernel::{KernelArgs, idx2c};
pub use matrix::Matrix;
