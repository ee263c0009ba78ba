//! Accelerator memory plumbing for dual-buffer matrices.
//!
//! The runtime boundary is the [`Allocator`] trait: allocate, free and the two
//! copy directions, all measured in `f64` elements. [`HostBuffer`] and
//! [`DeviceBuffer`] own one allocation each and release it on drop.
//! Every runtime call is checked immediately through a [`DeviceContext`],
//! whose [`ErrorPolicy`] decides between returning the error and aborting.
//!
//! Buffers are single-owner values: concurrent use of one buffer from
//! several threads is not supported, distinct buffers are independent.

pub mod allocator;
pub mod buffer;
pub mod error;
pub mod policy;
pub mod registry;
pub mod status;


#[cfg(feature = "cuda")]
pub use allocator::CudaAllocator;
pub use allocator::{Allocator, CpuAllocator, DevicePtr};
pub use buffer::{DeviceBuffer, HostBuffer, Layout};
pub use error::{Error, Result};
pub use policy::{DeviceContext, ErrorPolicy, Operation};
pub use registry::{DeviceRegistry, DeviceSpec, registry};
pub use status::{BlasStatus, Status};
