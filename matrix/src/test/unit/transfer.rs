use crate::test::helpers::{device, iota};
use crate::transfer::transpose_into;
use crate::{Error, Layout, Matrix, Side};

#[test]
fn test_transpose_into() {
    let src = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let mut dst = [0.0; 6];

    transpose_into(&src, 2, 3, &mut dst);
    assert_eq!(dst, [1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
}

#[test]
fn test_push_row_major_allocates_device() {
    let (allocator, context) = device();
    let mut m = iota(3, 2, context);

    m.push_row_major().unwrap();

    let device = m.device().unwrap();
    assert_eq!(device.len(), 6);
    assert_eq!(device.layout(), Some(Layout::RowMajor));
    let contents = allocator.with_slice_mut(device.ptr(), |data| data.to_vec()).unwrap();
    assert_eq!(contents, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn test_push_column_major_device_contents() {
    let (allocator, context) = device();
    let mut m = Matrix::from_row_major_in(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], context).unwrap();

    m.push_column_major().unwrap();

    let device = m.device().unwrap();
    assert_eq!(device.layout(), Some(Layout::ColumnMajor));
    let contents = allocator.with_slice_mut(device.ptr(), |data| data.to_vec()).unwrap();
    assert_eq!(contents, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    assert_eq!(m.host().unwrap(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn test_push_reuses_device_buffer() {
    let (allocator, context) = device();
    let mut m = iota(2, 2, context);

    m.push_row_major().unwrap();
    let ptr = m.device().unwrap().ptr();
    m.push_column_major().unwrap();

    assert_eq!(m.device().unwrap().ptr(), ptr);
    assert_eq!(allocator.live_allocations(), 1);
}

#[test]
fn test_row_major_roundtrip() {
    let (_, context) = device();
    let mut m = Matrix::from_row_major_in(2, 2, vec![0.1, -1e300, f64::MIN_POSITIVE, 42.0], context).unwrap();

    m.push_row_major().unwrap();
    m.host_mut().unwrap().fill(0.0);
    m.pull_row_major().unwrap();

    assert_eq!(m.host().unwrap(), &[0.1, -1e300, f64::MIN_POSITIVE, 42.0]);
}

#[test]
fn test_column_major_roundtrip_two_by_three() {
    let (_, context) = device();
    let original = Matrix::from_row_major_in(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], context.clone()).unwrap();
    let mut m = Matrix::from_row_major_in(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], context).unwrap();

    m.push_column_major().unwrap();
    m.free_host();
    m.pull_column_major().unwrap();

    assert!(m.approx_eq_within(&original, 1e-9).unwrap());
    assert_eq!(m.at(0, 2).unwrap(), 3.0);
    assert_eq!(m.at(1, 0).unwrap(), 4.0);
}

#[test]
fn test_pull_allocates_host() {
    let (_, context) = device();
    let mut m = iota(3, 3, context);
    m.push_row_major().unwrap();
    m.free_host();

    m.pull_row_major().unwrap();
    assert_eq!(m.at(2, 2).unwrap(), 8.0);
}

#[test]
fn test_push_without_host_buffer() {
    let (_, context) = device();
    let mut m = Matrix::new_in(3, 2, context);

    assert!(matches!(m.push_row_major(), Err(Error::NotAllocated { side: Side::Host })));
    assert!(matches!(m.push_column_major(), Err(Error::NotAllocated { side: Side::Host })));
    assert!(!m.is_device_allocated());
}

#[test]
fn test_pull_without_device_buffer() {
    let (_, context) = device();
    let mut m = iota(3, 2, context);

    assert!(matches!(m.pull_row_major(), Err(Error::NotAllocated { side: Side::Device })));
    assert!(matches!(m.pull_column_major(), Err(Error::NotAllocated { side: Side::Device })));
}

#[test]
fn test_pull_unwritten_device_buffer() {
    let (_, context) = device();
    let mut m = Matrix::new_in(3, 2, context);
    m.alloc_device().unwrap();

    assert!(matches!(m.pull_row_major(), Err(Error::DeviceLayoutUnknown)));
    assert!(!m.is_host_allocated());
}

#[test]
fn test_mismatched_pull_is_rejected() {
    let (_, context) = device();
    let mut m = iota(3, 2, context);

    m.push_column_major().unwrap();
    let error = m.pull_row_major().unwrap_err();
    assert!(matches!(error, Error::LayoutMismatch { requested: Layout::RowMajor, actual: Layout::ColumnMajor }));

    m.push_row_major().unwrap();
    let error = m.pull_column_major().unwrap_err();
    assert!(matches!(error, Error::LayoutMismatch { requested: Layout::ColumnMajor, actual: Layout::RowMajor }));

    assert_eq!(m.host().unwrap(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn test_transfer_failure_is_reported() {
    let (allocator, context) = device();
    let mut m = iota(2, 2, context);
    m.push_row_major().unwrap();

    // Free the allocation behind the matrix's back; the next copy must fail.
    let ptr = m.device().unwrap().ptr();
    dualmat_device::Allocator::free(&*allocator, ptr).unwrap();

    let error = m.pull_row_major().unwrap_err();
    assert!(error.device_error().unwrap().is_transfer());
}
