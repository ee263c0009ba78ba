use crate::{Allocator, CpuAllocator, DevicePtr, Status};

#[test]
fn test_alloc_returns_distinct_non_null_pointers() {
    let allocator = CpuAllocator::new();
    let a = allocator.alloc(4).unwrap();
    let b = allocator.alloc(4).unwrap();

    assert!(!a.is_null());
    assert!(!b.is_null());
    assert_ne!(a, b);
    assert_eq!(allocator.live_allocations(), 2);
    assert_eq!(allocator.elements_in_use(), 8);
}

#[test]
fn test_zero_length_allocation() {
    let allocator = CpuAllocator::new();
    let ptr = allocator.alloc(0).unwrap();

    assert!(!ptr.is_null());
    allocator.copy_htod(&[], ptr).unwrap();
    allocator.copy_dtoh(ptr, &mut []).unwrap();
    allocator.free(ptr).unwrap();
    assert_eq!(allocator.live_allocations(), 0);
}

#[test]
fn test_copy_roundtrip() {
    let allocator = CpuAllocator::new();
    let ptr = allocator.alloc(3).unwrap();

    allocator.copy_htod(&[1.5, -2.0, f64::MAX], ptr).unwrap();
    let mut out = [0.0; 3];
    allocator.copy_dtoh(ptr, &mut out).unwrap();

    assert_eq!(out, [1.5, -2.0, f64::MAX]);
}

#[test]
fn test_free_null_is_noop() {
    let allocator = CpuAllocator::new();
    allocator.free(DevicePtr::NULL).unwrap();
}

#[test]
fn test_double_free_is_reported() {
    let allocator = CpuAllocator::new();
    let ptr = allocator.alloc(2).unwrap();

    allocator.free(ptr).unwrap();
    assert_eq!(allocator.free(ptr), Err(Status::invalid_device_pointer()));
}

#[test]
fn test_copy_to_unknown_pointer_fails() {
    let allocator = CpuAllocator::new();
    let result = allocator.copy_htod(&[1.0], DevicePtr::from_raw(0xdead));
    assert_eq!(result, Err(Status::invalid_device_pointer()));
}

#[test]
fn test_oversized_copy_fails() {
    let allocator = CpuAllocator::new();
    let ptr = allocator.alloc(2).unwrap();

    assert_eq!(allocator.copy_htod(&[1.0, 2.0, 3.0], ptr), Err(Status::invalid_value()));
    let mut out = [0.0; 3];
    assert_eq!(allocator.copy_dtoh(ptr, &mut out), Err(Status::invalid_value()));
}

#[test]
fn test_capacity_limit() {
    let allocator = CpuAllocator::with_capacity(10);
    let first = allocator.alloc(6).unwrap();

    assert_eq!(allocator.alloc(5), Err(Status::out_of_memory()));

    allocator.free(first).unwrap();
    assert!(allocator.alloc(10).is_ok());
}

#[test]
fn test_with_slice_mut_writes_device_memory() {
    let allocator = CpuAllocator::new();
    let ptr = allocator.alloc(3).unwrap();

    allocator.with_slice_mut(ptr, |data| data.copy_from_slice(&[7.0, 8.0, 9.0])).unwrap();
    let mut out = [0.0; 3];
    allocator.copy_dtoh(ptr, &mut out).unwrap();

    assert_eq!(out, [7.0, 8.0, 9.0]);
}

#[test]
fn test_device_ptr_display() {
    assert_eq!(DevicePtr::from_raw(0x1f00).to_string(), "0x1f00");
    assert_eq!(DevicePtr::NULL.as_raw(), 0);
}

#[test]
fn test_unsatisfiable_alloc_reports_out_of_memory() {
    let allocator = CpuAllocator::new();

    assert_eq!(allocator.alloc(usize::MAX), Err(Status::out_of_memory()));
    assert_eq!(allocator.alloc(1 << 61), Err(Status::out_of_memory()));
    assert_eq!(allocator.live_allocations(), 0);
    assert_eq!(allocator.elements_in_use(), 0);
}
