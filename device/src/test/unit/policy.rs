use std::sync::Arc;

use test_case::test_case;

use crate::policy::abort_report;
use crate::{Allocator, CpuAllocator, DevicePtr, DeviceContext, Error, ErrorPolicy, Operation, Status};

#[test_case("propagate", ErrorPolicy::Propagate; "propagate")]
#[test_case("ABORT", ErrorPolicy::Abort; "abort_uppercase")]
#[test_case(" abort ", ErrorPolicy::Abort; "abort_padded")]
fn test_policy_parse(input: &str, expected: ErrorPolicy) {
    assert_eq!(input.parse::<ErrorPolicy>().unwrap(), expected);
}

#[test]
fn test_policy_parse_invalid() {
    let error = "retry".parse::<ErrorPolicy>().unwrap_err();
    assert!(matches!(error, Error::InvalidPolicy { value } if value == "retry"));
}

#[test]
fn test_check_passes_success_through() {
    let context = DeviceContext::cpu();
    assert_eq!(context.check(Operation::DeviceAlloc, 3, Ok(42)).unwrap(), 42);
}

#[test]
fn test_check_wraps_status() {
    let context = DeviceContext::cpu();
    let result: Result<(), Status> = Err(Status::invalid_device_pointer());

    let error = context.check(Operation::CopyDeviceToHost, 6, result).unwrap_err();
    assert!(error.is_transfer());
    assert!(!error.is_allocation());
    assert_eq!(error.to_string(), "device-to-host copy of 6 elements on CPU failed: [17] invalid device pointer");
}

#[test]
fn test_check_reports_runtime_failure() {
    let allocator = Arc::new(CpuAllocator::new());
    let context = DeviceContext::new(allocator.clone(), ErrorPolicy::Propagate);

    let bogus = DevicePtr::from_raw(0x42);
    let error = context.check(Operation::DeviceFree, 0, allocator.free(bogus)).unwrap_err();
    assert!(matches!(error, Error::Runtime { operation: Operation::DeviceFree, .. }));
}

#[test_case(0, true; "success")]
#[test_case(13, false; "execution_failed")]
#[test_case(99, false; "unknown")]
fn test_check_kernel(code: i32, ok: bool) {
    assert_eq!(ErrorPolicy::Propagate.check_kernel("dgemm", code).is_ok(), ok);
}

#[test]
fn test_kernel_error_message() {
    let error = ErrorPolicy::Propagate.check_kernel("dgeam", 7).unwrap_err();
    assert_eq!(error.to_string(), "kernel 'dgeam' failed: [7] CUBLAS_STATUS_INVALID_VALUE");

    let error = ErrorPolicy::Propagate.check_kernel("dgeam", 42).unwrap_err();
    assert_eq!(error.to_string(), "kernel 'dgeam' failed: [42] unknown error");
}

#[test]
fn test_with_policy() {
    let context = DeviceContext::cpu().with_policy(ErrorPolicy::Abort);
    assert_eq!(context.policy(), ErrorPolicy::Abort);
    assert_eq!(context.device_name(), "CPU");
}

#[test]
fn test_abort_report_names_operation_and_status() {
    let context = DeviceContext::cpu();
    let error = context.check(Operation::DeviceAlloc, 4, Err::<(), _>(Status::out_of_memory())).unwrap_err();

    assert_eq!(
        abort_report(&error),
        "dualmat: aborting after fatal error: device alloc of 4 elements on CPU failed: [2] out of memory"
    );
}
