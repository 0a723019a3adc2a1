//! Payment-side logic: delta allocation and the capture/settle machine

pub mod allocator;
pub mod settle;

pub use allocator::{AllocationPlan, allocate};
pub use settle::{CaptureResult, capture, mirror_adjustment, settle};
