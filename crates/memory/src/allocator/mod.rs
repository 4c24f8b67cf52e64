//! Element allocators
//!
//! - [`ElementAllocator`] / [`Rebind`]: the protocol containers depend on
//! - [`TypedAllocator`]: arena-backed, one arena per `(element type, capacity)`
//! - [`HeapAllocator`]: global-heap backed, all instances interchangeable
//!
//! Decorators such as [`LoggingAllocator`](crate::extensions::logging::LoggingAllocator)
//! implement the same protocol and can wrap either.

mod heap;
mod traits;
mod typed;

pub use heap::HeapAllocator;
pub use traits::{ElementAllocator, Rebind};
pub use typed::TypedAllocator;
