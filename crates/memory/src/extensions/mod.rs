//! Allocator decorators

pub mod logging;

pub use logging::{
    AllocationEvent, AllocationSink, DefaultSink, LogLevel, LoggingAllocator, Operation,
    RecordingSink, StderrSink,
};

#[cfg(feature = "logging")]
pub use logging::TracingSink;
