//! Logging decorator for element allocators
//!
//! [`LoggingAllocator`] wraps any [`ElementAllocator`] and reports every call to an
//! [`AllocationSink`] before forwarding it. Results, failures and equality are those
//! of the wrapped allocator.
//!
//! Available sinks:
//! - [`TracingSink`]: one `tracing` event per call (feature `logging`, the default sink);
//!   falls back to stderr on threads with no subscriber
//! - [`StderrSink`]: one line per call on stderr
//! - [`RecordingSink`]: keeps events in memory

use core::any::type_name;
use core::cell::RefCell;
use core::fmt;
use core::ptr::NonNull;
use std::rc::Rc;

use crate::allocator::{ElementAllocator, Rebind};
use crate::error::MemoryResult;

/// Target used by [`TracingSink`] events
pub const LOG_TARGET: &str = "bumpkit::alloc";

/// Log level for allocator events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Trace-level details (very verbose)
    Trace,
    /// Debug information
    Debug,
    /// Informational messages
    #[default]
    Info,
    /// Warnings (non-critical issues)
    Warn,
    /// Errors (critical issues)
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace => write!(f, "TRACE"),
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

#[cfg(feature = "logging")]
impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Allocator entry point that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Allocate,
    TryAllocate,
    Deallocate,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allocate => "allocate",
            Self::TryAllocate => "try_allocate",
            Self::Deallocate => "deallocate",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One intercepted allocator call
///
/// Displays as `allocate<i32>[n = 3]`. The format is meant for humans and may change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationEvent {
    pub operation: Operation,
    /// Element type name, as reported by `core::any::type_name`
    pub element: &'static str,
    /// Element count of the call
    pub count: usize,
}

impl AllocationEvent {
    /// Event for a call on an allocator of `T`
    pub fn new<T>(operation: Operation, count: usize) -> Self {
        Self {
            operation,
            element: type_name::<T>(),
            count,
        }
    }
}

impl fmt::Display for AllocationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}>[n = {}]", self.operation, self.element, self.count)
    }
}

/// Destination for allocation events
///
/// Sinks are cloned when a logging allocator is rebound, so every allocator derived
/// from one logging allocator reports to the same destination.
pub trait AllocationSink: Clone {
    /// Records one event
    fn record(&self, event: &AllocationEvent);
}

/// Emits each event through `tracing` under [`LOG_TARGET`]
///
/// When the current thread has no subscriber the event would vanish, so it is
/// written to stderr like [`StderrSink`] does instead.
#[cfg(feature = "logging")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TracingSink {
    level: LogLevel,
}

#[cfg(feature = "logging")]
impl TracingSink {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Returns `true` if a subscriber is installed for the current thread
    pub fn is_listening() -> bool {
        !tracing::dispatcher::get_default(|dispatch| {
            dispatch.is::<tracing::subscriber::NoSubscriber>()
        })
    }
}

#[cfg(feature = "logging")]
impl AllocationSink for TracingSink {
    fn record(&self, event: &AllocationEvent) {
        if !Self::is_listening() {
            StderrSink.record(event);
            return;
        }

        // The level of a tracing event must be a constant.
        macro_rules! emit {
            ($level:expr) => {
                tracing::event!(
                    target: LOG_TARGET,
                    $level,
                    operation = event.operation.as_str(),
                    element = event.element,
                    count = event.count,
                    "{event}"
                )
            };
        }

        match self.level {
            LogLevel::Trace => emit!(tracing::Level::TRACE),
            LogLevel::Debug => emit!(tracing::Level::DEBUG),
            LogLevel::Info => emit!(tracing::Level::INFO),
            LogLevel::Warn => emit!(tracing::Level::WARN),
            LogLevel::Error => emit!(tracing::Level::ERROR),
        }
    }
}

/// Writes each event as one line on stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StderrSink;

impl AllocationSink for StderrSink {
    fn record(&self, event: &AllocationEvent) {
        eprintln!("{event}");
    }
}

/// Keeps events in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<AllocationEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event recorded so far, oldest first
    pub fn events(&self) -> Vec<AllocationEvent> {
        self.events.borrow().clone()
    }

    /// Recorded events rendered with `Display`
    pub fn lines(&self) -> Vec<String> {
        self.events.borrow().iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Removes and returns all recorded events
    pub fn take(&self) -> Vec<AllocationEvent> {
        self.events.take()
    }
}

impl AllocationSink for RecordingSink {
    fn record(&self, event: &AllocationEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Sink used when none is named: `tracing` when available, stderr otherwise
///
/// With the `logging` feature this is [`TracingSink`], which itself falls back to
/// stderr until a subscriber is installed.
#[cfg(feature = "logging")]
pub type DefaultSink = TracingSink;

/// Sink used when none is named: `tracing` when available, stderr otherwise
#[cfg(not(feature = "logging"))]
pub type DefaultSink = StderrSink;

/// Allocator decorator that reports each call before delegating it
///
/// ```rust
/// use bumpkit_memory::allocator::{ElementAllocator, HeapAllocator};
/// use bumpkit_memory::extensions::logging::{LoggingAllocator, RecordingSink};
///
/// let sink = RecordingSink::new();
/// let alloc = LoggingAllocator::new(HeapAllocator::<i32>::new(), sink.clone());
/// let ptr = alloc.allocate(3)?;
/// unsafe { alloc.deallocate(ptr, 3) };
/// assert_eq!(sink.lines(), ["allocate<i32>[n = 3]", "deallocate<i32>[n = 3]"]);
/// # Ok::<(), bumpkit_memory::MemoryError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct LoggingAllocator<A, S = DefaultSink> {
    inner: A,
    sink: S,
}

impl<A, S> LoggingAllocator<A, S> {
    /// Wraps `inner`, reporting to `sink`
    pub fn new(inner: A, sink: S) -> Self {
        Self { inner, sink }
    }

    /// Wraps a default-constructed inner allocator
    pub fn with_sink(sink: S) -> Self
    where
        A: Default,
    {
        Self::new(A::default(), sink)
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Unwraps the decorated allocator
    pub fn into_inner(self) -> A {
        self.inner
    }
}

impl<A> LoggingAllocator<A, DefaultSink> {
    /// Wraps `inner`, reporting to the default sink
    pub fn wrap(inner: A) -> Self {
        Self::new(inner, DefaultSink::default())
    }
}

impl<A, S> LoggingAllocator<A, S>
where
    A: ElementAllocator,
    S: AllocationSink,
{
    fn emit(&self, operation: Operation, count: usize) {
        self.sink
            .record(&AllocationEvent::new::<A::Element>(operation, count));
    }
}

impl<A, S> ElementAllocator for LoggingAllocator<A, S>
where
    A: ElementAllocator,
    S: AllocationSink,
{
    type Element = A::Element;

    fn allocate(&self, n: usize) -> MemoryResult<NonNull<A::Element>> {
        self.emit(Operation::Allocate, n);
        self.inner.allocate(n)
    }

    fn try_allocate(&self, n: usize) -> Option<NonNull<A::Element>> {
        self.emit(Operation::TryAllocate, n);
        self.inner.try_allocate(n)
    }

    unsafe fn deallocate(&self, ptr: NonNull<A::Element>, n: usize) {
        self.emit(Operation::Deallocate, n);
        // SAFETY: forwarded unchanged; the caller upholds the inner allocator's contract.
        unsafe { self.inner.deallocate(ptr, n) };
    }
}

impl<A, S, U> Rebind<U> for LoggingAllocator<A, S>
where
    A: Rebind<U>,
    S: AllocationSink,
{
    type Output = LoggingAllocator<A::Output, S>;

    fn rebind(&self) -> Self::Output {
        LoggingAllocator::new(self.inner.rebind(), self.sink.clone())
    }
}

impl<A, B, S, T> PartialEq<LoggingAllocator<B, T>> for LoggingAllocator<A, S>
where
    A: PartialEq<B>,
{
    fn eq(&self, other: &LoggingAllocator<B, T>) -> bool {
        self.inner == other.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{HeapAllocator, TypedAllocator};
    use crate::arena::ArenaRegistry;

    #[test]
    fn event_display() {
        let event = AllocationEvent::new::<i32>(Operation::Allocate, 3);
        assert_eq!(event.to_string(), "allocate<i32>[n = 3]");
        assert_eq!(
            AllocationEvent::new::<u8>(Operation::TryAllocate, 0).to_string(),
            "try_allocate<u8>[n = 0]"
        );
    }

    #[test]
    fn level_display_and_order() {
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
        assert!(LogLevel::Trace < LogLevel::Error);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn records_before_delegating_failures() {
        let registry = Rc::new(ArenaRegistry::new());
        let sink = RecordingSink::new();
        let alloc =
            LoggingAllocator::new(TypedAllocator::<u32, 2>::new_in(&registry), sink.clone());

        assert!(alloc.allocate(3).is_err());
        assert!(alloc.try_allocate(3).is_none());
        assert_eq!(
            sink.lines(),
            ["allocate<u32>[n = 3]", "try_allocate<u32>[n = 3]"]
        );
    }

    #[test]
    fn rebind_shares_sink() {
        let sink = RecordingSink::new();
        let ints = LoggingAllocator::new(HeapAllocator::<i32>::new(), sink.clone());
        let bytes: LoggingAllocator<HeapAllocator<u8>, _> = Rebind::<u8>::rebind(&ints);

        let ptr = bytes.allocate(2).unwrap();
        unsafe { bytes.deallocate(ptr, 2) };
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.take()[0].element, "u8");
        assert!(sink.is_empty());
    }

    #[test]
    fn equality_follows_inner() {
        let heap = LoggingAllocator::new(HeapAllocator::<i32>::new(), StderrSink);
        assert!(heap == heap.clone());

        let registry = Rc::new(ArenaRegistry::new());
        let typed = LoggingAllocator::new(TypedAllocator::<i32, 4>::new_in(&registry), StderrSink);
        assert!(typed != typed.clone());
    }

    #[cfg(feature = "logging")]
    #[test]
    fn tracing_sink_level() {
        let sink = TracingSink::new(LogLevel::Debug);
        assert_eq!(sink.level(), LogLevel::Debug);
        assert_eq!(tracing::Level::from(LogLevel::Debug), tracing::Level::DEBUG);
        // No subscriber installed: the event goes to stderr.
        sink.record(&AllocationEvent::new::<u8>(Operation::Deallocate, 1));
    }

    #[cfg(feature = "logging")]
    #[test]
    fn tracing_sink_detects_subscriber() {
        assert!(!TracingSink::is_listening());

        let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
        tracing::subscriber::with_default(subscriber, || {
            assert!(TracingSink::is_listening());
            let alloc = LoggingAllocator::wrap(HeapAllocator::<u8>::new());
            let ptr = alloc.allocate(1).unwrap();
            unsafe { alloc.deallocate(ptr, 1) };
        });

        assert!(!TracingSink::is_listening());
    }
}
