//! bumpkit - fills allocator-aware containers through logged arena and heap allocators.

use std::rc::Rc;

use anyhow::{Context, Result, bail};
use bumpkit_memory::MemoryResult;
use bumpkit_memory::allocator::{ElementAllocator, HeapAllocator, Rebind, TypedAllocator};
use bumpkit_memory::arena::ArenaRegistry;
use bumpkit_memory::container::{ChunkList, Node};
use bumpkit_memory::extensions::logging::{
    AllocationSink, LogLevel, LoggingAllocator, StderrSink, TracingSink,
};
use clap::{Parser, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// `(i, i!)`
type Pair = (u32, u64);

/// Arena capacities (in elements) compiled into the binary
const SUPPORTED_CAPACITIES: [usize; 3] = [16, 64, 256];

/// bumpkit - arena allocator demo.
#[derive(Parser)]
#[command(name = "bumpkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of (i, i!) pairs to insert
    #[arg(short = 'n', long, env = "BUMPKIT_COUNT", default_value_t = 10)]
    count: u32,

    /// Arena capacity in elements (16, 64 or 256)
    #[arg(short, long, env = "BUMPKIT_CAPACITY", default_value_t = 16)]
    capacity: usize,

    /// Destination of allocator events
    #[arg(long, env = "BUMPKIT_SINK", value_enum, default_value_t = SinkKind::Tracing)]
    sink: SinkKind,

    /// Log filter directive, e.g. `info` or `bumpkit::alloc=trace`
    #[arg(long, env = "BUMPKIT_LOG", default_value = "info")]
    log_level: String,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    /// One `tracing` event per allocator call
    Tracing,
    /// One plain line per allocator call on stderr
    Stderr,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.sink {
        SinkKind::Tracing => dispatch(&cli, TracingSink::new(LogLevel::Info)),
        SinkKind::Stderr => dispatch(&cli, StderrSink),
    }
}

fn init_tracing(directive: &str) -> Result<()> {
    let filter = EnvFilter::try_new(directive)
        .with_context(|| format!("invalid log filter `{directive}`"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Maps the runtime capacity onto one of the compiled-in presets
fn dispatch<S: AllocationSink>(cli: &Cli, sink: S) -> Result<()> {
    match cli.capacity {
        16 => run::<16, S>(cli.count, sink),
        64 => run::<64, S>(cli.count, sink),
        256 => run::<256, S>(cli.count, sink),
        other => bail!("unsupported capacity {other}: choose one of {SUPPORTED_CAPACITIES:?}"),
    }
}

fn run<const CAP: usize, S: AllocationSink>(count: u32, sink: S) -> Result<()> {
    let registry = Rc::new(ArenaRegistry::new());

    let typed_result = {
        let alloc =
            LoggingAllocator::new(TypedAllocator::<Pair, CAP>::new_in(&registry), sink.clone());
        let mut list = ChunkList::new_in(alloc);
        let filled = fill(&mut list, count);
        print_pairs("typed", &list);
        for binding in registry.bindings() {
            info!(%binding, "arena usage");
        }
        filled
    };
    for binding in registry.bindings() {
        debug!(%binding, "arena usage after release");
    }

    let alloc = LoggingAllocator::new(HeapAllocator::<Pair>::new(), sink);
    let mut list = ChunkList::new_in(alloc);
    fill(&mut list, count).context("heap allocator run failed")?;
    print_pairs("heap", &list);

    typed_result.with_context(|| {
        format!("typed allocator run stopped: the {CAP}-element arena is exhausted")
    })
}

fn fill<A>(list: &mut ChunkList<Pair, A>, count: u32) -> MemoryResult<()>
where
    A: ElementAllocator<Element = Pair> + Rebind<Node<Pair>>,
{
    for i in 0..count {
        list.push((i, factorial(i)))?;
    }
    Ok(())
}

fn print_pairs<A>(label: &str, list: &ChunkList<Pair, A>)
where
    A: ElementAllocator<Element = Pair> + Rebind<Node<Pair>>,
{
    for (i, value) in list {
        println!("{label} {i}! = {value}");
    }
}

/// `n!`, saturating at `u64::MAX`
fn factorial(n: u32) -> u64 {
    (1..=u64::from(n)).fold(1, u64::saturating_mul)
}
