//! Allocator-aware containers

mod chunk_list;

pub use chunk_list::{ChunkList, Chunks, Node};
