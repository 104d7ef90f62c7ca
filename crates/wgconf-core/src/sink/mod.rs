// # Config Sink Implementations
//
// This module provides implementations of the ConfigSink trait for
// different destinations.

pub mod file;
pub mod memory;

pub use file::DirectorySink;
pub use memory::MemorySink;
