//! Byte buffers and ISO-8859-1 encoding helpers

pub mod accumulator;
pub mod iso;

pub use accumulator::ByteAccumulator;
pub use iso::Precision;
