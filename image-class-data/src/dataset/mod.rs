//! Dataset indexing, summary and cursor iteration.

mod cursor;
mod entry;
mod indexer;
mod label_map;
mod meta;
mod source;

pub use cursor::*;
pub use entry::*;
pub use indexer::*;
pub use label_map::*;
pub use meta::*;
pub use source::*;
