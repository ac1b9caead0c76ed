//! Archive acquisition: locating, downloading and unpacking the dataset.

mod extractor;
mod provider;

pub use extractor::*;
pub use provider::*;
