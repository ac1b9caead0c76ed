//! Image classification data source backed by a zipped dataset folder.
//!
//! The archive is expected to contain `train`, `test` and optionally
//! `validation` directories, each holding one sub-directory per category.
//! [collect] fetches and unpacks the archive, indexes the images and
//! returns a [DataSource] with per-split cursors.

mod common;

pub mod acquire;
pub mod collect;
pub mod config;
pub mod dataset;
pub mod decode;
pub mod error;

pub use collect::{collect, DataCollector};
pub use config::{AbsentPolicy, BatchConfig, CollectConfig, MetaMode};
pub use dataset::{
    DataSource, DataSourceType, DatasetIndex, DatasetMeta, Dimension, LabelMap, LabeledEntry,
    PathIndexer, Sample, Split, SplitCursor, SplitPartition, SplitSize,
};
pub use decode::{Image, ImageCrateDecoder, ImageDecoder};
pub use error::ErrorKind;
