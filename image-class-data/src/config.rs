//! Data collection configuration format.

use crate::{common::*, dataset::Split};

/// The dataset collection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    /// Dataset archive location. Local archives are prefixed with `file://`.
    #[serde(default)]
    pub url: Option<String>,
    /// The working directory. The archive is unpacked into its `images` sub-directory.
    pub data_dir: PathBuf,
    /// If set, shuffle the discovered image paths before labels are assigned.
    #[serde(default)]
    pub shuffle_before_indexing: bool,
    /// Optional seed that makes the pre-indexing shuffle reproducible.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
    /// How the dataset summary is derived.
    #[serde(default)]
    pub meta_mode: MetaMode,
    /// End-of-sequence handling of batch reads.
    #[serde(default)]
    pub batch: BatchConfig,
    /// If set, a local `file://` archive is left in place after extraction.
    /// Downloaded archives are always deleted.
    #[serde(default)]
    pub keep_local_archive: bool,
}

impl CollectConfig {
    pub fn new(url: impl Into<String>, data_dir: impl AsRef<Path>) -> Self {
        Self {
            url: Some(url.into()),
            data_dir: data_dir.as_ref().to_owned(),
            shuffle_before_indexing: false,
            shuffle_seed: None,
            meta_mode: MetaMode::default(),
            batch: BatchConfig::default(),
            keep_local_archive: false,
        }
    }

    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = std::fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }
}

/// Controls how [DatasetMeta](crate::DatasetMeta) is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetaMode {
    /// Compatible summary: `size.test` repeats the train count and the
    /// channel count is always 3.
    Fast,
    /// `size.test` counts the test split, the channel count comes from the
    /// decoded sample, and every image header is checked for size mismatches.
    Strict,
}

impl Default for MetaMode {
    fn default() -> Self {
        Self::Fast
    }
}

/// What a batch read does with reads past the end of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbsentPolicy {
    /// Keep absent reads as `None` holes in the batch.
    Keep,
    /// Filter absent reads out, so the batch may be shorter than requested.
    Drop,
}

/// Per-split [AbsentPolicy] options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub train: AbsentPolicy,
    pub test: AbsentPolicy,
}

impl BatchConfig {
    pub fn policy(&self, split: Split) -> AbsentPolicy {
        match split {
            Split::Train => self.train,
            Split::Test => self.test,
        }
    }
}

impl Default for BatchConfig {
    // TODO: confirm with downstream trainers whether test batches should keep holes like train
    fn default() -> Self {
        Self {
            train: AbsentPolicy::Keep,
            test: AbsentPolicy::Drop,
        }
    }
}
