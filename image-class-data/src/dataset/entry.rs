use crate::{common::*, decode::Image};

/// The dataset splits that can be iterated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Split {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let split = match text {
            "train" => Self::Train,
            "test" => Self::Test,
            _ => bail!("invalid split name '{}'", text),
        };
        Ok(split)
    }
}

/// An image path with its label, before decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabeledEntry {
    pub path: PathBuf,
    /// Index into the [LabelMap](super::LabelMap).
    pub label: usize,
}

/// A decoded image with its label.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub data: Image,
    pub label: usize,
}

/// The indexed train and test entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitPartition {
    pub train: Vec<LabeledEntry>,
    pub test: Vec<LabeledEntry>,
}

impl SplitPartition {
    pub fn entries(&self, split: Split) -> &[LabeledEntry] {
        match split {
            Split::Train => &self.train,
            Split::Test => &self.test,
        }
    }
}
