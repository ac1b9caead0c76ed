use super::*;
use crate::{common::*, config::MetaMode, decode::ImageDecoder, error::ErrorKind};

/// The kind of data served by a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSourceType {
    Image,
}

/// Number of samples per split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSize {
    pub train: usize,
    pub test: usize,
}

/// Image dimension: width, height and channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

/// Summary of an indexed dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMeta {
    #[serde(rename = "type")]
    pub kind: DataSourceType,
    pub size: SplitSize,
    pub dimension: Dimension,
    pub label_map: LabelMap,
}

/// The channel count reported in [MetaMode::Fast].
pub const ASSUMED_CHANNELS: usize = 3;

impl DatasetMeta {
    /// Build the summary from the index, decoding the first training image.
    ///
    /// In [MetaMode::Fast], `size.test` repeats the train count and the
    /// channel count is [ASSUMED_CHANNELS]. [MetaMode::Strict] reports the
    /// real values and warns about images whose size differs from the first one.
    pub fn build(index: &DatasetIndex, decoder: &dyn ImageDecoder, mode: MetaMode) -> Result<Self> {
        let DatasetIndex {
            partition,
            label_map,
        } = index;

        let first = partition
            .train
            .first()
            .ok_or_else(|| ErrorKind::EmptyDataset(PathBuf::new()))?;
        let sample = decoder
            .decode(&first.path)
            .with_context(|| ErrorKind::Decode(first.path.clone()))?;

        let (size, channels) = match mode {
            MetaMode::Fast => {
                let size = SplitSize {
                    train: partition.train.len(),
                    test: partition.train.len(),
                };
                (size, ASSUMED_CHANNELS)
            }
            MetaMode::Strict => {
                let size = SplitSize {
                    train: partition.train.len(),
                    test: partition.test.len(),
                };
                let mismatches = report_size_mismatches(partition, sample.width, sample.height);
                if mismatches > 0 {
                    warn!(
                        "{} images differ from the {}x{} size of the first training image",
                        mismatches, sample.width, sample.height
                    );
                }
                (size, sample.channels)
            }
        };

        Ok(Self {
            kind: DataSourceType::Image,
            size,
            dimension: Dimension {
                x: sample.width,
                y: sample.height,
                z: channels,
            },
            label_map: label_map.clone(),
        })
    }
}

/// Read image headers and warn on sizes that differ from `width` x `height`.
///
/// Returns the number of mismatching or unreadable images.
fn report_size_mismatches(partition: &SplitPartition, width: usize, height: usize) -> usize {
    Split::ALL
        .iter()
        .flat_map(|&split| partition.entries(split))
        .filter(|entry| match imagesize::size(&entry.path) {
            Ok(imagesize::ImageSize {
                width: w,
                height: h,
            }) if (w, h) == (width, height) => false,
            Ok(imagesize::ImageSize {
                width: w,
                height: h,
            }) => {
                warn!(
                    "image '{}' is {}x{}, expect {}x{}",
                    entry.path.display(),
                    w,
                    h,
                    width,
                    height
                );
                true
            }
            Err(err) => {
                warn!(
                    "unable to read size of image '{}': {:?}",
                    entry.path.display(),
                    err
                );
                true
            }
        })
        .count()
}
