use super::*;
use crate::{common::*, config::BatchConfig, decode::ImageDecoder};

/// The collected dataset: its summary and one cursor per split.
#[derive(Debug)]
pub struct DataSource {
    meta: DatasetMeta,
    train: SplitCursor,
    test: SplitCursor,
}

impl DataSource {
    pub fn new(
        index: DatasetIndex,
        meta: DatasetMeta,
        decoder: Arc<dyn ImageDecoder>,
        batch: BatchConfig,
    ) -> Self {
        let DatasetIndex {
            partition: SplitPartition { train, test },
            ..
        } = index;

        Self {
            meta,
            train: SplitCursor::new(
                Split::Train,
                train,
                decoder.clone(),
                batch.policy(Split::Train),
            ),
            test: SplitCursor::new(Split::Test, test, decoder, batch.policy(Split::Test)),
        }
    }

    /// The summary computed at collection time.
    pub fn meta(&self) -> &DatasetMeta {
        &self.meta
    }

    pub fn label_map(&self) -> &LabelMap {
        &self.meta.label_map
    }

    pub fn train(&self) -> &SplitCursor {
        &self.train
    }

    pub fn test(&self) -> &SplitCursor {
        &self.test
    }

    pub fn split(&self, split: Split) -> &SplitCursor {
        match split {
            Split::Train => &self.train,
            Split::Test => &self.test,
        }
    }

    /// The number of indexed entries in `split`.
    pub fn len(&self, split: Split) -> usize {
        self.split(split).len()
    }
}
