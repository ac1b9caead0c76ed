use super::*;
use crate::{common::*, config::AbsentPolicy, decode::ImageDecoder, error::ErrorKind};

/// Read position over the entries of one split.
///
/// `next` and `next_batch` advance the offset, even past the end, and decode
/// images on demand. Reads beyond the end yield `None`. The offset is atomic,
/// so concurrent reads never lose increments, but all holders of the same
/// cursor share one position. Use [SplitCursor::detached] to get a private one.
#[derive(Debug)]
pub struct SplitCursor {
    split: Split,
    entries: Arc<[LabeledEntry]>,
    offset: AtomicUsize,
    decoder: Arc<dyn ImageDecoder>,
    absent_policy: AbsentPolicy,
}

impl SplitCursor {
    pub fn new(
        split: Split,
        entries: impl Into<Arc<[LabeledEntry]>>,
        decoder: Arc<dyn ImageDecoder>,
        absent_policy: AbsentPolicy,
    ) -> Self {
        Self {
            split,
            entries: entries.into(),
            offset: AtomicUsize::new(0),
            decoder,
            absent_policy,
        }
    }

    /// Create an independent cursor at offset 0 over the same entries.
    pub fn detached(&self) -> Self {
        Self {
            split: self.split,
            entries: self.entries.clone(),
            offset: AtomicUsize::new(0),
            decoder: self.decoder.clone(),
            absent_policy: self.absent_policy,
        }
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn entries(&self) -> &[LabeledEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn absent_policy(&self) -> AbsentPolicy {
        self.absent_policy
    }

    /// The offset of the next read. It may exceed the number of entries.
    pub fn position(&self) -> usize {
        self.offset.load(Ordering::SeqCst)
    }

    /// Move the offset to `pos`. Out-of-range positions are accepted.
    pub fn seek(&self, pos: usize) {
        debug!("seek {} cursor to {}", self.split, pos);
        self.offset.store(pos, Ordering::SeqCst);
    }

    /// Read the sample at the offset and advance the offset by one.
    pub async fn next(&self) -> Result<Option<Sample>> {
        let start = self.advance(1);
        self.nth(start).await
    }

    /// Read `size` samples starting at the offset and advance the offset by `size`.
    ///
    /// All decodes are dispatched before any of them is awaited and results
    /// keep the read order. Reads past the end are kept as `None` or dropped
    /// according to the cursor's [AbsentPolicy]. Any decode failure fails
    /// the whole batch.
    pub async fn next_batch(&self, size: usize) -> Result<Vec<Option<Sample>>> {
        let start = self.advance(size);
        debug!("read {} batch of {} from offset {}", self.split, size, start);

        let loads: Vec<_> = (0..size)
            .map(|step| match start.checked_add(step) {
                Some(index) => self.nth(index),
                None => future::ready(Ok(None)).boxed(),
            })
            .collect();
        let samples = future::try_join_all(loads).await?;

        let samples = match self.absent_policy {
            AbsentPolicy::Keep => samples,
            AbsentPolicy::Drop => samples.into_iter().filter(Option::is_some).collect(),
        };
        Ok(samples)
    }

    /// Decode the entry at `index` without touching the offset.
    ///
    /// Decoding starts on a blocking task as soon as this is called.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime while `index` is in range.
    /// Out-of-range reads resolve to `None` without spawning a task.
    pub fn nth(&self, index: usize) -> BoxFuture<'static, Result<Option<Sample>>> {
        let LabeledEntry { path, label } = match self.entries.get(index) {
            Some(entry) => entry.clone(),
            None => return future::ready(Ok(None)).boxed(),
        };
        let decoder = self.decoder.clone();

        let handle = {
            let path = path.clone();
            tokio::task::spawn_blocking(move || -> Result<_> {
                let data = decoder
                    .decode(&path)
                    .with_context(|| ErrorKind::Decode(path.clone()))?;
                Ok(Sample { data, label })
            })
        };

        async move {
            let sample = handle
                .await
                .with_context(|| ErrorKind::Decode(path.clone()))??;
            Ok(Some(sample))
        }
        .boxed()
    }

    /// Reserve `count` offsets and return the first one.
    fn advance(&self, count: usize) -> usize {
        let result = self
            .offset
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |offset| {
                Some(offset.saturating_add(count))
            });
        match result {
            Ok(prev) | Err(prev) => prev,
        }
    }
}
