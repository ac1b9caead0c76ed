//! The dataset collection pipeline.

use crate::{
    acquire::{check_archive_url, ArchiveProvider, Extractor, HttpArchiveProvider, ZipExtractor},
    common::*,
    config::CollectConfig,
    dataset::{DataSource, DatasetMeta, PathIndexer},
    decode::{ImageCrateDecoder, ImageDecoder},
    error::ErrorKind,
};

/// The sub-directory of the data directory the archive is unpacked into.
pub const IMAGE_DIR: &str = "images";

/// Collect a dataset with the default collaborators.
pub async fn collect(config: CollectConfig) -> Result<DataSource> {
    DataCollector::new(config).collect().await
}

/// Builds a [DataSource] from a zipped image folder.
///
/// Acquisition, extraction and decoding are pluggable. The defaults download
/// over HTTP, unpack with the `zip` crate and decode with the `image` crate.
#[derive(Debug, Clone)]
pub struct DataCollector {
    config: CollectConfig,
    provider: Arc<dyn ArchiveProvider>,
    extractor: Arc<dyn Extractor>,
    decoder: Arc<dyn ImageDecoder>,
}

impl DataCollector {
    pub fn new(config: CollectConfig) -> Self {
        Self {
            config,
            provider: Arc::new(HttpArchiveProvider::new()),
            extractor: Arc::new(ZipExtractor),
            decoder: Arc::new(ImageCrateDecoder),
        }
    }

    pub fn with_provider(self, provider: impl ArchiveProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
            ..self
        }
    }

    pub fn with_extractor(self, extractor: impl Extractor + 'static) -> Self {
        Self {
            extractor: Arc::new(extractor),
            ..self
        }
    }

    pub fn with_decoder(self, decoder: Arc<dyn ImageDecoder>) -> Self {
        Self { decoder, ..self }
    }

    pub fn config(&self) -> &CollectConfig {
        &self.config
    }

    /// Fetch, unpack and index the dataset.
    ///
    /// The URL is checked before anything touches the file system.
    pub async fn collect(&self) -> Result<DataSource> {
        let Self {
            config,
            provider,
            extractor,
            decoder,
        } = self;
        let url = check_archive_url(config.url.as_deref())?;
        let data_dir = &config.data_dir;

        tokio::fs::create_dir_all(data_dir)
            .await
            .with_context(|| {
                format!("unable to create data directory '{}'", data_dir.display())
            })?;

        // fetch and unpack
        let archive = provider.resolve(url, data_dir).await?;
        let image_dir = data_dir.join(IMAGE_DIR);
        let remove_archive = archive.downloaded || !config.keep_local_archive;

        if let Err(err) = extractor.extract(&archive.path, &image_dir).await {
            if archive.downloaded {
                let _ = tokio::fs::remove_file(&archive.path).await;
            }
            return Err(err);
        }

        if remove_archive {
            tokio::fs::remove_file(&archive.path)
                .await
                .with_context(|| {
                    ErrorKind::Acquisition(format!(
                        "unable to remove archive '{}'",
                        archive.path.display()
                    ))
                })?;
            debug!("removed archive '{}'", archive.path.display());
        }

        // index images and summarize
        info!("collecting images in '{}'", image_dir.display());
        let indexer = PathIndexer::from_config(config);
        let meta_mode = config.meta_mode;
        let (index, meta) = {
            let decoder = decoder.clone();
            tokio::task::spawn_blocking(move || -> Result<_> {
                let index = indexer.index(&image_dir)?;
                let meta = DatasetMeta::build(&index, &*decoder, meta_mode)?;
                Ok((index, meta))
            })
            .await??
        };

        Ok(DataSource::new(index, meta, decoder.clone(), config.batch))
    }
}
