use anyhow::Result;
use futures::future::{BoxFuture, FutureExt as _};
use image_class_data::{
    acquire::{ArchiveProvider, ResolvedArchive},
    collect, AbsentPolicy, CollectConfig, DataCollector, Dimension, ErrorKind, Image,
    ImageCrateDecoder, ImageDecoder, MetaMode, SplitSize,
};
use std::{
    fs,
    io::Write as _,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

/// Write a zip archive with solid-color images of the given sizes.
///
/// Entries without an image extension are written as plain text.
fn write_dataset_zip(path: &Path, files: &[(&str, u32, u32)]) {
    let scratch = tempfile::tempdir().unwrap();
    let mut writer = zip::ZipWriter::new(fs::File::create(path).unwrap());

    for &(name, width, height) in files {
        let content = match Path::new(name).extension().and_then(|ext| ext.to_str()) {
            Some("jpg" | "jpeg" | "png") => {
                let image_path = scratch.path().join(name.replace('/', "_"));
                image::RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]))
                    .save(&image_path)
                    .unwrap();
                fs::read(&image_path).unwrap()
            }
            _ => b"not an image".to_vec(),
        };

        writer
            .start_file(name, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(&content).unwrap();
    }

    writer.finish().unwrap();
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// The archive of the documented cat/dog scenario.
fn cat_dog_archive(dir: &Path) -> PathBuf {
    let archive = dir.join("cat_dog.zip");
    write_dataset_zip(
        &archive,
        &[
            ("train/cat/a.jpg", 6, 4),
            ("train/dog/b.jpg", 6, 4),
            ("test/cat/c.jpg", 6, 4),
        ],
    );
    archive
}

#[derive(Debug, Default)]
struct CountingDecoder {
    count: AtomicUsize,
}

impl ImageDecoder for CountingDecoder {
    fn decode(&self, path: &Path) -> Result<Image> {
        self.count.fetch_add(1, Ordering::SeqCst);
        ImageCrateDecoder.decode(path)
    }
}

#[tokio::test]
async fn cat_dog_scenario() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let archive = cat_dog_archive(dir.path());
    let config = CollectConfig::new(file_url(&archive), dir.path().join("work"));

    let source = collect(config).await?;
    let meta = source.meta();

    assert_eq!(meta.label_map.iter().collect::<Vec<_>>(), ["cat", "dog"]);
    assert_eq!(meta.dimension, Dimension { x: 6, y: 4, z: 3 });

    let train: Vec<_> = source.train().entries().iter().collect();
    assert_eq!(train.len(), 2);
    assert!(train[0].path.ends_with("train/cat/a.jpg"));
    assert_eq!(train[0].label, 0);
    assert!(train[1].path.ends_with("train/dog/b.jpg"));
    assert_eq!(train[1].label, 1);

    let test = source.test().entries();
    assert_eq!(test.len(), 1);
    assert!(test[0].path.ends_with("test/cat/c.jpg"));
    assert_eq!(test[0].label, 0);

    let first = source.train().next().await?.unwrap();
    assert_eq!(first.label, 0);
    assert_eq!((first.data.width, first.data.height), (6, 4));

    assert!(source.test().next().await?.is_some());
    assert!(source.test().next().await?.is_none());
    assert!(source.test().next().await?.is_none());

    // the archive is removed once unpacked
    assert!(!archive.exists());
    assert!(dir.path().join("work/images/train/cat/a.jpg").is_file());
    Ok(())
}

/// `size.test` repeats the train count in the default mode. Switching to
/// the real test count must be an explicit choice of `MetaMode::Strict`.
#[tokio::test]
async fn fast_meta_reports_train_count_as_test_size() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let archive = cat_dog_archive(dir.path());
    let config = CollectConfig::new(file_url(&archive), dir.path().join("work"));

    let source = collect(config).await?;
    let size = source.meta().size;

    assert_eq!(size.train, source.train().len());
    assert_eq!(size.test, source.train().len());
    assert_eq!(size, SplitSize { train: 2, test: 2 });
    Ok(())
}

#[tokio::test]
async fn strict_meta_reports_real_counts() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let archive = cat_dog_archive(dir.path());
    let config = CollectConfig {
        meta_mode: MetaMode::Strict,
        ..CollectConfig::new(file_url(&archive), dir.path().join("work"))
    };

    let source = collect(config).await?;
    assert_eq!(source.meta().size, SplitSize { train: 2, test: 1 });
    assert_eq!(source.meta().dimension.z, 3);
    Ok(())
}

#[tokio::test]
async fn labels_match_category_positions() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let archive = dir.path().join("flowers.zip");
    write_dataset_zip(
        &archive,
        &[
            ("flowers/train/tulip/1.png", 3, 3),
            ("flowers/train/rose/2.png", 3, 3),
            ("flowers/train/daisy/3.jpeg", 3, 3),
            ("flowers/test/rose/4.png", 3, 3),
            ("flowers/test/lily/5.jpg", 3, 3),
            ("flowers/validation/orchid/6.jpg", 3, 3),
            ("flowers/train/tulip/notes.txt", 3, 3),
        ],
    );
    let config = CollectConfig::new(file_url(&archive), dir.path().join("work"));
    let source = collect(config).await?;
    let label_map = source.label_map();

    // every name appears once
    let names: Vec<_> = label_map.iter().collect();
    let mut unique = names.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(names.len(), unique.len());

    for cursor in [source.train(), source.test()] {
        for entry in cursor.entries() {
            let category = entry
                .path
                .parent()
                .unwrap()
                .file_name()
                .unwrap()
                .to_str()
                .unwrap();
            assert_eq!(label_map.label_of(category), Some(entry.label));
        }
    }

    assert_eq!(source.train().len(), 3);
    assert_eq!(source.test().len(), 2);
    Ok(())
}

#[tokio::test]
async fn batch_reads_keep_train_holes_and_drop_test_holes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let archive = cat_dog_archive(dir.path());
    let config = CollectConfig::new(file_url(&archive), dir.path().join("work"));
    let source = collect(config).await?;

    let batch = source.train().next_batch(3).await?;
    assert_eq!(batch.len(), 3);
    assert!(batch[0].is_some());
    assert!(batch[1].is_some());
    assert!(batch[2].is_none());

    let batch = source.test().next_batch(3).await?;
    assert_eq!(batch.len(), 1);
    assert!(batch.iter().all(Option::is_some));

    source.train().seek(0);
    let batch = source.train().next_batch(1).await?;
    assert_eq!(batch[0].as_ref().unwrap().label, 0);
    Ok(())
}

#[tokio::test]
async fn absent_policies_are_configurable() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let archive = cat_dog_archive(dir.path());
    let mut config = CollectConfig::new(file_url(&archive), dir.path().join("work"));
    config.batch.train = AbsentPolicy::Drop;
    config.batch.test = AbsentPolicy::Keep;
    let source = collect(config).await?;

    assert_eq!(source.train().next_batch(4).await?.len(), 2);
    assert_eq!(source.test().next_batch(4).await?.len(), 4);
    Ok(())
}

#[tokio::test]
async fn empty_train_split_is_rejected_without_decoding() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let archive = dir.path().join("test_only.zip");
    write_dataset_zip(&archive, &[("test/cat/a.jpg", 2, 2)]);
    let decoder = Arc::new(CountingDecoder::default());

    let error = DataCollector::new(CollectConfig::new(
        file_url(&archive),
        dir.path().join("work"),
    ))
    .with_decoder(decoder.clone())
    .collect()
    .await
    .unwrap_err();

    assert!(ErrorKind::of(&error).unwrap().is_empty_dataset());
    assert_eq!(decoder.count.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn collection_decodes_only_first_train_image() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let archive = cat_dog_archive(dir.path());
    let decoder = Arc::new(CountingDecoder::default());

    let source = DataCollector::new(CollectConfig::new(
        file_url(&archive),
        dir.path().join("work"),
    ))
    .with_decoder(decoder.clone())
    .collect()
    .await?;
    assert_eq!(decoder.count.load(Ordering::SeqCst), 1);

    source.test().next_batch(2).await?;
    assert_eq!(decoder.count.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn invalid_urls_fail_before_any_io() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("work");

    for url in [None, Some("file:///tmp/data.tar.gz".to_string())] {
        let config = CollectConfig {
            url,
            ..CollectConfig::new("", &data_dir)
        };
        let error = collect(config).await.unwrap_err();
        assert!(ErrorKind::of(&error).unwrap().is_configuration());
    }

    assert!(!data_dir.exists());
}

#[tokio::test]
async fn missing_local_archive_is_an_acquisition_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = CollectConfig::new(
        file_url(&dir.path().join("missing.zip")),
        dir.path().join("work"),
    );

    let error = collect(config).await.unwrap_err();
    assert!(ErrorKind::of(&error).unwrap().is_acquisition());
}

#[tokio::test]
async fn local_archive_is_kept_on_request() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let archive = cat_dog_archive(dir.path());
    let config = CollectConfig {
        keep_local_archive: true,
        ..CollectConfig::new(file_url(&archive), dir.path().join("work"))
    };

    collect(config).await?;
    assert!(archive.is_file());
    assert!(dir.path().join("work/images/train/cat/a.jpg").is_file());
    Ok(())
}

#[tokio::test]
async fn seeded_shuffle_gives_stable_labels() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let archive = dir.path().join("many.zip");
    let names: Vec<_> = (0..12)
        .map(|index| format!("train/class{}/{}.png", index % 4, index))
        .collect();
    let files: Vec<_> = names.iter().map(|name| (name.as_str(), 2, 2)).collect();
    write_dataset_zip(&archive, &files);

    let mut label_maps = vec![];
    for run in 0..2 {
        let config = CollectConfig {
            shuffle_before_indexing: true,
            shuffle_seed: Some(1234),
            keep_local_archive: true,
            ..CollectConfig::new(file_url(&archive), dir.path().join(format!("work{}", run)))
        };
        let source = collect(config).await?;
        let entries: Vec<_> = source
            .train()
            .entries()
            .iter()
            .map(|entry| {
                let name = entry.path.file_name().unwrap().to_owned();
                (name, entry.label)
            })
            .collect();
        label_maps.push((source.label_map().clone(), entries));
    }

    assert_eq!(label_maps[0], label_maps[1]);
    assert_eq!(label_maps[0].0.len(), 4);
    Ok(())
}

#[tokio::test]
async fn corrupted_image_fails_its_batch() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let archive = dir.path().join("broken.zip");
    {
        let mut writer = zip::ZipWriter::new(fs::File::create(&archive)?);
        let options = zip::write::FileOptions::default();
        let scratch = dir.path().join("ok.png");
        image::RgbImage::new(2, 2).save(&scratch)?;

        writer.start_file("train/cat/a.png", options)?;
        writer.write_all(&fs::read(&scratch)?)?;
        writer.start_file("train/cat/b.png", options)?;
        writer.write_all(b"garbage")?;
        writer.finish()?;
    }
    let config = CollectConfig::new(file_url(&archive), dir.path().join("work"));
    let source = collect(config).await?;

    let error = source.train().next_batch(2).await.unwrap_err();
    let kind = ErrorKind::of(&error).unwrap();
    assert!(kind.is_decode());

    source.train().seek(0);
    assert!(source.train().next().await?.is_some());
    assert!(source.train().next().await.is_err());
    Ok(())
}

/// Places a broken archive in the destination as if it was downloaded.
#[derive(Debug)]
struct BrokenDownloadProvider;

impl ArchiveProvider for BrokenDownloadProvider {
    fn resolve<'a>(
        &'a self,
        _url: &'a str,
        dest_dir: &'a Path,
    ) -> BoxFuture<'a, Result<ResolvedArchive>> {
        async move {
            let path = dest_dir.join("download.zip");
            tokio::fs::write(&path, b"truncated").await?;
            Ok(ResolvedArchive {
                path,
                downloaded: true,
            })
        }
        .boxed()
    }
}

#[tokio::test]
async fn failed_extraction_removes_downloaded_archive() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("work");
    let config = CollectConfig::new("https://example.com/data.zip", &data_dir);

    let error = DataCollector::new(config)
        .with_provider(BrokenDownloadProvider)
        .collect()
        .await
        .unwrap_err();

    assert!(ErrorKind::of(&error).unwrap().is_acquisition());
    assert!(!data_dir.join("download.zip").exists());
}

#[tokio::test]
async fn failed_extraction_keeps_local_archive() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("broken.zip");
    fs::write(&archive, b"truncated").unwrap();
    let config = CollectConfig::new(file_url(&archive), dir.path().join("work"));

    let error = collect(config).await.unwrap_err();
    assert!(ErrorKind::of(&error).unwrap().is_acquisition());
    assert!(archive.is_file());
}
