use crate::{common::*, error::ErrorKind};

/// Unpacks a dataset archive.
pub trait Extractor
where
    Self: Debug + Send + Sync,
{
    /// Extract `archive` into `target_dir`, creating the directory if needed.
    fn extract<'a>(&'a self, archive: &'a Path, target_dir: &'a Path) -> BoxFuture<'a, Result<()>>;
}

/// Zip extraction on a blocking task.
///
/// An entry whose name escapes the target directory fails the whole extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ZipExtractor {
    fn extract_blocking(archive: &Path, target_dir: &Path) -> Result<usize> {
        fs::create_dir_all(target_dir)?;
        let file = fs::File::open(archive)
            .with_context(|| format!("unable to open '{}'", archive.display()))?;
        let mut zip = zip::ZipArchive::new(file)?;
        let num_entries = zip.len();
        zip.extract(target_dir)?;
        Ok(num_entries)
    }
}

impl Extractor for ZipExtractor {
    fn extract<'a>(&'a self, archive: &'a Path, target_dir: &'a Path) -> BoxFuture<'a, Result<()>> {
        async move {
            info!(
                "unzip '{}' into '{}'",
                archive.display(),
                target_dir.display()
            );

            let num_entries = {
                let archive = archive.to_owned();
                let target_dir = target_dir.to_owned();
                tokio::task::spawn_blocking(move || Self::extract_blocking(&archive, &target_dir))
                    .await?
            }
            .with_context(|| {
                ErrorKind::Acquisition(format!("unable to extract '{}'", archive.display()))
            })?;

            debug!("extracted {} archive entries", num_entries);
            Ok(())
        }
        .boxed()
    }
}
