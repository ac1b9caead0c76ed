use crate::{common::*, error::ErrorKind};
use tokio::io::AsyncWriteExt as _;

/// URL prefix of archives on the local file system.
pub const FILE_URL_PREFIX: &str = "file://";

/// A dataset archive available on the local file system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArchive {
    pub path: PathBuf,
    /// Set if the archive was downloaded into the destination directory.
    pub downloaded: bool,
}

/// Makes a dataset archive available locally.
pub trait ArchiveProvider
where
    Self: Debug + Send + Sync,
{
    /// Resolve `url` to a local zip file. Remote archives are saved into `dest_dir`.
    fn resolve<'a>(
        &'a self,
        url: &'a str,
        dest_dir: &'a Path,
    ) -> BoxFuture<'a, Result<ResolvedArchive>>;
}

/// Check that the dataset URL is present and names a zip file.
///
/// The extension is taken from the last path segment with any query or
/// fragment removed, and must be exactly `zip`.
pub fn check_archive_url(url: Option<&str>) -> Result<&str> {
    let url = match url {
        Some(url) if !url.trim().is_empty() => url,
        _ => bail!(ErrorKind::Configuration(
            "please specify the url of your dataset".into()
        )),
    };

    let path = url.split(|c| c == '?' || c == '#').next().unwrap_or(url);
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let extension = file_name.rsplit('.').next().unwrap_or(file_name);

    if file_name == extension || extension != "zip" {
        bail!(ErrorKind::Configuration(format!(
            "the dataset provided should be a zip file, but get '{}'",
            url
        )));
    }

    Ok(url)
}

/// Return the local path if the URL has the `file://` prefix.
pub fn local_archive_path(url: &str) -> Option<&Path> {
    url.strip_prefix(FILE_URL_PREFIX).map(Path::new)
}

/// Resolves `file://` URLs in place and downloads anything else over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpArchiveProvider {
    client: reqwest::Client,
}

impl HttpArchiveProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn download(&self, url: &str, path: &Path) -> Result<u64> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;
        let mut file = tokio::fs::File::create(path).await?;
        let mut num_bytes = 0;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            num_bytes += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(num_bytes)
    }
}

impl ArchiveProvider for HttpArchiveProvider {
    fn resolve<'a>(
        &'a self,
        url: &'a str,
        dest_dir: &'a Path,
    ) -> BoxFuture<'a, Result<ResolvedArchive>> {
        async move {
            if let Some(path) = local_archive_path(url) {
                return Ok(ResolvedArchive {
                    path: path.to_owned(),
                    downloaded: false,
                });
            }

            info!("downloading dataset from '{}'", url);
            let path = dest_dir.join(format!("{}.zip", uuid::Uuid::new_v4()));

            match self.download(url, &path).await {
                Ok(num_bytes) => {
                    info!("downloaded {} bytes to '{}'", num_bytes, path.display());
                    Ok(ResolvedArchive {
                        path,
                        downloaded: true,
                    })
                }
                Err(err) => {
                    // leave no partial archive behind
                    let _ = tokio::fs::remove_file(&path).await;
                    Err(err.context(ErrorKind::Acquisition(format!(
                        "unable to download '{}'",
                        url
                    ))))
                }
            }
        }
        .instrument(info_span!("resolve_archive"))
        .boxed()
    }
}
