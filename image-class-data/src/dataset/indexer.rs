use super::*;
use crate::{common::*, config::CollectConfig, error::ErrorKind};

/// Directory names that identify a split in the image tree.
pub const SPLIT_DIRS: [&str; 3] = ["train", "validation", "test"];

/// Recognized image extensions. Matching is case-sensitive.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// The result of indexing an unpacked dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetIndex {
    pub partition: SplitPartition,
    pub label_map: LabelMap,
}

/// Finds `{split}/{category}/{file}` images under a root directory.
#[derive(Debug, Clone, Default)]
pub struct PathIndexer {
    /// Shuffle the discovered paths before labels are assigned.
    pub shuffle: bool,
    /// Seed of the shuffle. An entropy seed is used if unset.
    pub seed: Option<u64>,
}

impl PathIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CollectConfig) -> Self {
        Self {
            shuffle: config.shuffle_before_indexing,
            seed: config.shuffle_seed,
        }
    }

    /// List image paths matching `**/{train,validation,test}/*/*.{jpg,jpeg,png}`.
    ///
    /// Paths are sorted lexicographically, then shuffled if requested.
    pub fn discover(&self, root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let root = root.as_ref();
        ensure!(
            root.is_dir(),
            "dataset directory '{}' does not exist",
            root.display()
        );
        let root_text = root
            .to_str()
            .ok_or_else(|| format_err!("non-UTF-8 dataset path '{}'", root.display()))?;
        let root_pattern = glob::Pattern::escape(root_text);

        // hidden entries such as '._a.jpg' from macOS archives are skipped
        let options = glob::MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };

        let mut paths: Vec<PathBuf> = SPLIT_DIRS
            .iter()
            .cartesian_product(IMAGE_EXTENSIONS.iter())
            .map(|(split, ext)| -> Result<_> {
                let pattern = format!("{}/**/{}/*/*.{}", root_pattern, split, ext);
                let paths: Vec<_> = glob::glob_with(&pattern, options)?.try_collect()?;
                Ok(paths)
            })
            .flatten_ok()
            .try_collect()?;

        paths.retain(|path| path.is_file());
        paths.sort();
        paths.dedup();

        if self.shuffle {
            let mut rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            paths.shuffle(&mut rng);
        }

        Ok(paths)
    }

    /// Discover images and build the labeled partition.
    ///
    /// Fails with [ErrorKind::EmptyDataset] if there are no training images.
    pub fn index(&self, root: impl AsRef<Path>) -> Result<DatasetIndex> {
        let root = root.as_ref();
        let paths = self.discover(root)?;
        let index = assign_labels(paths);

        if index.partition.train.is_empty() {
            bail!(ErrorKind::EmptyDataset(root.to_owned()));
        }

        info!(
            "indexed {} train and {} test images in {} categories",
            index.partition.train.len(),
            index.partition.test.len(),
            index.label_map.len()
        );

        Ok(index)
    }
}

/// Assign labels to image paths in iteration order.
///
/// The split is the grandparent directory name and the category is the
/// parent directory name. Every path contributes its category to the
/// label map, but only `train` and `test` paths are kept as entries.
pub fn assign_labels<I>(paths: I) -> DatasetIndex
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut index = DatasetIndex::default();

    for path in paths {
        let (split, category) = match split_and_category(&path) {
            Some(names) => names,
            None => {
                warn!("skip image path '{}'", path.display());
                continue;
            }
        };
        let label = index.label_map.get_or_insert(&category);
        let entry = LabeledEntry { path, label };

        match split.as_str() {
            "train" => index.partition.train.push(entry),
            "test" => index.partition.test.push(entry),
            _ => trace!("not indexing '{}' of split '{}'", entry.path.display(), split),
        }
    }

    index
}

fn split_and_category(path: &Path) -> Option<(String, String)> {
    let category_dir = path.parent()?;
    let category = category_dir.file_name()?.to_string_lossy().into_owned();
    let split = category_dir
        .parent()?
        .file_name()?
        .to_string_lossy()
        .into_owned();
    Some((split, category))
}
