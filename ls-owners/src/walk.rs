use std::{
    fs,
    path::{Path, PathBuf},
    slice,
};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Walks the files beneath a set of start points, never descending into
/// excluded subtrees.
pub struct FileWalker {
    start_points: Vec<PathBuf>,
    excluded: Vec<PathBuf>,
}

impl FileWalker {
    /// Start points must exist. Both start points and exclusions are
    /// canonicalized; exclusions that don't exist are dropped since nothing
    /// can lie beneath them.
    pub fn new(start_points: &[PathBuf], excluded: &[PathBuf]) -> Result<FileWalker> {
        let start_points = start_points
            .iter()
            .map(|path| {
                fs::canonicalize(path)
                    .with_context(|| format!("path does not exist: {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;
        let excluded = excluded
            .iter()
            .filter_map(|path| fs::canonicalize(path).ok())
            .collect();

        Ok(FileWalker {
            start_points: distinct_prefixed_paths(start_points),
            excluded,
        })
    }

    /// Lazily yield every file beneath the start points. A start point that
    /// is a file yields itself. `is_ignored` is asked about each entry, with
    /// whether it's a directory; ignored directories aren't descended into.
    /// Entries that can't be read are logged and skipped.
    pub fn files<F>(&self, is_ignored: F) -> Files<'_, F>
    where
        F: FnMut(&Path, bool) -> bool,
    {
        Files {
            excluded: &self.excluded,
            start_points: self.start_points.iter(),
            walk: None,
            is_ignored,
        }
    }
}

/// Iterator returned by [`FileWalker::files`].
pub struct Files<'a, F> {
    excluded: &'a [PathBuf],
    start_points: slice::Iter<'a, PathBuf>,
    walk: Option<walkdir::IntoIter>,
    is_ignored: F,
}

impl<F> Iterator for Files<'_, F>
where
    F: FnMut(&Path, bool) -> bool,
{
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if self.walk.is_none() {
                let start = self.start_points.next()?;
                self.walk = Some(WalkDir::new(start).sort_by_file_name().into_iter());
            }
            let Some(walk) = self.walk.as_mut() else {
                continue;
            };

            let entry = match walk.next() {
                Some(Ok(entry)) => entry,
                Some(Err(err)) => {
                    tracing::warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
                None => {
                    self.walk = None;
                    continue;
                }
            };

            let is_dir = entry.file_type().is_dir();
            let path = entry.path();
            let excluded = self.excluded.iter().any(|excluded| path.starts_with(excluded));
            if excluded || (self.is_ignored)(path, is_dir) {
                tracing::trace!(path = %path.display(), excluded, "skipping entry");
                if is_dir {
                    walk.skip_current_dir();
                }
                continue;
            }
            if !is_dir {
                return Some(entry.into_path());
            }
        }
    }
}

/// Sort paths and drop any path that is equal to or nested inside another,
/// so walking the remainder visits each file once.
pub fn distinct_prefixed_paths(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort();

    // Component-wise ordering places every path directly after the paths it
    // is nested in
    let mut distinct: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths {
        match distinct.last() {
            Some(prefix) if path.starts_with(prefix) => {}
            _ => distinct.push(path),
        }
    }
    distinct
}
