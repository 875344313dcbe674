use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use gix::discover::upwards;

/// Locations of ownership files, relative to the work directory, in the order
/// they're searched.
const OWNERSHIP_FILE_PATHS: [&str; 3] = ["CODEOWNERS", "docs/CODEOWNERS", ".github/CODEOWNERS"];

/// A git repository with a work tree. Only read from; nothing is ever
/// written.
#[derive(Debug)]
pub struct Repository {
    repo: gix::Repository,
    work_directory: PathBuf,
    git_directory: PathBuf,
}

impl Repository {
    /// Find the repository containing `start`, honouring `GIT_DIR` and the
    /// other git environment overrides. Returns `None` when no repository is
    /// found. `start` must exist, and bare repositories are an error since
    /// they have no files to list.
    pub fn discover(start: impl AsRef<Path>) -> Result<Option<Repository>> {
        let start = start.as_ref();
        let start = fs::canonicalize(start)
            .with_context(|| format!("file not found: {}", start.display()))?;
        let start = match start.parent() {
            Some(parent) if !start.is_dir() => parent.to_path_buf(),
            _ => start,
        };

        let repo = match gix::ThreadSafeRepository::discover_with_environment_overrides(&start) {
            Ok(repo) => repo.to_thread_local(),
            Err(gix::discover::Error::Discover(
                upwards::Error::NoGitRepository { .. }
                | upwards::Error::NoGitRepositoryWithinCeiling { .. }
                | upwards::Error::NoGitRepositoryWithinFs { .. },
            )) => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("opening repository from {}", start.display()))
            }
        };

        let Some(work_dir) = repo.work_dir() else {
            bail!("bare repository has no work tree: {}", repo.git_dir().display());
        };
        let work_directory = fs::canonicalize(work_dir)
            .with_context(|| format!("resolving work tree {}", work_dir.display()))?;
        let git_directory = fs::canonicalize(repo.git_dir())
            .with_context(|| format!("resolving git directory {}", repo.git_dir().display()))?;
        tracing::debug!(
            work_directory = %work_directory.display(),
            git_directory = %git_directory.display(),
            "discovered repository"
        );

        Ok(Some(Repository {
            repo,
            work_directory,
            git_directory,
        }))
    }

    pub fn work_directory(&self) -> &Path {
        &self.work_directory
    }

    pub fn git_directory(&self) -> &Path {
        &self.git_directory
    }

    /// Paths of the configured submodules, relative to the work directory.
    pub fn submodule_paths(&self) -> Result<Vec<PathBuf>> {
        let Some(submodules) = self.repo.submodules().context("reading .gitmodules")? else {
            return Ok(Vec::new());
        };
        submodules
            .map(|submodule| {
                let path = submodule
                    .path()
                    .with_context(|| format!("reading path of submodule {}", submodule.name()))?;
                Ok(gix::path::from_bstr(path).into_owned())
            })
            .collect()
    }

    /// Paths recorded in the index, relative to the work directory. A
    /// repository without an index has none.
    pub fn tracked_paths(&self) -> Result<Vec<PathBuf>> {
        let index = self.repo.index_or_empty().context("reading the git index")?;
        Ok(index
            .entries()
            .iter()
            .map(|entry| gix::path::from_bstr(entry.path(&index)).into_owned())
            .collect())
    }

    /// Subtrees of the work directory that never hold owned files: the git
    /// directory and every submodule checked out on disk.
    pub fn excluded_subtrees(&self) -> Result<Vec<PathBuf>> {
        let mut excluded = vec![self.git_directory().to_path_buf()];
        excluded.extend(
            self.submodule_paths()?
                .into_iter()
                .map(|path| self.work_directory().join(path))
                .filter(|path| path.exists()),
        );
        Ok(excluded)
    }

    /// A filter answering whether paths in the work tree are ignored by git.
    pub fn ignore_filter(&self) -> Result<IgnoreFilter<'_>> {
        let index = self.repo.index_or_empty().context("reading the git index")?;
        let excludes = self
            .repo
            .excludes(
                &index,
                None,
                gix::worktree::stack::state::ignore::Source::WorktreeThenIdMappingIfNotSkipped,
            )
            .context("loading ignore rules")?;

        let mut tracked = HashSet::new();
        for path in self.tracked_paths()? {
            tracked.extend(
                path.ancestors()
                    .skip(1)
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .map(Path::to_path_buf),
            );
            tracked.insert(path);
        }

        Ok(IgnoreFilter {
            excludes,
            work_directory: &self.work_directory,
            tracked,
        })
    }
}

/// Answers whether paths are ignored the way `git status` sees them. Tracked
/// files, and directories holding them, are never ignored.
pub struct IgnoreFilter<'repo> {
    excludes: gix::AttributeStack<'repo>,
    work_directory: &'repo Path,
    tracked: HashSet<PathBuf>,
}

impl IgnoreFilter<'_> {
    /// `path` is absolute. Paths outside the work tree are never ignored.
    pub fn is_ignored(&mut self, path: &Path, is_dir: bool) -> bool {
        let Ok(relative) = path.strip_prefix(self.work_directory) else {
            return false;
        };
        if relative.as_os_str().is_empty() || self.tracked.contains(relative) {
            return false;
        }

        let mode = if is_dir {
            gix::index::entry::Mode::DIR
        } else {
            gix::index::entry::Mode::FILE
        };
        match self.excludes.at_path(relative, Some(mode)) {
            Ok(platform) => platform.is_excluded(),
            Err(err) => {
                tracing::warn!(path = %relative.display(), error = %err, "failed to read ignore rules");
                false
            }
        }
    }
}

/// Find the ownership file for a work directory. Checks `CODEOWNERS`,
/// `docs/CODEOWNERS` and `.github/CODEOWNERS`, in that order.
pub fn find_ownership_file(work_directory: &Path) -> Option<PathBuf> {
    OWNERSHIP_FILE_PATHS
        .iter()
        .map(|path| work_directory.join(path))
        .find(|path| path.exists())
}
