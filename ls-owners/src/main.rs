mod repository;
mod walk;

use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use ownership::{AnnotatedRule, PathKind, RuleSet};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::{
    repository::{find_ownership_file, Repository},
    walk::FileWalker,
};

/// List the owners of files in a git work tree, according to its CODEOWNERS
/// file.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Files or directories to list (default: the current directory)
    paths: Vec<PathBuf>,

    /// Directory to discover the repository from (default: the current
    /// directory)
    #[arg(long = "repo")]
    repo_dir: Option<PathBuf>,

    /// Ownership file to use instead of the repository's CODEOWNERS
    #[clap(short = 'f', long = "file")]
    codeowners_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Show the rule that determined each file's owners
    #[arg(long)]
    show_rule: bool,

    /// List every rule matching each file, in file order
    #[arg(long)]
    all_matching_rules: bool,

    /// Include files ignored by git
    #[arg(long)]
    include_ignored: bool,
}

impl Cli {
    fn start_points(&self, current_dir: &Path) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![current_dir.to_path_buf()]
        } else {
            self.paths.clone()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let current_dir = env::current_dir()
        .and_then(|dir| dir.canonicalize())
        .context("reading current directory")?;

    let discovery_start = cli.repo_dir.clone().unwrap_or_else(|| current_dir.clone());
    let Some(repo) = Repository::discover(&discovery_start)? else {
        println!("No repository discovered from: {}", discovery_start.display());
        return Ok(());
    };
    let work_dir = repo.work_directory();

    let codeowners_path = match cli.codeowners_file.clone().or_else(|| find_ownership_file(work_dir)) {
        Some(path) => path,
        None => {
            println!(
                "No CODEOWNERS file found; repository work directory: {}",
                work_dir.display()
            );
            return Ok(());
        }
    };
    let ruleset = ownership::from_path(&codeowners_path)
        .with_context(|| format!("loading {}", codeowners_path.display()))?;

    let mut files = Vec::new();
    let mut relative_paths = Vec::new();
    for file in list_files(&repo, &cli.start_points(&current_dir), cli.include_ignored)? {
        match file.strip_prefix(work_dir) {
            Ok(relative) => {
                relative_paths.push(relative.to_string_lossy().into_owned());
                files.push(file);
            }
            Err(_) => {
                tracing::warn!(path = %file.display(), "skipping file outside the work tree");
            }
        }
    }
    tracing::debug!(files = files.len(), rules = ruleset.len(), "resolving owners");

    if cli.all_matching_rules {
        for (file, relative_path) in files.iter().zip(&relative_paths) {
            println!("{}", display_path(file, &current_dir));
            for rule in ruleset.matching_rules(relative_path, PathKind::File) {
                println!("  {}", format_rule(rule));
            }
        }
        return Ok(());
    }

    let resolved = resolve(&ruleset, &relative_paths);
    for (file, rule) in files.iter().zip(resolved) {
        println!(
            "{}",
            format_line(&display_path(file, &current_dir), rule, cli.show_rule)
        );
    }

    Ok(())
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Walk the start points, skipping the git directory and submodules and,
/// unless `include_ignored` is set, anything git ignores.
fn list_files(
    repo: &Repository,
    start_points: &[PathBuf],
    include_ignored: bool,
) -> Result<Vec<PathBuf>> {
    let walker = FileWalker::new(start_points, &repo.excluded_subtrees()?)?;
    let mut ignore_filter = if include_ignored {
        None
    } else {
        Some(repo.ignore_filter()?)
    };
    let files = walker
        .files(|path, is_dir| {
            ignore_filter
                .as_mut()
                .is_some_and(|filter| filter.is_ignored(path, is_dir))
        })
        .collect();
    Ok(files)
}

#[cfg(feature = "rayon")]
fn resolve<'a>(ruleset: &'a RuleSet, paths: &[String]) -> Vec<Option<&'a AnnotatedRule>> {
    paths
        .par_iter()
        .map(|path| ruleset.resolve_as(path, PathKind::File))
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn resolve<'a>(ruleset: &'a RuleSet, paths: &[String]) -> Vec<Option<&'a AnnotatedRule>> {
    ruleset.resolve_all(paths, PathKind::File)
}

// Paths are shown relative to the current directory when they're inside it
fn display_path(path: &Path, current_dir: &Path) -> String {
    path.strip_prefix(current_dir)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn format_owners(rule: &AnnotatedRule) -> String {
    if rule.owners().is_empty() {
        "(unowned)".to_owned()
    } else {
        rule.owners()
            .iter()
            .map(|owner| owner.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn format_rule(rule: &AnnotatedRule) -> String {
    format!("{}  {}  {}", rule.source, rule.pattern(), format_owners(rule))
}

fn format_line(path: &str, rule: Option<&AnnotatedRule>, show_rule: bool) -> String {
    match rule {
        Some(rule) if show_rule => format!(
            "{:<70}  {}  ({} {})",
            path,
            format_owners(rule),
            rule.source,
            rule.pattern()
        ),
        Some(rule) => format!("{:<70}  {}", path, format_owners(rule)),
        None => format!("{:<70}  (no matching rule)", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ruleset() -> RuleSet {
        RuleSet::parse("* @everyone\n/build/\n*.rs @rust @core\n!*.lock\n", "CODEOWNERS").unwrap()
    }

    #[test]
    fn test_format_line() {
        let ruleset = ruleset();
        let line = |path: &str, show_rule: bool| {
            format_line(path, ruleset.resolve_as(path, PathKind::File), show_rule)
        };

        assert_eq!(line("README", false), format!("{:<70}  @everyone", "README"));
        assert_eq!(line("src/main.rs", false), format!("{:<70}  @rust @core", "src/main.rs"));
        assert_eq!(line("build/app", false), format!("{:<70}  (unowned)", "build/app"));
        assert_eq!(line("Cargo.lock", false), format!("{:<70}  (no matching rule)", "Cargo.lock"));
        assert_eq!(
            line("build/app", true),
            format!("{:<70}  (unowned)  (CODEOWNERS:2 /build/)", "build/app")
        );
    }

    #[test]
    fn test_format_rule() {
        let ruleset = ruleset();
        let rules = ruleset
            .matching_rules("src/main.rs", PathKind::File)
            .into_iter()
            .map(format_rule)
            .collect::<Vec<_>>();
        assert_eq!(
            rules,
            vec!["CODEOWNERS:1  *  @everyone", "CODEOWNERS:3  *.rs  @rust @core"]
        );
    }

    #[test]
    fn test_resolve_preserves_order() {
        let ruleset = ruleset();
        let paths = ["b.rs", "a/README", "build/x.rs", "x.lock"]
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>();
        let lines = resolve(&ruleset, &paths)
            .into_iter()
            .map(|rule| rule.map(|r| r.source.line))
            .collect::<Vec<_>>();
        assert_eq!(lines, vec![Some(3), Some(1), Some(3), None]);
    }

    #[test]
    fn test_list_files_skips_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(tmp.path()).unwrap();
        gix::init(&root).unwrap();
        for (path, contents) in [
            (".gitignore", "target/\n"),
            ("CODEOWNERS", "* @everyone\n"),
            ("src/lib.rs", ""),
            ("target/debug/app", ""),
        ] {
            let path = root.join(path);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }
        let repo = Repository::discover(&root).unwrap().unwrap();

        let relative = |files: Vec<PathBuf>| {
            files
                .iter()
                .map(|file| display_path(file, &root))
                .collect::<Vec<_>>()
        };
        assert_eq!(
            relative(list_files(&repo, &[root.clone()], false).unwrap()),
            vec![".gitignore", "CODEOWNERS", "src/lib.rs"]
        );
        assert_eq!(
            relative(list_files(&repo, &[root.clone()], true).unwrap()),
            vec![".gitignore", "CODEOWNERS", "src/lib.rs", "target/debug/app"]
        );
        assert!(list_files(&repo, &[root.join("target")], false).unwrap().is_empty());
    }

    #[test]
    fn test_display_path() {
        let cwd = Path::new("/repo/src");
        assert_eq!(display_path(Path::new("/repo/src/lib.rs"), cwd), "lib.rs");
        assert_eq!(display_path(Path::new("/repo/README"), cwd), "/repo/README");
    }
}
