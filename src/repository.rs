use crate::error::ObjectError;
use crate::object_id::ObjectId;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where loose objects live on disk.
///
/// The object store only asks for paths below its root; implementors decide
/// where that root is.
pub trait ObjectPaths {
    /// Resolve `relative`, a path below the object store root, creating its
    /// parent directories when `create_parents` is set.
    fn resolve(&self, relative: &Path, create_parents: bool) -> io::Result<PathBuf>;
}

/// `<root>/<first 2 hex digits>/<remaining 38>`.
pub(crate) fn loose_object_path(
    store: &dyn ObjectPaths,
    id: &ObjectId,
    create_parents: bool,
) -> io::Result<PathBuf> {
    let (dir, file) = id.shard();
    store.resolve(&Path::new(&dir).join(file), create_parents)
}

fn resolve_under(root: &Path, relative: &Path, create_parents: bool) -> io::Result<PathBuf> {
    let path = root.join(relative);
    if create_parents {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(path)
}

/// A bare object directory, e.g. `.git/objects`.
#[derive(Clone, Debug)]
pub struct ObjectDir {
    root: PathBuf,
}

impl ObjectDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ObjectDir { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ObjectPaths for ObjectDir {
    fn resolve(&self, relative: &Path, create_parents: bool) -> io::Result<PathBuf> {
        resolve_under(&self.root, relative, create_parents)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("no git directory found above {0}")]
    NotFound(PathBuf),

    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("{0} is not empty")]
    NotEmpty(PathBuf),

    #[error("configuration file {0} is missing")]
    MissingConfig(PathBuf),

    #[error("unsupported repositoryformatversion {0}")]
    UnsupportedVersion(String),

    #[error("cannot resolve {0:?}")]
    BadRef(String),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

const DEFAULT_CONFIG: &str = "[core]\n\
\trepositoryformatversion = 0\n\
\tfilemode = false\n\
\tbare = false\n";

const DESCRIPTION: &str =
    "Unnamed repository; edit this file 'description' to name the repository.\n";

/// A worktree and its `.git` metadata directory.
#[derive(Clone, Debug)]
pub struct Repository {
    worktree: PathBuf,
    gitdir: PathBuf,
}

impl Repository {
    /// Open the repository whose worktree is `path`.
    pub fn open(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let worktree = path.as_ref().to_path_buf();
        let gitdir = worktree.join(".git");
        if !gitdir.is_dir() {
            return Err(RepositoryError::NotARepository(worktree));
        }
        let config = gitdir.join("config");
        if !config.is_file() {
            return Err(RepositoryError::MissingConfig(config));
        }
        match config_value(&config, "core", "repositoryformatversion")? {
            Some(version) if version == "0" => {}
            Some(version) => return Err(RepositoryError::UnsupportedVersion(version)),
            None => return Err(RepositoryError::UnsupportedVersion(String::new())),
        }
        Ok(Repository { worktree, gitdir })
    }

    /// Create a new repository at `path`, which must not exist or be a
    /// directory without a populated `.git`.
    pub fn create(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let worktree = path.as_ref().to_path_buf();
        let gitdir = worktree.join(".git");
        if worktree.exists() {
            if !worktree.is_dir() {
                return Err(RepositoryError::NotADirectory(worktree));
            }
            if gitdir.exists() && fs::read_dir(&gitdir)?.next().is_some() {
                return Err(RepositoryError::NotEmpty(gitdir));
            }
        } else {
            fs::create_dir_all(&worktree)?;
        }

        for dir in ["branches", "objects", "refs/tags", "refs/heads"] {
            fs::create_dir_all(gitdir.join(dir))?;
        }
        fs::write(gitdir.join("description"), DESCRIPTION)?;
        fs::write(gitdir.join("HEAD"), "ref: refs/heads/master\n")?;
        fs::write(gitdir.join("config"), DEFAULT_CONFIG)?;
        debug!(path = %gitdir.display(), "created repository");
        Ok(Repository { worktree, gitdir })
    }

    /// Find the repository containing `path`, looking at `path` and then each
    /// of its parents.
    pub fn find(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let start = fs::canonicalize(path.as_ref())?;
        for dir in start.ancestors() {
            if dir.join(".git").is_dir() {
                return Repository::open(dir);
            }
        }
        Err(RepositoryError::NotFound(start))
    }

    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    pub fn gitdir(&self) -> &Path {
        &self.gitdir
    }

    pub fn objects(&self) -> ObjectDir {
        ObjectDir::new(self.gitdir.join("objects"))
    }

    /// Value of `key` in `[section]` of `.git/config`.
    pub fn config(&self, section: &str, key: &str) -> RepositoryResult<Option<String>> {
        Ok(config_value(&self.gitdir.join("config"), section, key)?)
    }

    /// Resolve `HEAD`, a `refs/...` path or a full hex id.
    ///
    /// Returns `None` for a ref that does not point anywhere yet, such as the
    /// branch `HEAD` names in a repository without commits.
    pub fn resolve(&self, name: &str) -> RepositoryResult<Option<ObjectId>> {
        if let Ok(id) = name.parse::<ObjectId>() {
            return Ok(Some(id));
        }
        if name != "HEAD" && !name.starts_with("refs/") {
            return Err(RepositoryError::BadRef(name.to_string()));
        }
        let mut name = name.to_string();
        // Symbolic refs may chain; a loop is cut off rather than followed forever.
        for _ in 0..8 {
            let path = self.gitdir.join(&name);
            if !path.is_file() {
                return Ok(None);
            }
            let content = fs::read_to_string(&path)?;
            let content = content.trim();
            match content.strip_prefix("ref: ") {
                Some(target) => name = target.trim().to_string(),
                None => {
                    return content
                        .parse()
                        .map(Some)
                        .map_err(|_| RepositoryError::BadRef(name));
                }
            }
        }
        Err(RepositoryError::BadRef(name))
    }

    /// Point the branch `HEAD` refers to (or `HEAD` itself when detached) at `id`.
    pub fn update_head(&self, id: &ObjectId) -> RepositoryResult<()> {
        let head = fs::read_to_string(self.gitdir.join("HEAD"))?;
        let target = match head.trim().strip_prefix("ref: ") {
            Some(branch) => self.gitdir.join(branch.trim()),
            None => self.gitdir.join("HEAD"),
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, format!("{id}\n"))?;
        debug!(target = %target.display(), %id, "updated ref");
        Ok(())
    }
}

impl ObjectPaths for Repository {
    fn resolve(&self, relative: &Path, create_parents: bool) -> io::Result<PathBuf> {
        resolve_under(&self.gitdir.join("objects"), relative, create_parents)
    }
}

/// Read `key` from `[section]` of a git-style config file.
///
/// Only plain `[section]` headers are understood; subsections such as
/// `[remote "origin"]` never match.
pub fn config_value(path: &Path, section: &str, key: &str) -> io::Result<Option<String>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let reader = BufReader::new(file);
    let mut in_section = false;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with(['#', ';']) {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_section = name.trim().eq_ignore_ascii_case(section);
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            if k.trim().eq_ignore_ascii_case(key) {
                return Ok(Some(v.trim().to_string()));
            }
        }
    }
    Ok(None)
}
