//! Revision control system backends, which supply the facts a version template can derive from the
//! working copy: the branch, commit counters, hashes and repository root.

mod git;
mod svn;
mod travis;

pub use git::Git;
pub use svn::Svn;
pub use travis::Travis;

use crate::{error::RcsError, paths, resolve::Environment};
use std::{path::Path, process::Command};
use tracing::debug;

/// A fact that can be derived from the revision control system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fact {
    /// `branch`
    Branch,
    /// `commit-counter`
    CommitCounter,
    /// `repo-counter`
    RepoCounter,
    /// `repo-root`
    RepoRoot,
    /// `commit-hash`
    CommitHash,
    /// `commit-hash-short`
    CommitHashShort,
}

impl Fact {
    /// Every fact, in declaration order.
    pub const ALL: [Fact; 6] = [
        Fact::Branch,
        Fact::CommitCounter,
        Fact::RepoCounter,
        Fact::RepoRoot,
        Fact::CommitHash,
        Fact::CommitHashShort,
    ];

    /// The parameter name under which this fact is available to templates.
    pub fn name(&self) -> &'static str {
        match self {
            Fact::Branch => "branch",
            Fact::CommitCounter => "commit-counter",
            Fact::RepoCounter => "repo-counter",
            Fact::RepoRoot => "repo-root",
            Fact::CommitHash => "commit-hash",
            Fact::CommitHashShort => "commit-hash-short",
        }
    }

    /// The fact available under parameter `name`, if any.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|fact| fact.name() == name)
    }

    /// Queries `rcs` for this fact.
    pub fn fetch<R: Rcs + ?Sized>(&self, rcs: &R) -> Result<String, RcsError> {
        match self {
            Fact::Branch => rcs.branch(),
            Fact::CommitCounter => rcs.commit_counter(),
            Fact::RepoCounter => rcs.repo_counter(),
            Fact::RepoRoot => rcs.repo_root(),
            Fact::CommitHash => rcs.commit_hash(),
            Fact::CommitHashShort => rcs.commit_hash_short(),
        }
    }
}

/// The queries a revision control system answers. Facts a system has no notion of default to
/// [`RcsError::Unsupported`].
pub trait Rcs {
    /// Short name used in error messages, e.g. `git`.
    fn name(&self) -> &'static str;

    /// The branch currently checked out.
    fn branch(&self) -> Result<String, RcsError>;

    /// Number of commits leading to the current one.
    fn commit_counter(&self) -> Result<String, RcsError>;

    /// Revision number of the whole repository.
    fn repo_counter(&self) -> Result<String, RcsError> {
        Err(self.unsupported(Fact::RepoCounter))
    }

    /// Root URL or path of the repository.
    fn repo_root(&self) -> Result<String, RcsError> {
        Err(self.unsupported(Fact::RepoRoot))
    }

    /// Full identifier of the current commit.
    fn commit_hash(&self) -> Result<String, RcsError> {
        Err(self.unsupported(Fact::CommitHash))
    }

    /// Abbreviated identifier of the current commit.
    fn commit_hash_short(&self) -> Result<String, RcsError> {
        Err(self.unsupported(Fact::CommitHashShort))
    }

    /// The error for a fact this system cannot provide.
    fn unsupported(&self, fact: Fact) -> RcsError {
        RcsError::Unsupported {
            rcs: self.name(),
            fact: fact.name(),
        }
    }
}

/// The kinds of revision control system this tool understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RcsKind {
    /// A git working copy.
    Git,
    /// A subversion working copy.
    Svn,
    /// A Travis CI build environment.
    Travis,
}

impl RcsKind {
    /// Extra `data-file` fields worth recording for this kind, used by `init`.
    pub fn data_file_fields(&self) -> &'static [&'static str] {
        match self {
            RcsKind::Git => &["commit-hash", "commit-hash-short"],
            RcsKind::Svn => &["repo-counter", "repo-root"],
            RcsKind::Travis => &[],
        }
    }
}

/// The revision control system in use for one invocation.
#[derive(Debug, Clone)]
pub enum RcsBackend {
    /// See [`Git`].
    Git(Git),
    /// See [`Svn`].
    Svn(Svn),
    /// See [`Travis`].
    Travis(Travis),
}

impl RcsBackend {
    /// Picks the backend for the working copy containing `start`.
    ///
    /// A Travis CI build is recognised by `TRAVIS_BRANCH` in the environment. Otherwise the
    /// nearest of `start` and its ancestors holding a `.git` or `.svn` entry is the root.
    pub fn detect(start: &Path, env: &dyn Environment) -> Result<Self, RcsError> {
        if env.var(travis::BRANCH).is_some() {
            debug!("using travis environment");
            return Ok(RcsBackend::Travis(Travis::from_env(env)));
        }

        let root = paths::find_in_ancestors(start, |dir| {
            paths::contains(dir, ".git") || paths::contains(dir, ".svn")
        })
        .ok_or_else(|| RcsError::RootNotFound {
            path: start.to_path_buf(),
        })?;

        let backend = if paths::contains(&root, ".git") {
            RcsBackend::Git(Git::new(root))
        } else {
            RcsBackend::Svn(Svn::new(root))
        };
        debug!(rcs = backend.name(), "detected rcs");
        Ok(backend)
    }

    /// Which kind of system this is.
    pub fn kind(&self) -> RcsKind {
        match self {
            RcsBackend::Git(_) => RcsKind::Git,
            RcsBackend::Svn(_) => RcsKind::Svn,
            RcsBackend::Travis(_) => RcsKind::Travis,
        }
    }
}

macro_rules! delegate {
    ($self:ident.$method:ident()) => {
        match $self {
            RcsBackend::Git(git) => git.$method(),
            RcsBackend::Svn(svn) => svn.$method(),
            RcsBackend::Travis(travis) => travis.$method(),
        }
    };
}

impl Rcs for RcsBackend {
    fn name(&self) -> &'static str {
        delegate!(self.name())
    }

    fn branch(&self) -> Result<String, RcsError> {
        delegate!(self.branch())
    }

    fn commit_counter(&self) -> Result<String, RcsError> {
        delegate!(self.commit_counter())
    }

    fn repo_counter(&self) -> Result<String, RcsError> {
        delegate!(self.repo_counter())
    }

    fn repo_root(&self) -> Result<String, RcsError> {
        delegate!(self.repo_root())
    }

    fn commit_hash(&self) -> Result<String, RcsError> {
        delegate!(self.commit_hash())
    }

    fn commit_hash_short(&self) -> Result<String, RcsError> {
        delegate!(self.commit_hash_short())
    }
}

/// Runs `program args...` in `dir` and returns its stdout.
fn run(program: &str, args: &[&str], dir: &Path) -> Result<String, RcsError> {
    let command = format!("{program} {}", args.join(" "));
    debug!(%command, dir = %dir.display(), "running rcs command");

    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| RcsError::Command {
            command: command.clone(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(RcsError::Command {
            command,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    String::from_utf8(output.stdout).map_err(|_| RcsError::UnexpectedOutput {
        command,
        message: "output is not utf-8".to_string(),
    })
}

/// Checks that `text` is a non-negative integer and returns it in canonical form.
fn counter(text: &str, command: &str) -> Result<String, RcsError> {
    text.trim()
        .parse::<u64>()
        .map(|n| n.to_string())
        .map_err(|_| RcsError::UnexpectedOutput {
            command: command.to_string(),
            message: format!("'{}' is not a number", text.trim()),
        })
}
