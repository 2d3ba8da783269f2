use super::{counter, run, Rcs};
use crate::error::RcsError;
use std::path::PathBuf;

const STATUS: [&str; 3] = ["status", "--porcelain", "--branch"];
const REV_COUNT: [&str; 3] = ["rev-list", "HEAD", "--count"];
const HASH: [&str; 4] = ["log", "-n", "1", "--pretty=format:%H"];
const HASH_SHORT: [&str; 4] = ["log", "-n", "1", "--pretty=format:%h"];

/// A git working copy. Commands run in its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Git {
    root: PathBuf,
}

impl Git {
    /// Creates a backend for the repository rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn git(&self, args: &[&str]) -> Result<String, RcsError> {
        run("git", args, &self.root)
    }

    fn single_line(&self, args: &[&str]) -> Result<String, RcsError> {
        let out = self.git(args)?;
        match out.trim_end().lines().collect::<Vec<_>>()[..] {
            [line] => Ok(line.to_string()),
            _ => Err(RcsError::UnexpectedOutput {
                command: format!("git {}", args.join(" ")),
                message: "expected only one line".to_string(),
            }),
        }
    }
}

impl Rcs for Git {
    fn name(&self) -> &'static str {
        "git"
    }

    fn branch(&self) -> Result<String, RcsError> {
        parse_status(&self.git(&STATUS)?)
    }

    fn commit_counter(&self) -> Result<String, RcsError> {
        counter(&self.single_line(&REV_COUNT)?, "git rev-list")
    }

    fn commit_hash(&self) -> Result<String, RcsError> {
        self.single_line(&HASH)
    }

    fn commit_hash_short(&self) -> Result<String, RcsError> {
        self.single_line(&HASH_SHORT)
    }
}

/// Extracts the branch from the header line of `git status --porcelain --branch`, e.g.
/// `## master...origin/master`. A detached head is reported as `HEAD`.
pub(crate) fn parse_status(status: &str) -> Result<String, RcsError> {
    let unexpected = |message: &str| RcsError::UnexpectedOutput {
        command: "git status".to_string(),
        message: message.to_string(),
    };

    let header = status
        .lines()
        .next()
        .ok_or_else(|| unexpected("expected at least one line of git output"))?;
    let mut fields = header.split(' ');
    if fields.next() != Some("##") {
        return Err(unexpected("expected line to start with branch marker ##"));
    }
    let branch = fields
        .next()
        .ok_or_else(|| unexpected("leading branch line should have at least two elements"))?;
    if branch == "HEAD" {
        return Ok(branch.to_string());
    }

    let local = branch.split("...").next().unwrap_or(branch);
    Ok(local.strip_prefix("origin/").unwrap_or(local).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("## master...origin/master\nA  rcs_git_test.go\n", "master")]
    #[case("## master...origin/master\n", "master")]
    #[case("## master\n", "master")]
    #[case("## HEAD (no branch)\n", "HEAD")]
    #[case("## origin/master\n", "master")]
    #[case("## feature/x...origin/feature/x [ahead 1]\n", "feature/x")]
    fn test_parse_status(#[case] status: &str, #[case] expected: &str) {
        assert_eq!(Ok(expected.to_string()), parse_status(status));
    }

    #[rstest]
    #[case("")]
    #[case("master\n")]
    #[case("##\n")]
    fn test_parse_status_err(#[case] status: &str) {
        assert!(matches!(
            parse_status(status),
            Err(RcsError::UnexpectedOutput { .. })
        ));
    }

    #[test]
    fn test_unsupported_facts() {
        let git = Git::new(PathBuf::from("."));
        assert_eq!(
            Err(RcsError::Unsupported {
                rcs: "git",
                fact: "repo-counter"
            }),
            git.repo_counter()
        );
        assert_eq!(
            Err(RcsError::Unsupported {
                rcs: "git",
                fact: "repo-root"
            }),
            git.repo_root()
        );
    }
}
