use super::{counter, run, Rcs};
use crate::error::RcsError;
use regex::Regex;
use std::{collections::HashMap, path::PathBuf, sync::LazyLock};

/// A subversion working copy. Commands run in its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Svn {
    root: PathBuf,
}

impl Svn {
    /// Creates a backend for the working copy rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn info(&self, key: &str) -> Result<String, RcsError> {
        let output = run("svn", &["info"], &self.root)?;
        info_value(&output, key)
    }
}

impl Rcs for Svn {
    fn name(&self) -> &'static str {
        "svn"
    }

    fn branch(&self) -> Result<String, RcsError> {
        branch_from_url(&self.info("URL")?)
    }

    fn commit_counter(&self) -> Result<String, RcsError> {
        let log = run("svn", &["log", "-l", "1", "--xml"], &self.root)?;
        revision_from_xml_log(&log)
    }

    fn repo_counter(&self) -> Result<String, RcsError> {
        counter(&self.info("Revision")?, "svn info")
    }

    fn repo_root(&self) -> Result<String, RcsError> {
        self.info("Repository Root")
    }
}

/// Parses the `Key: value` lines of `svn info`.
pub(crate) fn parse_info(output: &str) -> Result<HashMap<&str, &str>, RcsError> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split_once(": ")
                .ok_or_else(|| RcsError::UnexpectedOutput {
                    command: "svn info".to_string(),
                    message: format!("found unparsable line '{line}'"),
                })
        })
        .collect()
}

/// Looks up `key` in the output of `svn info`.
pub(crate) fn info_value(output: &str, key: &str) -> Result<String, RcsError> {
    parse_info(output)?
        .get(key)
        .map(|value| value.to_string())
        .ok_or_else(|| RcsError::UnexpectedOutput {
            command: "svn info".to_string(),
            message: format!("could not find {key} in svn output"),
        })
}

/// Extracts the branch from a repository URL laid out as `trunk`, `branches/<b>`, `tags/<t>`.
pub(crate) fn branch_from_url(url: &str) -> Result<String, RcsError> {
    static PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
        [
            r"/branches/([^/]+)",
            r"/(trunk)/",
            r"/(trunk)$",
            r"/tags/([^/]+)",
        ]
        .map(|pattern| Regex::new(pattern).unwrap())
    });

    PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .map(|captures| captures[1].to_string())
        .ok_or_else(|| RcsError::UnexpectedOutput {
            command: "svn info".to_string(),
            message: format!("could not extract branch from svn URL '{url}'"),
        })
}

/// Reads the revision of the newest entry in `svn log --xml`. An empty log is revision `0`.
pub(crate) fn revision_from_xml_log(log: &str) -> Result<String, RcsError> {
    static REVISION: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"<logentry\s+revision="(\d+)""#).unwrap());

    if !log.contains("<log") {
        return Err(RcsError::UnexpectedOutput {
            command: "svn log".to_string(),
            message: "expected an xml log".to_string(),
        });
    }
    match REVISION.captures(log) {
        Some(captures) => counter(&captures[1], "svn log"),
        None => Ok("0".to_string()),
    }
}
