use super::Rcs;
use crate::{error::RcsError, resolve::Environment};
use std::collections::HashMap;

pub(crate) const BRANCH: &str = "TRAVIS_BRANCH";
const PULL_REQUEST_BRANCH: &str = "TRAVIS_PULL_REQUEST_BRANCH";
const PULL_REQUEST_NUMBER: &str = "TRAVIS_PULL_REQUEST_NUMBER";
const COMMIT: &str = "TRAVIS_COMMIT";

const SHORT_HASH_LEN: usize = 7;

/// A Travis CI build, described entirely by the build's environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Travis {
    vars: HashMap<&'static str, String>,
}

impl Travis {
    /// Captures the Travis variables present in `env`.
    pub fn from_env(env: &dyn Environment) -> Self {
        let vars = [BRANCH, PULL_REQUEST_BRANCH, PULL_REQUEST_NUMBER, COMMIT]
            .into_iter()
            .filter_map(|name| env.var(name).map(|value| (name, value)))
            .collect();
        Self { vars }
    }

    fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

impl Rcs for Travis {
    fn name(&self) -> &'static str {
        "travis"
    }

    fn branch(&self) -> Result<String, RcsError> {
        self.var(PULL_REQUEST_BRANCH)
            .filter(|branch| !branch.is_empty())
            .or_else(|| self.var(BRANCH))
            .map(str::to_string)
            .ok_or(RcsError::MissingEnv { name: BRANCH })
    }

    fn commit_counter(&self) -> Result<String, RcsError> {
        Ok("UNKNOWN".to_string())
    }

    fn commit_hash(&self) -> Result<String, RcsError> {
        self.var(PULL_REQUEST_NUMBER)
            .filter(|number| *number != "false")
            .or_else(|| self.var(COMMIT))
            .map(str::to_string)
            .ok_or(RcsError::MissingEnv { name: COMMIT })
    }

    fn commit_hash_short(&self) -> Result<String, RcsError> {
        let hash = self.commit_hash()?;
        match hash.get(..SHORT_HASH_LEN) {
            Some(short) => Ok(short.to_string()),
            None => Err(RcsError::MalformedHash { hash }),
        }
    }
}
