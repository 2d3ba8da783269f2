use crate::{
    config::DataMap,
    error::{NoMatch, PatternError},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Named capture groups extracted from a branch name, keyed by group name.
pub type CaptureBindings = HashMap<String, String>;

/// A branch-name pattern and the version template to use when it matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchRule {
    /// A regular expression matched against the whole branch name. Named groups, e.g.
    /// `(?P<rc>\d+)`, become parameters.
    #[serde(rename = "branch")]
    pub pattern: String,

    /// The version template for this branch.
    #[serde(rename = "version")]
    pub template: String,

    /// Static data that applies only when this rule is selected.
    #[serde(default, skip_serializing_if = "DataMap::is_empty")]
    pub data: DataMap,
}

impl BranchRule {
    /// Creates a rule with no branch data.
    pub fn new(pattern: &str, template: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            template: template.to_string(),
            data: DataMap::new(),
        }
    }

    /// Compiles the pattern, anchored at both ends.
    pub(crate) fn compile(&self) -> Result<Regex, PatternError> {
        Regex::new(&format!("^(?:{})$", self.pattern)).map_err(|source| PatternError {
            pattern: self.pattern.clone(),
            source,
        })
    }
}

/// Selects a [`BranchRule`] for a branch name.
///
/// Rules are tried in declaration order and the first whose pattern matches the whole branch name
/// wins. A catch-all like `.*` therefore belongs last.
#[derive(Debug)]
pub struct BranchMatcher<'r> {
    rules: Vec<(&'r BranchRule, Regex)>,
}

impl<'r> BranchMatcher<'r> {
    /// Compiles every rule's pattern.
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] for the first pattern that does not compile.
    pub fn new(rules: &'r [BranchRule]) -> Result<Self, PatternError> {
        let rules = rules
            .iter()
            .map(|rule| Ok((rule, rule.compile()?)))
            .collect::<Result<Vec<_>, PatternError>>()?;
        Ok(Self { rules })
    }

    /// Returns the first rule matching `branch` and the values of its named capture groups.
    /// Unnamed groups are ignored, and a named group that did not participate binds to `""`.
    ///
    /// # Errors
    ///
    /// Returns [`NoMatch`] if no rule matches.
    pub fn match_branch(&self, branch: &str) -> Result<(&'r BranchRule, CaptureBindings), NoMatch> {
        self.rules
            .iter()
            .find_map(|(rule, regex)| {
                let captures = regex.captures(branch)?;
                let bindings = regex
                    .capture_names()
                    .flatten()
                    .map(|name| {
                        let value = captures.name(name).map_or("", |m| m.as_str());
                        (name.to_string(), value.to_string())
                    })
                    .collect();
                Some((*rule, bindings))
            })
            .ok_or_else(|| NoMatch {
                branch: branch.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[fixture]
    fn rules() -> Vec<BranchRule> {
        vec![
            BranchRule::new(r"release-RC(?P<rc>\d+)", "{major}.{minor}rc{rc}"),
            BranchRule::new("master|trunk", "{major}.{minor}"),
            BranchRule::new(".*", "{major}.{minor}dev{commit-counter}"),
        ]
    }

    #[rstest]
    fn test_first_match_wins(rules: Vec<BranchRule>) {
        let matcher = BranchMatcher::new(&rules).unwrap();

        let (rule, bindings) = matcher.match_branch("release-RC2").unwrap();
        assert_eq!(&rules[0], rule);
        assert_eq!(
            CaptureBindings::from([("rc".to_string(), "2".to_string())]),
            bindings
        );

        let (rule, bindings) = matcher.match_branch("foo").unwrap();
        assert_eq!(&rules[2], rule);
        assert!(bindings.is_empty());
    }

    #[rstest]
    #[case("master", 1)]
    #[case("trunk", 1)]
    #[case("master-2", 2)]
    #[case("old-trunk", 2)]
    #[case("release-RC", 2)]
    #[case("release-RC12-hotfix", 2)]
    fn test_patterns_are_anchored(
        rules: Vec<BranchRule>,
        #[case] branch: &str,
        #[case] expected: usize,
    ) {
        let matcher = BranchMatcher::new(&rules).unwrap();
        let (rule, _) = matcher.match_branch(branch).unwrap();
        assert_eq!(&rules[expected], rule);
    }

    #[test]
    fn test_no_match() {
        let rules = vec![BranchRule::new("master", "{major}")];
        let matcher = BranchMatcher::new(&rules).unwrap();
        assert_eq!(
            Err(NoMatch {
                branch: "develop".to_string()
            }),
            matcher.match_branch("develop")
        );
    }

    #[test]
    fn test_unnamed_groups_ignored() {
        let rules = vec![BranchRule::new(
            r"(feature|bugfix)/(?P<ticket>[A-Z]+-\d+)(?P<suffix>-wip)?",
            "{ticket}",
        )];
        let matcher = BranchMatcher::new(&rules).unwrap();
        let (_, bindings) = matcher.match_branch("feature/ABC-12").unwrap();
        assert_eq!(
            CaptureBindings::from([
                ("ticket".to_string(), "ABC-12".to_string()),
                ("suffix".to_string(), String::new()),
            ]),
            bindings
        );
    }

    #[test]
    fn test_malformed_pattern() {
        let rules = vec![BranchRule::new("(", "{branch}")];
        let err = BranchMatcher::new(&rules).unwrap_err();
        assert_eq!("branch pattern '(' is malformed", err.to_string());
    }
}
