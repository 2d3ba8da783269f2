use crate::{
    branch::BranchRule,
    error::{ConfigError, ConfigTypeError},
    template::{Template, VERSION_PARAMETER},
};
use core::fmt::{self, Display};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// The conventional name of the project configuration file.
pub const VERSION_FILE_NAME: &str = "version.json";

/// A scalar in the configuration's data sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A JSON integer.
    Int(i64),
    /// A JSON number with a fractional part.
    Float(f64),
    /// A JSON string.
    Str(String),
}

impl Value {
    /// Returns the integer this value denotes, if any. Floats are truncated.
    fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) => Some(f.trunc() as i64),
            Value::Str(s) => s.trim().parse().ok(),
        }
    }
}

impl Display for Value {
    /// Numbers, and strings that hold a plain integer (surrounding whitespace ignored), are written
    /// in canonical decimal form.
    /// Other strings are written as-is.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{}", v.trunc() as i64),
            Value::Str(s) => match s.trim().parse::<i64>() {
                Ok(i) => write!(f, "{i}"),
                Err(_) => f.write_str(s),
            },
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

/// Named static data, as found under `data` in the config and in branch rules.
pub type DataMap = BTreeMap<String, Value>;

/// Reads `name` from `data` as a string, see [`Value`]'s `Display`.
pub(crate) fn data_string(data: &DataMap, name: &str) -> Option<String> {
    data.get(name).map(Value::to_string)
}

/// The project configuration, usually stored as `version.json`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Project-wide static data.
    #[serde(default)]
    pub data: DataMap,

    /// Branch rules, in match order.
    #[serde(default)]
    pub branches: Vec<BranchRule>,

    /// Parameters written by the `data-file` command.
    #[serde(rename = "data-file", default)]
    pub data_file_fields: Vec<String>,
}

impl Config {
    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "reading config");
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        debug!(path = %path.display(), "writing config");
        let mut text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        text.push('\n');
        fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks that there is at least one branch rule and that every rule is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.branches.is_empty() {
            return Err(ConfigError::NoBranches);
        }
        self.branches.iter().try_for_each(validate_rule)
    }

    /// Returns project data `name` as an integer.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingData`] if absent, [`ConfigError::ConfigType`] if it is a string that
    /// is not an integer.
    pub fn data_int(&self, name: &str) -> Result<i64, ConfigError> {
        let value = self.data.get(name).ok_or_else(|| ConfigError::MissingData {
            name: name.to_string(),
        })?;
        value.as_int().ok_or_else(|| {
            ConfigTypeError {
                name: name.to_string(),
                value: value.to_string(),
                expected: "an int",
            }
            .into()
        })
    }

    /// Increments the counter for `level` and resets every lower counter to zero.
    ///
    /// All counters at and below `level` must already be integers in the data section.
    pub fn bump(&mut self, level: Level) -> Result<(), ConfigError> {
        let counters = level.counters();
        let values = counters
            .iter()
            .map(|name| self.data_int(name))
            .collect::<Result<Vec<_>, _>>()?;

        for (i, name) in counters.iter().enumerate() {
            let value = if i == 0 { values[0] + 1 } else { 0 };
            self.data.insert(name.to_string(), Value::Int(value));
        }
        Ok(())
    }
}

fn validate_rule(rule: &BranchRule) -> Result<(), ConfigError> {
    if rule.pattern.is_empty() {
        return Err(ConfigError::PatternRequired);
    }
    if rule.template.is_empty() {
        return Err(ConfigError::TemplateRequired);
    }
    rule.compile()?;
    let template =
        Template::parse(&rule.template).map_err(|source| ConfigError::MalformedTemplate {
            template: rule.template.clone(),
            source,
        })?;
    validate_version_template(&template)
}

/// Rejects templates that would expand to themselves.
pub fn validate_version_template(template: &Template) -> Result<(), ConfigError> {
    if template.variables().contains(VERSION_PARAMETER) {
        return Err(ConfigError::VersionSelfReference);
    }
    Ok(())
}

/// A stored version counter, from most to least significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// `major`
    Major,
    /// `minor`
    Minor,
    /// `release`
    Release,
}

impl Level {
    /// The data field holding this counter.
    pub fn name(&self) -> &'static str {
        match self {
            Level::Major => "major",
            Level::Minor => "minor",
            Level::Release => "release",
        }
    }

    /// This counter followed by every less significant one.
    fn counters(&self) -> &'static [&'static str] {
        static ALL: [&str; 3] = ["major", "minor", "release"];
        match self {
            Level::Major => &ALL,
            Level::Minor => &ALL[1..],
            Level::Release => &ALL[2..],
        }
    }
}

/// Starter configurations written by `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// `{branch}.{commit-counter}` for every branch.
    Default,
    /// `{major}.{minor}.{release}` for every branch.
    Semvar,
    /// Release versions on `master`/`trunk`, `dev` versions elsewhere.
    Python,
}

impl Preset {
    /// Builds the starter configuration.
    pub fn config(&self) -> Config {
        let counters = || {
            DataMap::from([
                ("major".to_string(), Value::Int(0)),
                ("minor".to_string(), Value::Int(0)),
                ("release".to_string(), Value::Int(1)),
            ])
        };
        let fields = |names: &[&str]| -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        };
        let counter_fields = ["branch", "commit-counter", "major", "minor", "release", "version"];

        match self {
            Preset::Default => Config {
                data: DataMap::new(),
                branches: vec![BranchRule::new(".*", "{branch}.{commit-counter}")],
                data_file_fields: fields(&["branch", "commit-counter", "version"]),
            },
            Preset::Semvar => Config {
                data: counters(),
                branches: vec![BranchRule::new(".*", "{major}.{minor}.{release}")],
                data_file_fields: fields(&counter_fields),
            },
            Preset::Python => Config {
                data: counters(),
                branches: vec![
                    BranchRule::new("master|trunk", "{major}.{minor}.{release}"),
                    BranchRule::new(".*", "{major}.{minor}.{release}dev{commit-counter}"),
                ],
                data_file_fields: fields(&counter_fields),
            },
        }
    }
}

/// Finds the version file: `explicit` if given, otherwise the nearest `version.json` in `start`
/// or one of its ancestors.
pub fn locate_version_file(explicit: Option<&Path>, start: &Path) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return std::path::absolute(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    crate::paths::find_in_ancestors(start, |dir| dir.join(VERSION_FILE_NAME).is_file())
        .map(|dir| dir.join(VERSION_FILE_NAME))
        .ok_or_else(|| ConfigError::VersionFileNotFound {
            message: format!("no {VERSION_FILE_NAME} in {} or its parents", start.display()),
        })
}
