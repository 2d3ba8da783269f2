use std::path::PathBuf;

/// Errors produced while scanning a template string. The scan stops at the first one.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    /// `\` followed by something other than `{` or `\`.
    #[error("unknown escape code")]
    UnknownEscape,

    /// `{}`.
    #[error("variable not defined")]
    EmptyVariable,

    /// A variable name starting with something other than a letter.
    #[error("variable name must start with a letter")]
    InvalidNameStart,

    /// A variable name containing something other than letters, digits and `-`.
    #[error("invalid character in variable name")]
    InvalidNameChar,

    /// A specifier not starting with `0`.
    #[error("only zero fill allowed in specifier")]
    ZeroFillExpected,

    /// A specifier width that is not a single digit.
    #[error("only a digit allowed in field width")]
    WidthDigitExpected,

    /// A specifier type other than `d`.
    #[error("d expected as field type specifier")]
    DecimalTypeExpected,

    /// Anything but `}` after a specifier.
    #[error("closing brace expected after specifier")]
    SpecifierCloseExpected,

    /// The template ended inside an escape or a variable.
    #[error("end of string malformed")]
    MalformedEnd,
}

/// Errors produced while parsing a template string into a [`Template`](crate::Template).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template could not be scanned.
    #[error("{source} in template '{template}'")]
    Tokenize {
        /// What the scanner rejected.
        source: TokenizeError,
        /// The whole template text.
        template: String,
    },

    /// A variable's specifier is not of the form `name:0Wd`.
    #[error("malformed specifier '{spec}' in template '{template}'")]
    MalformedSpecifier {
        /// The text between the braces.
        spec: String,
        /// The whole template text.
        template: String,
    },
}

/// No branch rule matched a branch name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("no branch config matching branch '{branch}'")]
pub struct NoMatch {
    /// The branch name that nothing matched.
    pub branch: String,
}

/// A branch pattern is not a valid regular expression.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("branch pattern '{pattern}' is malformed")]
pub struct PatternError {
    /// The pattern as written in the config.
    pub pattern: String,
    /// Why the regex engine rejected it.
    pub source: regex::Error,
}

/// Errors from a revision control system backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RcsError {
    /// The backend has no notion of this fact.
    #[error("{rcs} does not support {fact}")]
    Unsupported {
        /// The backend's name.
        rcs: &'static str,
        /// The fact's parameter name.
        fact: &'static str,
    },

    /// A command could not be started or exited unsuccessfully.
    #[error("could not run `{command}`: {message}")]
    Command {
        /// The command line.
        command: String,
        /// The OS error or the command's stderr.
        message: String,
    },

    /// A command succeeded but printed something unexpected.
    #[error("unexpected output from `{command}`: {message}")]
    UnexpectedOutput {
        /// The command line.
        command: String,
        /// What was wrong with the output.
        message: String,
    },

    /// A required CI variable is not set.
    #[error("cannot locate {name} in environment")]
    MissingEnv {
        /// The variable name.
        name: &'static str,
    },

    /// A commit hash too short to abbreviate.
    #[error("malformed commit hash: '{hash}'")]
    MalformedHash {
        /// The hash as found.
        hash: String,
    },

    /// No working copy contains the given path.
    #[error("could not locate RCS root containing '{}'", .path.display())]
    RootNotFound {
        /// Where the search started.
        path: PathBuf,
    },
}

/// Errors from resolving a parameter or rendering a template.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// No source has a value for the parameter.
    #[error("unknown parameter {name}")]
    UnknownParameter {
        /// The parameter name.
        name: String,
    },

    /// The revision control system could not supply a fact.
    #[error(transparent)]
    Rcs(#[from] RcsError),

    /// A static data value has the wrong type.
    #[error(transparent)]
    ConfigType(#[from] ConfigTypeError),

    /// A zero-filled expansion resolved to something that is not a non-negative integer.
    #[error("could not read '{value}' for {name} as integer")]
    NotAnInteger {
        /// The parameter name.
        name: String,
        /// The resolved value.
        value: String,
    },

    /// Rendering stopped at an expansion that could not be resolved.
    #[error("expansion failed for {name}: {source}")]
    Expansion {
        /// The parameter name.
        name: String,
        /// Why it failed.
        source: Box<ResolveError>,
    },
}

/// A static data value could not be coerced to the requested type.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("cannot convert '{name}' to {expected}: {value}")]
pub struct ConfigTypeError {
    /// The data field.
    pub name: String,
    /// The value as found.
    pub value: String,
    /// The wanted type, e.g. `an int`.
    pub expected: &'static str,
}

/// Errors from reading, validating or writing the project configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("{}: {source}", .path.display())]
    Io {
        /// The config file.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The file is not valid JSON or does not have the expected shape.
    #[error("{}: {source}", .path.display())]
    Json {
        /// The config file.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },

    /// The config has no branch rules.
    #[error("config must contain at least one branch expression")]
    NoBranches,

    /// A branch rule has an empty pattern.
    #[error("branch pattern required")]
    PatternRequired,

    /// A branch rule has an empty template.
    #[error("version template required")]
    TemplateRequired,

    /// A branch pattern does not compile.
    #[error(transparent)]
    MalformedPattern(#[from] PatternError),

    /// A branch template does not parse.
    #[error("version template '{template}' is malformed")]
    MalformedTemplate {
        /// The template text.
        template: String,
        /// Why it does not parse.
        source: TemplateError,
    },

    /// A branch template references `version`.
    #[error("{{version}} cannot be contained in the version template")]
    VersionSelfReference,

    /// A required data field is absent.
    #[error("data field '{name}' is not defined")]
    MissingData {
        /// The data field.
        name: String,
    },

    /// A data field has the wrong type.
    #[error(transparent)]
    ConfigType(#[from] ConfigTypeError),

    /// No version file was given and none was found.
    #[error("could not locate version file: {message}")]
    VersionFileNotFound {
        /// Where the search looked.
        message: String,
    },
}

/// Errors from one full pass of computing a version.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StampError {
    /// A branch pattern does not compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// No branch rule matched.
    #[error(transparent)]
    NoMatch(#[from] NoMatch),

    /// The selected template does not parse.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A parameter could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_error_in_template() {
        let err = TemplateError::Tokenize {
            source: TokenizeError::UnknownEscape,
            template: r"\x".to_string(),
        };
        assert_eq!(r"unknown escape code in template '\x'", err.to_string());
    }

    #[test]
    fn test_no_match_message() {
        let err = NoMatch {
            branch: "feature/foo".to_string(),
        };
        assert_eq!(
            "no branch config matching branch 'feature/foo'",
            err.to_string()
        );
    }

    #[test]
    fn test_expansion_wraps_cause() {
        let err = ResolveError::Expansion {
            name: "commit-hash".to_string(),
            source: Box::new(
                RcsError::Unsupported {
                    rcs: "svn",
                    fact: "commit-hash",
                }
                .into(),
            ),
        };
        assert_eq!(
            "expansion failed for commit-hash: svn does not support commit-hash",
            err.to_string()
        );
    }

    #[test]
    fn test_self_reference_message() {
        assert_eq!(
            "{version} cannot be contained in the version template",
            ConfigError::VersionSelfReference.to_string()
        );
    }
}
