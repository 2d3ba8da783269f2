//! # branchver
//!
//! A library for generating version strings from branch names, revision control facts, and
//! project data.
//!
//! A project describes, per branch, how its version looks. The branch currently checked out
//! selects a *template*, and the template's *parameters* are filled in from the command line, the
//! environment, the branch name itself, the revision control system, and static project data.
//!
//! ## Examples
//!
//! Render a template directly:
//!
//! ```
//! use branchver::prelude::*;
//!
//! let template = Template::parse("{major}.{minor}.{release:03d}").unwrap();
//! let version = template
//!     .render(|name| {
//!         Ok(match name {
//!             "major" => "1",
//!             "minor" => "4",
//!             _ => "7",
//!         }
//!         .to_string())
//!     })
//!     .unwrap();
//! assert_eq!("1.4.007", version);
//! ```
//!
//! Or compute a version from a project configuration, overriding the branch so no revision
//! control system is consulted:
//!
//! ```
//! use branchver::prelude::*;
//! use std::collections::HashMap;
//!
//! let config: Config = serde_json::from_str(r#"{
//!     "data": {"major": 2, "minor": 1},
//!     "branches": [
//!         {"branch": "release-(?P<rc>\\d+)", "version": "{major}.{minor}rc{rc}"},
//!         {"branch": ".*", "version": "{major}.{minor}.dev0"}
//!     ]
//! }"#).unwrap();
//!
//! let env: HashMap<String, String> = HashMap::new();
//! let mut ctx = ResolutionContext::<RcsBackend>::new(&config, &env, || {
//!     RcsBackend::detect(".".as_ref(), &ProcessEnv)
//! })
//! .with_overrides([("branch", "release-3")]);
//!
//! assert_eq!("2.1rc3", ctx.stamp().unwrap());
//! ```
//!
//! ## Important Terms
//!
//! - **Template**: A string describing a version, made of *literal text* and *expansions*. It's
//!   modeled by the [`Template`] struct.
//! - **Parameter**: A name an expansion refers to, like `major` or `commit-counter`.
//! - **Branch rule**: A regular expression over branch names paired with a template. It's modeled
//!   by the [`BranchRule`] struct.
//!
//! ## Template Syntax
//!
//! | Syntax | Example | Meaning |
//! |---|---|---|
//! | `{name}` | `{major}` | The value of parameter `name`. |
//! | `{name:0Wd}` | `{release:02d}` | The value of `name` as an integer, zero-padded to at least `W` digits (`W` is `0`–`9`). |
//! | `\{` | `\{literal}` | A literal `{`. |
//! | `\\` | `a\\b` | A literal `\`. |
//!
//! Parameter names start with a letter and continue with letters, digits, and `-`. Any other
//! escape, or any other content between braces, is an error.
//!
//! ## Branch Rules
//!
//! Branch patterns are matched against the *whole* branch name, so `master|trunk` does not match
//! `master-old`. Rules are tried in order and the **first** match wins: put catch-alls like `.*`
//! last.
//!
//! Named capture groups become parameters. Since group names cannot contain `-`, the parameter
//! `build-id` is looked up as group `build_id`.
//!
//! ```
//! use branchver::prelude::*;
//!
//! let rules = [
//!     BranchRule::new(r"release-RC(?P<rc>\d+)", "{major}.{minor}rc{rc}"),
//!     BranchRule::new(".*", "{major}.{minor}.dev{commit-counter}"),
//! ];
//! let matcher = BranchMatcher::new(&rules).unwrap();
//! let (rule, bindings) = matcher.match_branch("release-RC2").unwrap();
//! assert_eq!(&rules[0], rule);
//! assert_eq!("2", bindings["rc"]);
//! ```
//!
//! ## Parameter Sources
//!
//! A parameter is looked up in these places, and the first hit wins:
//!
//! 1. values given by the caller, or already resolved during this run,
//! 2. an environment variable with the parameter's exact name,
//! 3. an environment variable with the parameter's upper-cased name, `-` replaced by `_`
//!    (`commit-counter` → `COMMIT_COUNTER`),
//! 4. the matched branch's named captures,
//! 5. a revision control fact: `branch`, `commit-counter`, `repo-counter`, `commit-hash`,
//!    `commit-hash-short`, `repo-root`,
//! 6. the matched branch rule's `data`,
//! 7. the project's `data`.
//!
//! ## Prelude
//!
//! branchver provides a prelude module for convenience. Use it with:
//!
//! ```
//! use branchver::prelude::*;
//! ```
#![warn(missing_docs)]

mod branch;
mod config;
mod error;
mod paths;
mod rcs;
mod resolve;
mod template;
mod token;

pub use crate::branch::{BranchMatcher, BranchRule, CaptureBindings};
pub use crate::config::{
    locate_version_file, validate_version_template, Config, DataMap, Level, Preset, Value,
    VERSION_FILE_NAME,
};
pub use crate::error::{
    ConfigError, ConfigTypeError, NoMatch, PatternError, RcsError, ResolveError, StampError,
    TemplateError, TokenizeError,
};
pub use crate::rcs::{Fact, Git, Rcs, RcsBackend, RcsKind, Svn, Travis};
pub use crate::resolve::{env_var_name, Environment, ProcessEnv, ResolutionContext};
pub use crate::template::{Node, Template, VERSION_PARAMETER};

/// A convenience module appropriate for glob imports (`use branchver::prelude::*;`).
pub mod prelude {
    #[doc(no_inline)]
    pub use crate::BranchMatcher;
    #[doc(no_inline)]
    pub use crate::BranchRule;
    #[doc(no_inline)]
    pub use crate::CaptureBindings;
    #[doc(no_inline)]
    pub use crate::Config;
    #[doc(no_inline)]
    pub use crate::ConfigError;
    #[doc(no_inline)]
    pub use crate::Environment;
    #[doc(no_inline)]
    pub use crate::NoMatch;
    #[doc(no_inline)]
    pub use crate::ProcessEnv;
    #[doc(no_inline)]
    pub use crate::Rcs;
    #[doc(no_inline)]
    pub use crate::RcsBackend;
    #[doc(no_inline)]
    pub use crate::RcsError;
    #[doc(no_inline)]
    pub use crate::ResolutionContext;
    #[doc(no_inline)]
    pub use crate::ResolveError;
    #[doc(no_inline)]
    pub use crate::StampError;
    #[doc(no_inline)]
    pub use crate::Template;
    #[doc(no_inline)]
    pub use crate::TemplateError;
}
