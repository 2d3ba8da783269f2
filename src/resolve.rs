use crate::{
    branch::{BranchMatcher, BranchRule, CaptureBindings},
    config::{data_string, Config, DataMap},
    error::{RcsError, ResolveError, StampError},
    rcs::{Fact, Rcs},
    template::Template,
};
use std::collections::HashMap;

/// A source of environment variables.
pub trait Environment {
    /// The value of variable `name`, if set and valid unicode.
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// The environment variable conventionally used for a parameter, e.g. `COMMIT_COUNTER` for
/// `commit-counter`.
pub fn env_var_name(parameter: &str) -> String {
    parameter.to_uppercase().replace('-', "_")
}

/// Capture group names cannot hold `-`, so `build-id` is bound as `build_id`.
fn binding_name(parameter: &str) -> String {
    parameter.replace('-', "_")
}

type RcsOpener<'c, R> = Box<dyn Fn() -> Result<R, RcsError> + 'c>;

/// The state of one resolution run: caller overrides and memoized values, the matched branch's
/// captures and data, the project config, and a lazily opened RCS.
///
/// Parameters are resolved from, in order:
///
/// 1. values already known to the context (overrides and earlier results),
/// 2. an environment variable named exactly like the parameter,
/// 3. an environment variable named per [`env_var_name`],
/// 4. the matched branch's named captures,
/// 5. facts derived from the RCS (see [`Fact`]),
/// 6. the matched branch rule's data,
/// 7. the project data.
///
/// Every value found is remembered for the rest of the run, so each RCS fact is queried at most
/// once and only if some parameter needs it.
pub struct ResolutionContext<'c, R: Rcs> {
    known: HashMap<String, String>,
    bindings: CaptureBindings,
    branch_data: Option<&'c DataMap>,
    config: &'c Config,
    env: &'c dyn Environment,
    rcs: Option<Result<R, RcsError>>,
    open_rcs: RcsOpener<'c, R>,
}

impl<'c, R: Rcs> ResolutionContext<'c, R> {
    /// Creates a context. `open_rcs` is called at most once, the first time an RCS fact is needed.
    pub fn new<F>(config: &'c Config, env: &'c dyn Environment, open_rcs: F) -> Self
    where
        F: Fn() -> Result<R, RcsError> + 'c,
    {
        Self {
            known: HashMap::new(),
            bindings: CaptureBindings::new(),
            branch_data: None,
            config,
            env,
            rcs: None,
            open_rcs: Box::new(open_rcs),
        }
    }

    /// Adds caller-supplied values, which take precedence over every other source.
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.known
            .extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Records a value for `name`, as if it had been supplied by the caller.
    pub fn insert(&mut self, name: &str, value: &str) {
        self.known.insert(name.to_string(), value.to_string());
    }

    /// Makes `rule`'s data and `bindings` available to later lookups.
    pub fn select_branch(&mut self, rule: &'c BranchRule, bindings: CaptureBindings) {
        self.branch_data = Some(&rule.data);
        self.bindings = bindings;
    }

    /// The captures of the selected branch rule.
    pub fn bindings(&self) -> &CaptureBindings {
        &self.bindings
    }

    /// Returns the value of parameter `name`.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::Rcs`] if `name` is an RCS fact and the RCS could not provide it.
    /// - [`ResolveError::UnknownParameter`] if no source has a value for `name`.
    pub fn resolve(&mut self, name: &str) -> Result<String, ResolveError> {
        if let Some(value) = self.known.get(name) {
            return Ok(value.clone());
        }
        let value = self.lookup(name)?;
        self.known.insert(name.to_string(), value.clone());
        Ok(value)
    }

    fn lookup(&mut self, name: &str) -> Result<String, ResolveError> {
        if let Some(value) = self.env.var(name) {
            return Ok(value);
        }
        if let Some(value) = self.env.var(&env_var_name(name)) {
            return Ok(value);
        }
        if let Some(value) = self.bindings.get(&binding_name(name)) {
            return Ok(value.clone());
        }
        if let Some(fact) = Fact::from_name(name) {
            return Ok(fact.fetch(self.rcs()?)?);
        }
        if let Some(value) = self.branch_data.and_then(|data| data_string(data, name)) {
            return Ok(value);
        }
        data_string(&self.config.data, name).ok_or_else(|| ResolveError::UnknownParameter {
            name: name.to_string(),
        })
    }

    fn rcs(&mut self) -> Result<&R, RcsError> {
        let open_rcs = &self.open_rcs;
        self.rcs
            .get_or_insert_with(|| open_rcs())
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Computes the version: resolves `branch`, selects the first matching branch rule, and
    /// renders its template.
    pub fn stamp(&mut self) -> Result<String, StampError> {
        let config = self.config;
        let branch = self.resolve(Fact::Branch.name())?;
        let (rule, bindings) = BranchMatcher::new(&config.branches)?.match_branch(&branch)?;
        self.select_branch(rule, bindings);

        let template = Template::parse(&rule.template)?;
        Ok(template.render(|name| self.resolve(name))?)
    }
}
