use branchver::prelude::*;
use branchver::{ConfigError, Preset, VERSION_FILE_NAME, VERSION_PARAMETER};
use std::{cell::Cell, collections::HashMap, fs};

/// An RCS that counts how often it is asked for anything.
struct CountingRcs<'a> {
    branch: &'static str,
    queries: &'a Cell<usize>,
}

impl Rcs for CountingRcs<'_> {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn branch(&self) -> Result<String, RcsError> {
        self.queries.set(self.queries.get() + 1);
        Ok(self.branch.to_string())
    }

    fn commit_counter(&self) -> Result<String, RcsError> {
        self.queries.set(self.queries.get() + 1);
        Ok("42".to_string())
    }

    fn commit_hash(&self) -> Result<String, RcsError> {
        self.queries.set(self.queries.get() + 1);
        Ok("0123456789abcdef".to_string())
    }
}

const VERSION_JSON: &str = r#"{
    "data": {"major": 3, "minor": "1", "release": 2},
    "branches": [
        {"branch": "master", "version": "{major}.{minor}.{release:02d}"},
        {"branch": "feature/(?P<topic>[a-z]+)", "version": "{major}.{minor}.dev{commit-counter}+{topic}"},
        {"branch": ".*", "version": "{major}.{minor}-{suffix}", "data": {"suffix": "snapshot"}}
    ],
    "data-file": ["version", "branch", "commit-hash"]
}"#;

fn load(dir: &tempfile::TempDir) -> Config {
    let path = dir.path().join(VERSION_FILE_NAME);
    fs::write(&path, VERSION_JSON).unwrap();
    Config::load(&path).unwrap()
}

#[test]
fn stamp_from_version_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = load(&dir);
    let env: HashMap<String, String> = HashMap::new();
    let queries = Cell::new(0);
    let opened = Cell::new(0);

    let mut ctx = ResolutionContext::new(&config, &env, || {
        opened.set(opened.get() + 1);
        Ok(CountingRcs {
            branch: "feature/parser",
            queries: &queries,
        })
    });

    assert_eq!("3.1.dev42+parser", ctx.stamp().unwrap());
    assert_eq!("parser", ctx.bindings()["topic"]);

    // memoized: asking again touches nothing
    assert_eq!("42", ctx.resolve("commit-counter").unwrap());
    assert_eq!("feature/parser", ctx.resolve("branch").unwrap());
    assert_eq!(1, opened.get());
    assert_eq!(2, queries.get());
}

#[test]
fn data_file_fields_after_stamp() {
    let dir = tempfile::tempdir().unwrap();
    let config = load(&dir);
    let env: HashMap<String, String> = HashMap::new();
    let queries = Cell::new(0);

    let mut ctx = ResolutionContext::new(&config, &env, || {
        Ok(CountingRcs {
            branch: "master",
            queries: &queries,
        })
    });
    let version = ctx.stamp().unwrap();
    ctx.insert(VERSION_PARAMETER, &version);

    let fields = config
        .data_file_fields
        .iter()
        .map(|field| ctx.resolve(field).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(vec!["3.1.02", "master", "0123456789abcdef"], fields);
    assert_eq!(2, queries.get());
}

#[test]
fn environment_and_branch_data() {
    let dir = tempfile::tempdir().unwrap();
    let config = load(&dir);
    let env = HashMap::from([
        ("BRANCH".to_string(), "hotfix".to_string()),
        ("MINOR".to_string(), "9".to_string()),
    ]);

    let mut ctx = ResolutionContext::<CountingRcs>::new(&config, &env, || {
        Err(RcsError::RootNotFound {
            path: "/nowhere".into(),
        })
    });
    assert_eq!("3.9-snapshot", ctx.stamp().unwrap());
}

#[test]
fn rcs_failure_names_the_parameter() {
    let config = Preset::Default.config();
    let env: HashMap<String, String> = HashMap::new();

    let mut ctx = ResolutionContext::<CountingRcs>::new(&config, &env, || {
        Err(RcsError::RootNotFound {
            path: "/nowhere".into(),
        })
    })
    .with_overrides([("branch", "master")]);

    let err = ctx.stamp().unwrap_err();
    assert_eq!(
        "expansion failed for commit-counter: could not locate RCS root containing '/nowhere'",
        err.to_string()
    );
}

#[test]
fn no_matching_branch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(VERSION_FILE_NAME);
    fs::write(
        &path,
        r#"{"branches": [{"branch": "master|trunk", "version": "{branch}"}]}"#,
    )
    .unwrap();
    let config = Config::load(&path).unwrap();
    let env: HashMap<String, String> = HashMap::new();

    let mut ctx = ResolutionContext::<RcsBackend>::new(&config, &env, || {
        RcsBackend::detect(dir.path(), &env)
    })
    .with_overrides([("branch", "master-old")]);

    assert_eq!(
        Err(StampError::NoMatch(NoMatch {
            branch: "master-old".to_string()
        })),
        ctx.stamp()
    );
}

#[test]
fn self_referencing_template_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(VERSION_FILE_NAME);
    fs::write(
        &path,
        r#"{"branches": [{"branch": ".*", "version": "{version}.1"}]}"#,
    )
    .unwrap();

    assert!(matches!(
        Config::load(&path),
        Err(ConfigError::VersionSelfReference)
    ));
}
