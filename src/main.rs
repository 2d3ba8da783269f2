use branchver::{
    locate_version_file, Config, ConfigError, Level, Preset, ProcessEnv, RcsBackend, RcsKind,
    ResolutionContext, ResolveError, StampError, VERSION_PARAMETER,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

// Commands to support:
//
// - init / test-config: create and check a version file
// - show / data-file: compute the version for the current branch
// - bump-major / bump-minor / bump-release: edit the stored counters

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("version file required")]
    VersionFileRequired,

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Stamp(#[from] StampError),

    #[error("{0}")]
    Resolve(#[from] ResolveError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum, Debug)]
enum PresetArg {
    Default,
    Semvar,
    Python,
}

impl PresetArg {
    fn to_preset(self) -> Preset {
        match self {
            PresetArg::Default => Preset::Default,
            PresetArg::Semvar => Preset::Semvar,
            PresetArg::Python => Preset::Python,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum, Debug)]
enum RcsArg {
    Git,
    Svn,
    Travis,
}

impl RcsArg {
    fn to_kind(self) -> RcsKind {
        match self {
            RcsArg::Git => RcsKind::Git,
            RcsArg::Svn => RcsKind::Svn,
            RcsArg::Travis => RcsKind::Travis,
        }
    }
}

/// Parses a `-X name=value` option. The value may itself contain `=`.
fn parse_option(option: &str) -> Result<(String, String), String> {
    match option.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("cannot parse option '{option}'")),
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The version file. Defaults to the nearest `version.json` in the current directory or its
    /// parents.
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Log what is being looked up and run.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Writes a starter version file to `--file`
    Init {
        /// The starter configuration
        #[arg(long, value_enum, default_value_t = PresetArg::Default)]
        template: PresetArg,

        /// The revision control system, for picking extra data-file fields. Detected when omitted.
        #[arg(long, value_enum)]
        rcs: Option<RcsArg>,
    },

    /// Checks that the version file is valid
    TestConfig,

    /// Prints the version for the current branch
    Show {
        /// Sets a parameter, overriding every other source. May be repeated.
        #[arg(short = 'X', long = "option", value_name = "NAME=VALUE", value_parser = parse_option)]
        options: Vec<(String, String)>,
    },

    /// Writes the version and the version file's `data-file` fields as JSON
    DataFile {
        /// Sets a parameter, overriding every other source. May be repeated.
        #[arg(short = 'X', long = "option", value_name = "NAME=VALUE", value_parser = parse_option)]
        options: Vec<(String, String)>,

        /// Where to write the JSON. Printed when omitted.
        #[arg(short = 'o', long)]
        data_file: Option<PathBuf>,
    },

    /// Increments `major` and resets `minor` and `release`
    BumpMajor,

    /// Increments `minor` and resets `release`
    BumpMinor,

    /// Increments `release`
    BumpRelease,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match do_work(cli) {
        Ok(Some(output)) => println!("{output}"),
        Ok(None) => {}
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn version_file(file: Option<&Path>) -> Result<PathBuf, CliError> {
    let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
        path: PathBuf::from("."),
        source,
    })?;
    Ok(locate_version_file(file, &cwd)?)
}

fn context<'c>(
    config: &'c Config,
    version_file: &'c Path,
    options: Vec<(String, String)>,
) -> ResolutionContext<'c, RcsBackend> {
    ResolutionContext::new(config, &ProcessEnv, move || {
        RcsBackend::detect(version_file, &ProcessEnv)
    })
    .with_overrides(options)
}

fn do_work(cli: Cli) -> Result<Option<String>, CliError> {
    let file = cli.file.as_deref();
    match cli.command {
        Commands::Init { template, rcs } => {
            let path = file.ok_or(CliError::VersionFileRequired)?;
            init(path, template.to_preset(), rcs.map(RcsArg::to_kind))?;
            Ok(None)
        }
        Commands::TestConfig => {
            Config::load(&version_file(file)?)?;
            Ok(None)
        }
        Commands::Show { options } => {
            let path = version_file(file)?;
            let config = Config::load(&path)?;
            let version = context(&config, &path, options).stamp()?;
            Ok(Some(version))
        }
        Commands::DataFile { options, data_file } => {
            let path = version_file(file)?;
            let config = Config::load(&path)?;
            let mut ctx = context(&config, &path, options);
            let version = ctx.stamp()?;
            ctx.insert(VERSION_PARAMETER, &version);

            let data = config
                .data_file_fields
                .iter()
                .map(|field| ctx.resolve(field).map(|value| (field.as_str(), value)))
                .collect::<Result<BTreeMap<_, _>, ResolveError>>()?;
            let json = serde_json::to_string_pretty(&data)?;

            match data_file {
                Some(out) => {
                    debug!(path = %out.display(), "writing data file");
                    fs::write(&out, json + "\n")
                        .map_err(|source| CliError::Write { path: out, source })?;
                    Ok(None)
                }
                None => Ok(Some(json)),
            }
        }
        Commands::BumpMajor => bump(file, Level::Major),
        Commands::BumpMinor => bump(file, Level::Minor),
        Commands::BumpRelease => bump(file, Level::Release),
    }
}

fn init(path: &Path, preset: Preset, rcs: Option<RcsKind>) -> Result<(), CliError> {
    let mut config = preset.config();
    let rcs = rcs.or_else(|| {
        // a missing or unrecognised working copy only means no extra fields
        let start = path.parent().filter(|dir| dir.is_dir())?;
        RcsBackend::detect(start, &ProcessEnv)
            .map(|backend| backend.kind())
            .ok()
    });
    if let Some(kind) = rcs {
        config
            .data_file_fields
            .extend(kind.data_file_fields().iter().map(|f| f.to_string()));
    }
    config.save(path)?;
    Ok(())
}

fn bump(file: Option<&Path>, level: Level) -> Result<Option<String>, CliError> {
    let path = version_file(file)?;
    let mut config = Config::load(&path)?;
    config.bump(level)?;
    debug!(level = level.name(), "bumped");
    config.save(&path)?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchver::BranchRule;
    use rstest::rstest;

    #[rstest]
    #[case("branch=master", ("branch", "master"))]
    #[case("x=", ("x", ""))]
    #[case("x=a=b", ("x", "a=b"))]
    fn test_parse_option(#[case] option: &str, #[case] expected: (&str, &str)) {
        assert_eq!(
            Ok((expected.0.to_string(), expected.1.to_string())),
            parse_option(option)
        );
    }

    #[rstest]
    #[case("branch")]
    #[case("=master")]
    fn test_parse_option_err(#[case] option: &str) {
        assert_eq!(
            Err(format!("cannot parse option '{option}'")),
            parse_option(option)
        );
    }

    #[test]
    fn test_cli_show_options() {
        let cli = Cli::try_parse_from([
            "branchver",
            "show",
            "-X",
            "branch=master",
            "--option",
            "commit-counter=7",
        ])
        .unwrap();
        match cli.command {
            Commands::Show { options } => assert_eq!(
                vec![
                    ("branch".to_string(), "master".to_string()),
                    ("commit-counter".to_string(), "7".to_string())
                ],
                options
            ),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_option() {
        assert!(Cli::try_parse_from(["branchver", "show", "-X", "nonsense"]).is_err());
    }

    #[test]
    fn test_show_and_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("version.json");
        let mut config = Preset::Python.config();
        config.branches.insert(
            0,
            BranchRule::new(r"release-(?P<rc>\d+)", "{major}.{minor}.{release}rc{rc}"),
        );
        config.save(&path).unwrap();

        let run = |args: &[&str]| {
            let mut argv = vec!["branchver", "-f", path.to_str().unwrap()];
            argv.extend_from_slice(args);
            do_work(Cli::try_parse_from(argv).unwrap())
        };

        let shown = run(&["show", "-X", "branch=release-4"]).unwrap();
        assert_eq!(Some("0.0.1rc4".to_string()), shown);

        let shown = run(&["show", "-X", "branch=topic", "-X", "commit-counter=12"]).unwrap();
        assert_eq!(Some("0.0.1dev12".to_string()), shown);

        let out = dir.path().join("data.json");
        let written = run(&[
            "data-file",
            "-X",
            "branch=trunk",
            "-X",
            "commit-counter=3",
            "-o",
            out.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(None, written);
        let data: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!("0.0.1", data["version"]);
        assert_eq!("trunk", data["branch"]);
        assert_eq!("3", data["commit-counter"]);
        assert_eq!("1", data["release"]);
    }

    #[test]
    fn test_init_and_bump() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("version.json");
        init(&path, Preset::Semvar, Some(RcsKind::Git)).unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config
            .data_file_fields
            .contains(&"commit-hash-short".to_string()));

        bump(Some(&path), Level::Minor).unwrap();
        bump(Some(&path), Level::Release).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(0, config.data_int("major").unwrap());
        assert_eq!(1, config.data_int("minor").unwrap());
        assert_eq!(1, config.data_int("release").unwrap());
    }
}
