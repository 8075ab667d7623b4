//! Harness configuration
//!
//! The command line (and its environment fallbacks) is collected into [`ConfigArgs`], which
//! [`configure`] resolves into an immutable [`Config`]. Every path in a `Config` is either supplied
//! explicitly or derived from one other setting, so the record is complete before any test runs.
//!
//! Commands run inside per-test output directories, so every resolved path is absolute. Bare program
//! names (`gcc`, `js`) are left for the `PATH` search.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Tests run when none are named on the command line.
pub const DEFAULT_TESTS: [&str; 6] = ["sixgill-tree", "suppression", "hazards", "exceptions", "virtual", "graph"];

/// Directory holding the per-test fixtures when `--test-root` is not given.
pub const DEFAULT_TEST_ROOT: &str = "t";

/// Directory under the test root that receives per-test output directories.
pub const OUTPUT_DIR_NAME: &str = "out";

/// Errors that stop the harness before any test runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Must specify JS binary through environment variable or --js option")]
    MissingJs,

    #[error("cannot resolve path '{}': {source}", path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Unresolved settings, as given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigArgs {
    pub js: Option<PathBuf>,
    pub sixgill: Option<PathBuf>,
    pub sixgill_bin: Option<PathBuf>,
    pub sixgill_plugin: Option<PathBuf>,
    pub gccdir: Option<PathBuf>,
    pub cc: Option<PathBuf>,
    pub cxx: Option<PathBuf>,
    pub test_root: Option<PathBuf>,
    pub verbose: bool,
}

/// Fully resolved harness configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// JS shell used for the capability check and the analysis phases
    pub js: PathBuf,
    /// Root of the sixgill installation
    pub sixgill: PathBuf,
    /// Directory holding the sixgill tools (`xdbkeys`, `xdbfind`, ...)
    pub sixgill_bin: PathBuf,
    /// The sixgill GCC plugin
    pub sixgill_plugin: PathBuf,
    pub cc: PathBuf,
    pub cxx: PathBuf,
    /// Directory holding one fixture directory per test
    pub test_root: PathBuf,
    /// Directory holding the analysis phase scripts
    pub analysis_dir: PathBuf,
    pub verbose: bool,
}

impl Config {
    /// Root of the per-test output directories.
    pub fn output_root(&self) -> PathBuf {
        self.test_root.join(OUTPUT_DIR_NAME)
    }

    /// Full path of a sixgill tool.
    pub fn binpath(&self, prog: &str) -> PathBuf {
        self.sixgill_bin.join(prog)
    }
}

/// Resolve command-line settings into a [`Config`].
///
/// ## Resolution order
///
/// 1. The JS shell is mandatory.
/// 2. Unset compilers come from `<gccdir>/bin` when a GCC directory is given, else `gcc` / `g++` on `PATH`.
/// 3. An unset sixgill bin directory is `<sixgill>/usr/bin`.
/// 4. An unset sixgill plugin is `<sixgill>/usr/libexec/sixgill/gcc/xgill.so`.
///
/// ## Errors
///
/// - `ConfigError::MissingJs` if no JS shell was given.
/// - `ConfigError::Resolve` if a relative path cannot be made absolute.
pub fn configure(args: ConfigArgs) -> Result<Config, ConfigError> {
    let js = program_path(args.js.ok_or(ConfigError::MissingJs)?)?;

    let test_root = absolute(args.test_root.unwrap_or_else(|| PathBuf::from(DEFAULT_TEST_ROOT)))?;
    let sixgill = match args.sixgill {
        Some(dir) => absolute(dir)?,
        None => test_root.join("sixgill"),
    };
    let gccdir = args.gccdir.map(absolute).transpose()?;

    let cc = match args.cc {
        Some(cc) => program_path(cc)?,
        None => compiler_path(gccdir.as_deref(), "gcc"),
    };
    let cxx = match args.cxx {
        Some(cxx) => program_path(cxx)?,
        None => compiler_path(gccdir.as_deref(), "g++"),
    };

    let sixgill_bin = match args.sixgill_bin {
        Some(dir) => absolute(dir)?,
        None => sixgill.join("usr").join("bin"),
    };
    let sixgill_plugin = match args.sixgill_plugin {
        Some(plugin) => absolute(plugin)?,
        None => sixgill
            .join("usr")
            .join("libexec")
            .join("sixgill")
            .join("gcc")
            .join("xgill.so"),
    };

    let analysis_dir = analysis_dir_for(&test_root);

    Ok(Config {
        js,
        sixgill,
        sixgill_bin,
        sixgill_plugin,
        cc,
        cxx,
        test_root,
        analysis_dir,
        verbose: args.verbose,
    })
}

fn compiler_path(gccdir: Option<&Path>, name: &str) -> PathBuf {
    match gccdir {
        Some(dir) => dir.join("bin").join(name),
        None => PathBuf::from(name),
    }
}

/// The analysis scripts live one level above the test fixtures.
fn analysis_dir_for(test_root: &Path) -> PathBuf {
    match test_root.parent() {
        Some(parent) => parent.to_path_buf(),
        None => test_root.to_path_buf(),
    }
}

fn absolute(path: PathBuf) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path);
    }
    std::path::absolute(&path).map_err(|source| ConfigError::Resolve { path, source })
}

/// Anchor programs given as paths; keep bare names for the `PATH` search.
fn program_path(program: PathBuf) -> Result<PathBuf, ConfigError> {
    if program.components().count() > 1 {
        absolute(program)
    } else {
        Ok(program)
    }
}
