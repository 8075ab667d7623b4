//! Per-test fixture helper
//!
//! A [`Fixture`] is what a test case sees of the world: its input directory (source files and expectation
//! files, never written), its output directory (working directory of every command it runs), the resolved
//! [`Config`], and the [`CommandRunner`] that executes tools.
//!
//! All commands run with the output directory as their working directory, passed explicitly; the harness
//! process itself never changes directory.

use std::fs;
use std::path::{Path, PathBuf};

use hazard_outputs::{
    CallEdge, Hazard, OutputError, content_lines, parse_callgraph, parse_function_list, parse_hazards,
};

use crate::analysis::{CALLGRAPH_FILE, HAZARDS_FILE, Phase, phase_range};
use crate::cli::test_interfaces::{CaseError, CommandOutput, CommandRunner, CommandSpec};
use crate::config::Config;

/// Environment marker telling the analysis scripts they run under the test harness.
pub const INTERNAL_TESTS_ENV: &str = "HAZARD_RUN_INTERNAL_TESTS";

/// Paths, configuration and tool access for one test.
pub struct Fixture<'a> {
    pub name: String,
    pub indir: PathBuf,
    pub outdir: PathBuf,
    pub config: &'a Config,
    runner: &'a dyn CommandRunner,
}

impl<'a> Fixture<'a> {
    pub fn new(
        name: impl Into<String>,
        indir: impl Into<PathBuf>,
        outdir: impl Into<PathBuf>,
        config: &'a Config,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            name: name.into(),
            indir: indir.into(),
            outdir: outdir.into(),
            config,
            runner,
        }
    }

    /// Path of a file in the input directory.
    pub fn infile(&self, path: impl AsRef<Path>) -> PathBuf {
        self.indir.join(path)
    }

    /// Path of a file in the output directory.
    pub fn outfile(&self, path: impl AsRef<Path>) -> PathBuf {
        self.outdir.join(path)
    }

    /// Path of a sixgill tool.
    pub fn binpath(&self, prog: &str) -> PathBuf {
        self.config.binpath(prog)
    }

    /// A command rooted in the output directory with the harness environment set.
    pub fn command(&self, program: impl Into<PathBuf>) -> CommandSpec {
        CommandSpec::new(program)
            .current_dir(&self.outdir)
            .env(INTERNAL_TESTS_ENV, "1")
    }

    /// Run a command, turning an unsuccessful exit into `CaseError::Subprocess`.
    ///
    /// ## Errors
    ///
    /// - `CaseError::Io` if the program could not be started.
    /// - `CaseError::Subprocess` if it exited unsuccessfully.
    pub fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CaseError> {
        let output = self.runner.run(spec).map_err(|source| CaseError::Io {
            path: spec.program.clone(),
            source,
        })?;
        if output.is_success() {
            Ok(output)
        } else {
            Err(CaseError::Subprocess {
                command: spec.to_string(),
                status: output.status_text(),
            })
        }
    }

    /// Compile an input source file with the sixgill plugin loaded.
    ///
    /// `-fno-exceptions` is added unless `options` already chooses an exception mode.
    pub fn compile(&self, source: &str, options: &[&str]) -> Result<(), CaseError> {
        let plugin = format!("-fplugin={}", self.config.sixgill_plugin.display());
        let mut spec = self
            .command(&self.config.cxx)
            .arg("-c")
            .arg(self.infile(source))
            .args(["-O3", "-std=c++17"])
            .arg(plugin)
            .arg("-fplugin-arg-xgill-mangle=1")
            .args(options)
            .env("CCACHE_DISABLE", "1");
        if !options.iter().any(|o| *o == "-fexceptions" || *o == "-fno-exceptions") {
            spec = spec.arg("-fno-exceptions");
        }
        self.run(&spec)?;
        Ok(())
    }

    /// Run the analysis phases `first` through `last` in the output directory.
    #[tracing::instrument(skip_all, fields(test = %self.name, first = %first, last = %last))]
    pub fn run_analysis(&self, first: Phase, last: Phase) -> Result<(), CaseError> {
        for phase in phase_range(first, last) {
            tracing::debug!(phase = %phase, "running analysis phase");
            let spec = self
                .command(&self.config.js)
                .arg(self.config.analysis_dir.join(phase.script()))
                .args(phase.args());
            let output = self.run(&spec)?;
            if let Some(file) = phase.stdout_file() {
                let path = self.outfile(file);
                fs::write(&path, output.stdout).map_err(|source| CaseError::Io { path, source })?;
            }
        }
        Ok(())
    }

    /// Compute only the GC type information.
    pub fn compute_gc_types(&self) -> Result<(), CaseError> {
        self.run_analysis(Phase::GcTypes, Phase::GcTypes)
    }

    /// Run the whole pipeline through the hazard report.
    pub fn compute_hazards(&self) -> Result<(), CaseError> {
        self.run_analysis(Phase::Callgraph, Phase::Hazards)
    }

    /// Keys stored in a sixgill database (`<db>.xdb`) of the output directory.
    pub fn db_keys(&self, db: &str) -> Result<Vec<String>, CaseError> {
        let spec = self.command(self.binpath("xdbkeys")).arg(format!("{}.xdb", db));
        let output = self.run(&spec)?;
        Ok(output.stdout.lines().map(str::to_string).collect())
    }

    /// Read a file from the output directory.
    pub fn read_output(&self, file: &str) -> Result<String, CaseError> {
        read_file(&self.outfile(file))
    }

    /// Non-blank lines of an output file, trimmed.
    pub fn load_text_lines(&self, file: &str) -> Result<Vec<String>, CaseError> {
        Ok(non_blank_lines(&self.read_output(file)?))
    }

    /// Hazards from the hazard report.
    pub fn load_hazards(&self) -> Result<Vec<Hazard>, CaseError> {
        let text = self.read_output(HAZARDS_FILE)?;
        parse_hazards(&text).map_err(|source| self.output_error(HAZARDS_FILE, source))
    }

    /// Readable function names from a function list.
    pub fn load_function_list(&self, file: &str) -> Result<Vec<String>, CaseError> {
        Ok(parse_function_list(&self.read_output(file)?))
    }

    /// Direct call edges from the callgraph.
    pub fn load_callgraph(&self) -> Result<Vec<CallEdge>, CaseError> {
        let text = self.read_output(CALLGRAPH_FILE)?;
        parse_callgraph(&text).map_err(|source| self.output_error(CALLGRAPH_FILE, source))
    }

    /// Entries of an expectation file in the input directory, skipping blank and `#` lines.
    pub fn expected_lines(&self, file: &str) -> Result<Vec<String>, CaseError> {
        let text = read_file(&self.infile(file))?;
        Ok(content_lines(&text).map(|(_, line)| line.to_string()).collect())
    }

    fn output_error(&self, file: &str, source: OutputError) -> CaseError {
        CaseError::Output {
            path: self.outfile(file),
            source,
        }
    }
}

fn read_file(path: &Path) -> Result<String, CaseError> {
    fs::read_to_string(path).map_err(|source| CaseError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn non_blank_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
