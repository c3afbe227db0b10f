//! Build-tool command lines for the Scala generators.

use std::fmt;
use std::path::PathBuf;

use crate::error::ProcessError;
use crate::process::{invoke, InvokeOptions};

/// One run of a generator entry point through the build tool.
///
/// With sbt the whole `runMain` invocation is a single argument:
/// `sbt "runMain <entry> <args...>"`, run from the generator checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorCommand {
    /// Build tool executable, normally `sbt`.
    pub build_tool: String,
    /// Fully qualified main class, e.g. `vexiiriscv.soc.litex.SocGen`.
    pub entry_point: String,
    /// Generator arguments.
    pub args: Vec<String>,
    /// Generator checkout the build tool runs in.
    pub working_dir: PathBuf,
}

impl GeneratorCommand {
    /// Creates a command with no arguments.
    pub fn new(
        build_tool: impl Into<String>,
        entry_point: impl Into<String>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            build_tool: build_tool.into(),
            entry_point: entry_point.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
        }
    }

    /// Appends generator arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The `runMain ...` task string passed to the build tool.
    pub fn task(&self) -> String {
        let mut task = format!("runMain {}", self.entry_point);
        for arg in &self.args {
            task.push(' ');
            task.push_str(&quote(arg));
        }
        task
    }

    /// The program and its arguments as passed to [`invoke`].
    pub fn argv(&self) -> Vec<String> {
        vec![self.build_tool.clone(), self.task()]
    }

    /// Runs the command in its working directory.
    pub fn run(&self, options: &InvokeOptions) -> Result<(), ProcessError> {
        if !self.working_dir.is_dir() {
            return Err(ProcessError::MissingResource {
                path: self.working_dir.clone(),
                what: "generator checkout".to_string(),
            });
        }
        log::info!("generator command: {self}");
        invoke(&self.argv(), &self.working_dir, options)
    }
}

impl fmt::Display for GeneratorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cd {} && {} \"{}\"",
            self.working_dir.display(),
            self.build_tool,
            self.task().replace('\\', "\\\\").replace('"', "\\\"")
        )
    }
}

/// Double-quotes `arg` for the build tool's own command parser when it
/// contains whitespace or quotes.
fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"') {
        format!("\"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn socgen() -> GeneratorCommand {
        GeneratorCommand::new("sbt", "vexiiriscv.soc.litex.SocGen", "/ext/VexiiRiscv")
            .args(["--cpu-count=2", "--with-dma"])
    }

    #[test]
    fn task_string() {
        assert_eq!(
            socgen().task(),
            "runMain vexiiriscv.soc.litex.SocGen --cpu-count=2 --with-dma"
        );
    }

    #[test]
    fn argv_passes_task_as_one_argument() {
        let argv = socgen().argv();
        assert_eq!(argv.len(), 2);
        assert_eq!(argv[0], "sbt");
        assert!(argv[1].starts_with("runMain "));
    }

    #[test]
    fn whitespace_arguments_are_quoted() {
        let cmd = GeneratorCommand::new("sbt", "Main", "/w").args(["--video", "name=a width=8"]);
        assert_eq!(cmd.task(), "runMain Main --video \"name=a width=8\"");
    }

    #[test]
    fn display_is_a_shell_line() {
        assert_eq!(
            socgen().to_string(),
            "cd /ext/VexiiRiscv && sbt \"runMain vexiiriscv.soc.litex.SocGen --cpu-count=2 --with-dma\""
        );
    }

    #[test]
    fn missing_checkout_is_missing_resource() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = GeneratorCommand::new("sbt", "Main", dir.path().join("VexRiscv"));
        let err = cmd.run(&InvokeOptions::default()).unwrap_err();
        assert!(matches!(err, ProcessError::MissingResource { .. }));
    }
}
