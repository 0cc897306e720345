//! Invocation of external command-line tools: the HEG swath converter and
//! `gdal_translate` for KML superoverlays.
//!
//! Tool environment (working directory, `MRTBINDIR`, `PGSHOME`, `MRTDATADIR`)
//! is attached to the child process only; the parent's environment and
//! current directory are never modified.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{Error, Result};

/// One fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: Option<PathBuf>,
    pub env: Vec<(String, OsString)>,
}

impl ToolInvocation {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: Vec::new(),
        }
    }

    pub fn arg<S: Into<OsString>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env<V: Into<OsString>>(mut self, key: &str, value: V) -> Self {
        self.env.push((key.to_string(), value.into()));
        self
    }

    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// Runs a [`ToolInvocation`] to completion and reports its exit code
/// (`None` when terminated by a signal).
pub trait ToolInvoker {
    fn invoke(&self, invocation: &ToolInvocation) -> Result<Option<i32>>;
}

/// Blocking subprocess execution, no timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

impl ToolInvoker for ProcessInvoker {
    fn invoke(&self, invocation: &ToolInvocation) -> Result<Option<i32>> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }
        for (key, value) in &invocation.env {
            command.env(key, value);
        }
        debug!("Running {:?}", command);
        let status = command.status()?;
        Ok(status.code())
    }
}

/// Run an invocation and turn a non-zero exit into [`Error::ExternalTool`].
pub fn run_checked(invoker: &dyn ToolInvoker, invocation: &ToolInvocation) -> Result<()> {
    let tool = invocation.tool_name();
    match invoker.invoke(invocation)? {
        Some(0) => {
            info!("{} executed successfully", tool);
            Ok(())
        }
        code => Err(Error::ExternalTool { tool, code }),
    }
}

/// Directories the HEG toolkit reads from its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HegEnvironment {
    pub working_dir: PathBuf,
    pub mrtbindir: PathBuf,
    pub pgshome: PathBuf,
    pub mrtdatadir: PathBuf,
}

/// `swtif -p <parameter_file>` inside the HEG environment.
pub fn swath_conversion(program: &Path, parameter_file: &Path, env: &HegEnvironment) -> ToolInvocation {
    ToolInvocation::new(program)
        .arg("-p")
        .arg(parameter_file)
        .current_dir(&env.working_dir)
        .env("MRTBINDIR", &env.mrtbindir)
        .env("PGSHOME", &env.pgshome)
        .env("MRTDATADIR", &env.mrtdatadir)
}

/// `gdal_translate -of KMLSUPEROVERLAY <input> <output>`.
pub fn superoverlay_conversion(gdal_translate: &Path, input: &Path, output: &Path) -> ToolInvocation {
    ToolInvocation::new(gdal_translate)
        .arg("-of")
        .arg("KMLSUPEROVERLAY")
        .arg(input)
        .arg(output)
}
