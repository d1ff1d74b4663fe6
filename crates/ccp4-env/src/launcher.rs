//! Child-process launching for vendored programs.

use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use ccp4_core::errors::{Ccp4Error, ErrorInfo};
use tracing::{debug, info, warn};

use crate::environ::Ccp4Environment;

/// One program invocation: executable, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Seam between sessions and the operating system.
pub trait ProgramRunner {
    /// Runs the program to completion. A non-zero exit is an error.
    fn run(&self, invocation: &Invocation, env: Option<&Ccp4Environment>) -> Result<(), Ccp4Error>;

    /// Starts the program and returns without waiting for it. The child is
    /// still reaped once it exits.
    fn spawn_detached(
        &self,
        invocation: &Invocation,
        env: Option<&Ccp4Environment>,
    ) -> Result<(), Ccp4Error>;
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(invocation: &Invocation, env: Option<&Ccp4Environment>) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(env) = env {
            env.apply(&mut cmd);
        }
        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

fn launch_error(invocation: &Invocation, err: impl ToString) -> Ccp4Error {
    Ccp4Error::Process(
        ErrorInfo::new("ccp4_env.launch", err.to_string())
            .with_context("program", invocation.program.display().to_string()),
    )
}

impl ProgramRunner for SystemRunner {
    fn run(&self, invocation: &Invocation, env: Option<&Ccp4Environment>) -> Result<(), Ccp4Error> {
        info!(command = %invocation, "launching");
        let status = Self::command(invocation, env)
            .status()
            .map_err(|err| launch_error(invocation, err))?;
        if status.success() {
            return Ok(());
        }
        let code = status
            .code()
            .map(|code| code.to_string())
            .unwrap_or_else(|| "signal".to_string());
        Err(Ccp4Error::Process(
            ErrorInfo::new(
                "ccp4_env.exit_status",
                format!("{} exited with status {code}", invocation.program.display()),
            )
            .with_context("command", invocation.to_string()),
        ))
    }

    fn spawn_detached(
        &self,
        invocation: &Invocation,
        env: Option<&Ccp4Environment>,
    ) -> Result<(), Ccp4Error> {
        info!(command = %invocation, "launching in background");
        let mut child = Self::command(invocation, env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| launch_error(invocation, err))?;
        // reaped off-thread so a long-lived host does not collect zombies
        let program = invocation.program.display().to_string();
        thread::spawn(move || match child.wait() {
            Ok(status) => debug!(%program, %status, "background program exited"),
            Err(err) => warn!(%program, %err, "could not wait on background program"),
        });
        Ok(())
    }
}
