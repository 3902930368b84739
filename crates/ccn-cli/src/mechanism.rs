//! External mechanisms the dispatcher drives: desktop alerts, sound, terminal
//! color escapes and the host focus query.
//!
//! Each mechanism is a trait with one fallible operation so the dispatcher can
//! decide what to do with failures, and so tests can substitute fakes.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::time::Duration;

use thiserror::Error;

/// A collaborator failed to deliver a cue.
#[derive(Debug, Error)]
pub enum CueError {
    /// The program backing the mechanism is not installed.
    #[error("{program} not found")]
    Unavailable { program: String },
    /// The program did not answer in time and was killed.
    #[error("{program} timed out after {after:?}")]
    Timeout { program: String, after: Duration },
    /// The program ran and reported failure.
    #[error("{program} failed: {status}")]
    Failed { program: String, status: String },
    /// The host answered with an error of its own.
    #[error("host query error: {0}")]
    HostReported(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What happens when the user clicks an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Run a shell command (used to re-activate a specific terminal session).
    Execute(String),
    /// Bring an application to the front by bundle identifier.
    Activate(String),
}

/// A desktop alert, replacing any earlier alert with the same group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopAlert {
    pub title: String,
    pub subtitle: String,
    pub group: String,
    pub on_click: ClickAction,
}

pub trait AlertSink {
    fn raise(&self, alert: &DesktopAlert) -> Result<(), CueError>;
    fn remove(&self, group: &str) -> Result<(), CueError>;
}

pub trait SoundPlayer {
    /// Starts playback without waiting for it to finish.
    fn play(&self) -> Result<(), CueError>;
}

pub trait TerminalSink {
    fn write_escape(&self, sequence: &str) -> Result<(), CueError>;
}

/// What the host reports about the frontmost application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostState {
    pub frontmost: String,
    /// Visible session of the terminal, only known when the terminal is frontmost.
    pub session: Option<String>,
}

pub trait HostQuery {
    fn active_terminal(&self, terminal_app: &str) -> Result<HostState, CueError>;
}

/// Desktop alerts through `terminal-notifier`.
#[derive(Debug, Clone)]
pub struct TerminalNotifier {
    pub program: String,
}

impl AlertSink for TerminalNotifier {
    fn raise(&self, alert: &DesktopAlert) -> Result<(), CueError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-sound", "default"])
            .args(["-title", alert.title.as_str()])
            .args(["-subtitle", alert.subtitle.as_str()])
            .args(["-group", alert.group.as_str()]);
        match &alert.on_click {
            ClickAction::Execute(command) => cmd.args(["-execute", command.as_str()]),
            ClickAction::Activate(bundle_id) => cmd.args(["-activate", bundle_id.as_str()]),
        };
        run_checked(cmd, &self.program).map(drop)
    }

    fn remove(&self, group: &str) -> Result<(), CueError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-remove", group]);
        run_checked(cmd, &self.program).map(drop)
    }
}

/// Sound playback through `afplay`.
#[derive(Debug, Clone)]
pub struct Afplay {
    pub program: String,
    pub asset: PathBuf,
}

impl SoundPlayer for Afplay {
    #[expect(clippy::zombie_processes, reason = "sound plays after the hook exits")]
    fn play(&self) -> Result<(), CueError> {
        Command::new(&self.program)
            .arg(&self.asset)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| spawn_error(&self.program, err))?;
        Ok(())
    }
}

/// Writes escapes straight to the controlling terminal device.
#[derive(Debug, Clone)]
pub struct TtySink {
    pub path: PathBuf,
}

impl TerminalSink for TtySink {
    fn write_escape(&self, sequence: &str) -> Result<(), CueError> {
        let mut tty = OpenOptions::new().append(true).open(&self.path)?;
        tty.write_all(sequence.as_bytes())?;
        tty.flush()?;
        Ok(())
    }
}

/// Asks macOS which app is frontmost, and which session the terminal shows.
#[derive(Debug, Clone)]
pub struct Osascript {
    pub program: String,
    pub timeout: Duration,
}

impl HostQuery for Osascript {
    fn active_terminal(&self, terminal_app: &str) -> Result<HostState, CueError> {
        let script = focus_script(terminal_app);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let output = runtime
            .block_on(async {
                let mut command = tokio::process::Command::new(&self.program);
                command
                    .arg("-e")
                    .arg(&script)
                    .stdin(Stdio::null())
                    .kill_on_drop(true);
                tokio::time::timeout(self.timeout, command.output()).await
            })
            .map_err(|_| CueError::Timeout {
                program: self.program.clone(),
                after: self.timeout,
            })?
            .map_err(|err| spawn_error(&self.program, err))?;
        let stdout = check_status(output, &self.program)?.stdout;
        parse_host_reply(String::from_utf8_lossy(&stdout).trim(), terminal_app)
    }
}

fn focus_script(terminal_app: &str) -> String {
    format!(
        r#"
tell application "System Events"
    set frontApp to name of first application process whose frontmost is true
end tell
if frontApp is not "{terminal_app}" then return "NOTFRONT:" & frontApp
tell application "{terminal_app}"
    try
        return unique ID of current session of current tab of current window
    on error errMsg
        return "ERROR:" & errMsg
    end try
end tell
"#
    )
}

/// Interprets the focus script's reply.
pub fn parse_host_reply(reply: &str, terminal_app: &str) -> Result<HostState, CueError> {
    if let Some(app) = reply.strip_prefix("NOTFRONT:") {
        return Ok(HostState {
            frontmost: app.to_string(),
            session: None,
        });
    }
    if let Some(message) = reply.strip_prefix("ERROR:") {
        return Err(CueError::HostReported(message.to_string()));
    }
    Ok(HostState {
        frontmost: terminal_app.to_string(),
        session: Some(reply.to_string()).filter(|s| !s.is_empty()),
    })
}

fn run_checked(mut cmd: Command, program: &str) -> Result<Output, CueError> {
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|err| spawn_error(program, err))?;
    check_status(output, program)
}

fn check_status(output: Output, program: &str) -> Result<Output, CueError> {
    if output.status.success() {
        Ok(output)
    } else {
        Err(CueError::Failed {
            program: program.to_string(),
            status: output.status.to_string(),
        })
    }
}

fn spawn_error(program: &str, err: io::Error) -> CueError {
    if err.kind() == io::ErrorKind::NotFound {
        CueError::Unavailable {
            program: program.to_string(),
        }
    } else {
        CueError::Io(err)
    }
}
