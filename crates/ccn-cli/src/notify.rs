//! Notification dispatch: desktop alerts when the user is elsewhere, subtle
//! in-terminal cues when they are already watching.
//!
//! Delivery is best effort. Collaborator failures are logged and swallowed so
//! the caller's event handling always completes.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use ccn_core::TerminalSession;
use chrono::{DateTime, Local};

use crate::Config;
use crate::focus::FocusDetector;
use crate::mechanism::{
    Afplay, AlertSink, ClickAction, CueError, DesktopAlert, Osascript, SoundPlayer,
    TerminalNotifier, TerminalSink, TtySink,
};

/// The mechanisms a [`Dispatcher`] drives.
pub struct Cues {
    pub alerts: Box<dyn AlertSink>,
    pub sound: Box<dyn SoundPlayer>,
    pub terminal: Box<dyn TerminalSink>,
}

/// Presentation settings for alerts and cues.
#[derive(Debug, Clone)]
pub struct CueSettings {
    pub flash_color: String,
    pub background_color: String,
    pub cue_pause: Duration,
    pub flash_hold: Duration,
    pub terminal_bundle_id: String,
    pub activate_script: PathBuf,
    pub default_group: String,
}

impl CueSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            flash_color: config.flash_color.clone(),
            background_color: config.background_color.clone(),
            cue_pause: config.cue_pause(),
            flash_hold: config.flash_hold(),
            terminal_bundle_id: config.terminal_bundle_id.clone(),
            activate_script: config.activate_script.clone(),
            default_group: config.default_group.clone(),
        }
    }
}

/// Which path a notification took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Session focused: sound then flash, no desktop alert.
    InTerminal,
    /// Session not focused: desktop alert then flash.
    DesktopAlert,
}

pub struct Dispatcher {
    cues: Cues,
    focus: FocusDetector,
    session: Option<TerminalSession>,
    settings: CueSettings,
}

impl Dispatcher {
    pub fn new(
        cues: Cues,
        focus: FocusDetector,
        session: Option<TerminalSession>,
        settings: CueSettings,
    ) -> Self {
        Self {
            cues,
            focus,
            session,
            settings,
        }
    }

    /// Wires the dispatcher to the real system mechanisms named in `config`.
    pub fn from_config(config: &Config, session: Option<TerminalSession>) -> Self {
        let cues = Cues {
            alerts: Box::new(TerminalNotifier {
                program: config.notifier_program.clone(),
            }),
            sound: Box::new(Afplay {
                program: config.sound_program.clone(),
                asset: config.sound_asset.clone(),
            }),
            terminal: Box::new(TtySink {
                path: config.tty_path.clone(),
            }),
        };
        let host = Osascript {
            program: config.host_query_program.clone(),
            timeout: config.focus_timeout(),
        };
        let focus = FocusDetector::new(Box::new(host), &config.terminal_app, session.clone());
        Self::new(cues, focus, session, CueSettings::from_config(config))
    }

    /// Removes any pending desktop alert for this session.
    pub fn dismiss(&self) {
        let Some(session) = &self.session else {
            return;
        };
        match self.cues.alerts.remove(session.uuid()) {
            Ok(()) => tracing::debug!(session = session.uuid(), "dismissed pending alerts"),
            Err(err) => report("dismiss", &err),
        }
    }

    /// Tells the user something happened, choosing the least intrusive cue that
    /// will reach them.
    pub fn notify(&self, title: &str, subtitle: &str, cwd: Option<&str>) -> Delivery {
        if self.focus.is_current_session_focused() {
            if let Err(err) = self.cues.sound.play() {
                report("sound", &err);
            }
            thread::sleep(self.settings.cue_pause);
            self.flash();
            tracing::info!(title, subtitle, "alert skipped, session focused");
            return Delivery::InTerminal;
        }

        let alert = self.alert_for(title, subtitle, Local::now());
        match self.cues.alerts.raise(&alert) {
            Ok(()) => tracing::info!(
                title,
                subtitle,
                cwd = cwd.unwrap_or(""),
                session = self.session.as_ref().map_or("", TerminalSession::raw),
                "alert sent"
            ),
            Err(err) => report("desktop alert", &err),
        }
        self.flash();
        Delivery::DesktopAlert
    }

    fn alert_for(&self, title: &str, subtitle: &str, now: DateTime<Local>) -> DesktopAlert {
        let (group, on_click) = match &self.session {
            Some(session) => (
                session.uuid().to_string(),
                ClickAction::Execute(format!(
                    "\"{}\" \"{}\"",
                    self.settings.activate_script.display(),
                    session.uuid()
                )),
            ),
            None => (
                self.settings.default_group.clone(),
                ClickAction::Activate(self.settings.terminal_bundle_id.clone()),
            ),
        };
        DesktopAlert {
            title: title.to_string(),
            subtitle: format!("{subtitle}\n{}", now.format("%B %d, %Y at %H:%M")),
            group,
            on_click,
        }
    }

    /// Briefly switches the terminal background to the alert color.
    fn flash(&self) {
        let terminal = &self.cues.terminal;
        if let Err(err) = terminal.write_escape(&set_background(&self.settings.flash_color)) {
            report("flash", &err);
            return;
        }
        thread::sleep(self.settings.flash_hold);
        if let Err(err) = terminal.write_escape(&set_background(&self.settings.background_color)) {
            report("flash", &err);
        }
    }
}

/// iTerm2 proprietary escape setting the background color.
pub fn set_background(hex: &str) -> String {
    format!("\x1b]1337;SetColors=bg={hex}\x07")
}

fn report(cue: &str, err: &CueError) {
    match err {
        CueError::Failed { .. } => tracing::error!(cue, error = %err, "cue failed"),
        _ => tracing::warn!(cue, error = %err, "cue skipped"),
    }
}
