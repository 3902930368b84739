//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
///
/// Everything the hook touches outside its own process is named here, so tests
/// and unusual setups can point each mechanism elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the ledger database file.
    pub database_path: PathBuf,
    /// Directory holding the daily-rotated log files.
    pub log_dir: PathBuf,
    /// Environment variable carrying the terminal session identifier.
    pub session_env: String,
    /// Application name the host reports when the terminal is frontmost.
    pub terminal_app: String,
    /// Bundle identifier activated when an alert without a session is clicked.
    pub terminal_bundle_id: String,
    /// Desktop alert program (`terminal-notifier` compatible).
    pub notifier_program: String,
    /// Host query program (`osascript` compatible).
    pub host_query_program: String,
    /// Sound playback program.
    pub sound_program: String,
    /// Sound asset played when the session is focused.
    pub sound_asset: PathBuf,
    /// Script run with the session uuid when an alert is clicked.
    pub activate_script: PathBuf,
    /// Terminal device receiving color escapes.
    pub tty_path: PathBuf,
    /// Background color (hex, no `#`) shown during a flash.
    pub flash_color: String,
    /// Background color (hex, no `#`) restored after a flash.
    pub background_color: String,
    pub focus_timeout_ms: u64,
    /// Pause between the sound and the flash in the focused path.
    pub cue_pause_ms: u64,
    pub flash_hold_ms: u64,
    /// Alert title when the event has no working directory.
    pub fallback_title: String,
    /// Alert group used when no terminal session is known.
    pub default_group: String,
}

impl Default for Config {
    fn default() -> Self {
        let base_dir = default_base_dir();
        Self {
            database_path: base_dir.join("ccnotify.db"),
            log_dir: base_dir.clone(),
            session_env: "ITERM_SESSION_ID".to_string(),
            terminal_app: "iTerm2".to_string(),
            terminal_bundle_id: "com.googlecode.iterm2".to_string(),
            notifier_program: "terminal-notifier".to_string(),
            host_query_program: "osascript".to_string(),
            sound_program: "afplay".to_string(),
            sound_asset: PathBuf::from("/System/Library/Sounds/Glass.aiff"),
            activate_script: base_dir.join("activate-session.sh"),
            tty_path: PathBuf::from("/dev/tty"),
            flash_color: "4a3a00".to_string(),
            background_color: "2d2d3d".to_string(),
            focus_timeout_ms: 2000,
            cue_pause_ms: 700,
            flash_hold_ms: 200,
            fallback_title: "Claude Task".to_string(),
            default_group: "claude-code".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally merging a specific file over the defaults.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (CCNOTIFY_*)
        figment = figment.merge(Env::prefixed("CCNOTIFY_"));

        figment.extract()
    }

    pub const fn focus_timeout(&self) -> Duration {
        Duration::from_millis(self.focus_timeout_ms)
    }

    pub const fn cue_pause(&self) -> Duration {
        Duration::from_millis(self.cue_pause_ms)
    }

    pub const fn flash_hold(&self) -> Duration {
        Duration::from_millis(self.flash_hold_ms)
    }
}

/// Where the ledger, logs and activation script live by default: next to the
/// installed program, or the platform data directory if that can't be found.
pub fn default_base_dir() -> PathBuf {
    program_dir()
        .or_else(dirs_data_path)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Directory holding the running executable, with symlinks resolved.
fn program_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?.canonicalize().ok()?;
    exe.parent().map(Path::to_path_buf)
}

/// Returns the platform-specific config directory for ccnotify.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ccnotify"))
}

/// Returns the platform-specific data directory for ccnotify.
///
/// On Linux: `~/.local/share/ccnotify`; on macOS: `~/Library/Application Support/ccnotify`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("ccnotify"))
}
