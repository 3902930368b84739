//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Focus-aware notifications for coding assistant hooks.
///
/// Reads one hook event as JSON from stdin, records task timing per session,
/// and alerts the user unless they are already looking at the session.
#[derive(Debug, Parser)]
#[command(name = "ccnotify", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Hook event to handle: `UserPromptSubmit`, `Stop` or `Notification`.
    ///
    /// Without an event, prints `ok` and exits.
    pub event: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_is_optional() {
        let cli = Cli::try_parse_from(["ccnotify"]).unwrap();
        assert_eq!(cli.event, None);
    }

    #[test]
    fn unknown_event_names_reach_the_app() {
        let cli = Cli::try_parse_from(["ccnotify", "-v", "SessionStart"]).unwrap();
        assert_eq!(cli.event.as_deref(), Some("SessionStart"));
        assert!(cli.verbose);
    }
}
