//! Deciding whether the user is already looking at this hook's terminal session.

use ccn_core::TerminalSession;

use crate::mechanism::HostQuery;

/// Checks whether the invoking terminal session is the one on screen.
///
/// Fails closed: any doubt reads as "not focused", because a redundant alert
/// costs less than a missed one.
pub struct FocusDetector {
    host: Box<dyn HostQuery>,
    terminal_app: String,
    session: Option<TerminalSession>,
}

impl FocusDetector {
    pub fn new(
        host: Box<dyn HostQuery>,
        terminal_app: impl Into<String>,
        session: Option<TerminalSession>,
    ) -> Self {
        Self {
            host,
            terminal_app: terminal_app.into(),
            session,
        }
    }

    pub fn is_current_session_focused(&self) -> bool {
        let Some(session) = &self.session else {
            tracing::debug!("no terminal session identifier; treating as unfocused");
            return false;
        };

        match self.host.active_terminal(&self.terminal_app) {
            Ok(state) => {
                let focused = state.frontmost == self.terminal_app
                    && state.session.as_deref() == Some(session.uuid());
                tracing::debug!(
                    frontmost = %state.frontmost,
                    active_session = state.session.as_deref().unwrap_or(""),
                    session = session.uuid(),
                    focused,
                    "checked session focus"
                );
                focused
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not check session focus");
                false
            }
        }
    }
}
