//! Terminal session identifiers handed to hooks through the environment.

/// The terminal session a hook runs in.
///
/// Terminals such as iTerm2 export `ITERM_SESSION_ID=w0t0p0:<uuid>`. The
/// prefix locates the pane; the uuid is stable and is what the terminal
/// reports back when asked for its visible session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalSession {
    raw: String,
    uuid: String,
}

impl TerminalSession {
    /// Parses an environment value. Empty or missing values yield `None`.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
        let uuid = raw.rsplit_once(':').map_or(raw, |(_, uuid)| uuid);
        if uuid.is_empty() {
            return None;
        }
        Some(Self {
            raw: raw.to_string(),
            uuid: uuid.to_string(),
        })
    }

    /// The full environment value, including the window prefix.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The session uuid, used for alert grouping and focus checks.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }
}
