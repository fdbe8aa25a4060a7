//! Connection settings.

use crate::ValidationError;

/// The port SyncPlay servers listen on unless told otherwise.
pub const DEFAULT_PORT: u16 = 8999;

/// Where to connect and as whom. Fixed for the lifetime of a connection.
///
/// ```rust
/// use sinkplay_session::SessionConfig;
///
/// let config = SessionConfig::new("syncplay.example.net", "alice", "lobby")
///     .with_port(8995)
///     .with_password("hunter2");
/// assert_eq!(config.addr(), "syncplay.example.net:8995");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub server: String,
    pub port: u16,
    pub nick: String,
    pub room: String,
    /// Plaintext server password. Empty means none; only its MD5 digest is
    /// ever sent.
    pub password: String,
}

impl SessionConfig {
    /// Creates a config on the default port with no password. Surrounding
    /// whitespace is stripped from every field.
    pub fn new(
        server: impl Into<String>,
        nick: impl Into<String>,
        room: impl Into<String>,
    ) -> Self {
        Self {
            server: trimmed(server.into()),
            port: DEFAULT_PORT,
            nick: trimmed(nick.into()),
            room: trimmed(room.into()),
            password: String::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// `host:port`, with bare IPv6 literals bracketed.
    pub fn addr(&self) -> String {
        let host = self.server.trim();
        if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{}", self.port)
        } else {
            format!("{host}:{}", self.port)
        }
    }

    /// Checks that server, nick and room are all non-blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.server.trim().is_empty() {
            return Err(ValidationError::EmptyServer);
        }
        if self.nick.trim().is_empty() {
            return Err(ValidationError::EmptyNick);
        }
        if self.room.trim().is_empty() {
            return Err(ValidationError::EmptyRoom);
        }
        Ok(())
    }
}

fn trimmed(s: String) -> String {
    let t = s.trim();
    if t.len() == s.len() { s } else { t.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_port_and_no_password() {
        let config = SessionConfig::new("host", "nick", "room");
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.password.is_empty());
    }

    #[test]
    fn test_new_trims_fields() {
        let config = SessionConfig::new("  host ", "\tnick", "room\n");
        assert_eq!(config.server, "host");
        assert_eq!(config.nick, "nick");
        assert_eq!(config.room, "room");
    }

    #[test]
    fn test_validate_reports_first_blank_field() {
        assert_eq!(
            SessionConfig::new(" ", "n", "r").validate(),
            Err(ValidationError::EmptyServer)
        );
        assert_eq!(
            SessionConfig::new("h", "", "r").validate(),
            Err(ValidationError::EmptyNick)
        );
        assert_eq!(
            SessionConfig::new("h", "n", "   ").validate(),
            Err(ValidationError::EmptyRoom)
        );
    }

    #[test]
    fn test_validate_checks_fields_set_directly() {
        let mut config = SessionConfig::new("h", "n", "r");
        config.nick = "  ".into();
        assert_eq!(config.validate(), Err(ValidationError::EmptyNick));
    }

    #[test]
    fn test_addr_brackets_ipv6() {
        assert_eq!(SessionConfig::new("::1", "n", "r").addr(), "[::1]:8999");
        assert_eq!(
            SessionConfig::new("[::1]", "n", "r").with_port(1).addr(),
            "[::1]:1"
        );
        assert_eq!(SessionConfig::new("127.0.0.1", "n", "r").addr(), "127.0.0.1:8999");
    }
}
