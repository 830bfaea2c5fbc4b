//! PenguinPowered (justlinux) dialect
//!
//! A line-oriented session: the server greets, then every command is answered
//! by one status line before the next command goes out.
//!
//! ```text
//! S: OK ...
//! C: VER 1.0 [ez-update-x.y.z linux (by Angus Mackay)]   S: OK
//! C: USER name                                           S: OK
//! C: PASS secret                                         S: OK
//! C: HOST home.example.net                               S: OK
//! C: OPER update                                         S: OK
//! C: IP 192.0.2.7          (only for OPER update)        S: OK
//! C: DONE                                                S: OK
//! ```
//!
//! The first reply not starting with `OK` ends the session.

use async_trait::async_trait;
use ezupdate_core::{
    ConnectionState, Error, ProtocolDriver, RequestBuilder, Result, Transport, UpdateConfig,
};

use crate::user_agent;

/// Session protocol version announced in `VER`
pub const PROTOCOL_VERSION: &str = "1.0";

/// Operation that publishes an address
pub const UPDATE_OPERATION: &str = "update";

/// Driver for PenguinPowered style providers
#[derive(Debug, Default, Clone, Copy)]
pub struct PgpowDriver;

/// One command of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Wire bytes, CRLF included
    pub line: String,
    /// Printable form, secrets removed
    pub display: String,
}

impl PgpowDriver {
    /// Every command of the session, in order
    pub fn commands(config: &UpdateConfig) -> Result<Vec<Command>> {
        let mut commands = vec![
            command(&format!("VER {} [{}]", PROTOCOL_VERSION, user_agent()))?,
            command(&format!("USER {}", config.credentials.username()))?,
            Command {
                display: "PASS <REDACTED>".to_string(),
                ..command(&format!("PASS {}", config.credentials.password()))?
            },
            command(&format!("HOST {}", config.host))?,
            command(&format!("OPER {}", config.request))?,
        ];

        if config.request == UPDATE_OPERATION {
            commands.push(command(&format!("IP {}", config.address))?);
        }
        commands.push(command("DONE")?);

        Ok(commands)
    }
}

fn command(text: &str) -> Result<Command> {
    let mut line = RequestBuilder::default();
    line.line(text)?;

    Ok(Command {
        line: line.finish(),
        display: text.to_string(),
    })
}

/// Error for a reply that does not start with `OK`
///
/// The detail is whatever follows `ERR`, or the whole line otherwise.
pub fn session_error(reply: &str) -> Error {
    let detail = match reply.strip_prefix("ERR") {
        Some(rest) => rest.trim(),
        None => reply.trim(),
    };
    Error::protocol(None, format!("error talking to server: {}", detail))
}

fn is_ok(reply: &str) -> bool {
    reply.starts_with("OK")
}

#[async_trait]
impl ProtocolDriver for PgpowDriver {
    fn check_preconditions(&self, config: &UpdateConfig) -> Result<()> {
        config.validate()?;
        if config.host.is_empty() {
            return Err(Error::config("host is required"));
        }
        Ok(())
    }

    async fn update(&self, config: &UpdateConfig, transport: &dyn Transport) -> Result<()> {
        let commands = Self::commands(config)?;
        let mut conn = ConnectionState::open(transport, config).await?;

        let greeting = conn.read_reply_line().await?;
        if !is_ok(&greeting) {
            tracing::warn!(reply = %greeting, "{}", crate::http::STRANGE_RESPONSE);
            return Err(Error::protocol(None, crate::http::STRANGE_RESPONSE));
        }

        for command in &commands {
            tracing::debug!(peer = conn.peer(), "sending {}", command.display);
            conn.send(command.line.as_bytes()).await?;

            let reply = conn.read_reply_line().await?;
            if !is_ok(&reply) {
                let err = session_error(&reply);
                tracing::warn!(command = %command.display, "{}", err);
                return Err(err);
            }
        }

        tracing::debug!(host = %config.host, "request successful");
        Ok(())
    }

    fn driver_name(&self) -> &'static str {
        "pgpow"
    }
}
