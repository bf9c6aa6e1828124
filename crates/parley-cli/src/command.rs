//! Input line parsing.

use parley_proto::{ProtocolError, RoomId};
use thiserror::Error;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Switch to a room by id.
    Room(RoomId),
    /// Print command help.
    Help,
    /// Log out and exit.
    Logout,
    /// Send the line as a message.
    Say(String),
}

/// A command line that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unrecognized `/command`.
    #[error("unknown command: /{0} (try /help)")]
    Unknown(String),

    /// `/room` without an id.
    #[error("usage: /room <id>")]
    MissingRoom,

    /// Room id rejected by the protocol layer.
    #[error(transparent)]
    InvalidRoom(#[from] ProtocolError),
}

/// Help text for [`Input::Help`].
pub const HELP: &str = "\
/room <id>   switch to a room
/ai          switch to the AI room
/public      switch to the public room
/logout      log out and exit
/help        show this help
anything else is sent to the current room";

impl Input {
    /// Parse one line.
    ///
    /// Lines starting with `//` send the rest with one slash dropped.
    ///
    /// # Errors
    ///
    /// - `CommandError::Unknown` for an unrecognized command
    /// - `CommandError::MissingRoom` if `/room` has no argument
    /// - `CommandError::InvalidRoom` if the id is rejected
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Say(line.to_string()));
        };
        if rest.starts_with('/') {
            return Ok(Self::Say(rest.to_string()));
        }

        let (name, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        match name {
            "room" => {
                let arg = arg.trim();
                if arg.is_empty() {
                    return Err(CommandError::MissingRoom);
                }
                Ok(Self::Room(RoomId::new(arg)?))
            },
            "ai" => Ok(Self::Room(RoomId::ai())),
            "public" => Ok(Self::Room(RoomId::public())),
            "logout" | "quit" => Ok(Self::Logout),
            "help" => Ok(Self::Help),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_sent() {
        assert_eq!(Input::parse("hello there"), Ok(Input::Say("hello there".into())));
        assert_eq!(Input::parse(""), Ok(Input::Say(String::new())));
    }

    #[test]
    fn room_shortcuts() {
        assert_eq!(Input::parse("/ai"), Ok(Input::Room(RoomId::ai())));
        assert_eq!(Input::parse("/public"), Ok(Input::Room(RoomId::public())));
        assert_eq!(
            Input::parse("/room  66aa00000000000000000001 "),
            Ok(Input::Room(RoomId::new("66aa00000000000000000001").unwrap()))
        );
    }

    #[test]
    fn room_needs_an_id() {
        assert_eq!(Input::parse("/room"), Err(CommandError::MissingRoom));
        assert_eq!(Input::parse("/room   "), Err(CommandError::MissingRoom));
    }

    #[test]
    fn double_slash_escapes() {
        assert_eq!(Input::parse("//shrug"), Ok(Input::Say("/shrug".into())));
    }

    #[test]
    fn unknown_command() {
        let err = Input::parse("/dance now").unwrap_err();
        assert_eq!(err.to_string(), "unknown command: /dance (try /help)");
    }
}
