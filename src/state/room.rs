use std::{fmt, iter, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{dto::validation::validate_room_code, state::game::GameError};

/// Length of codes produced by [`RoomCode::generate`].
pub const GENERATED_CODE_LENGTH: usize = 6;

const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Opaque identifier of one game session, shared by host and viewers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalize (trim, uppercase) and validate a user supplied code.
    pub fn parse(raw: &str) -> Result<Self, GameError> {
        let normalized = raw.trim().to_ascii_uppercase();
        validate_room_code(&normalized).map_err(|err| {
            GameError::InvalidRoomCode(
                err.message
                    .map(|m| m.into_owned())
                    .unwrap_or_else(|| err.code.into_owned()),
            )
        })?;
        Ok(Self(normalized))
    }

    /// Draw a fresh random code.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = iter::repeat_with(|| CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())] as char)
            .take(GENERATED_CODE_LENGTH)
            .collect();
        Self(code)
    }

    /// Borrow the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = GameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(value: RoomCode) -> Self {
        value.0
    }
}

/// Which side of the game a device joined as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Exclusive writer of the room state.
    Host,
    /// Read-only mirror of the host.
    Viewer,
}

impl Role {
    /// Value stored under the role key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Host => "host",
            Role::Viewer => "viewer",
        }
    }
}

impl FromStr for Role {
    type Err = GameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "host" => Ok(Role::Host),
            "viewer" => Ok(Role::Viewer),
            other => Err(GameError::InvalidInput(format!("unknown role `{other}`"))),
        }
    }
}
