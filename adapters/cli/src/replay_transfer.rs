use std::{fmt, str::FromStr, time::Duration};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use temporal_bot_core::{Command, Direction};
use thiserror::Error;

const REPLAY_DOMAIN: &str = "tbot";
const REPLAY_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded replay payload.
pub(crate) const REPLAY_HEADER: &str = "tbot:v1";
/// Delimiter used to separate the prefix, level id and payload.
const FIELD_DELIMITER: char = ':';
/// Delimiter between steps of a textual script.
const STEP_DELIMITER: char = ',';
/// Separates the action from its issue time in a textual step.
const TIME_MARKER: char = '@';

/// Player input that can be recorded and replayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ReplayAction {
    /// Queue a move on the active robot.
    Move(Direction),
    /// Freeze the active robot and spawn its successor.
    Rewind,
    /// Rewind and replay every robot from time zero.
    RestartTimeline,
}

impl ReplayAction {
    /// Command that performs the action.
    pub(crate) fn command(self) -> Command {
        match self {
            Self::Move(direction) => Command::IssueMove { direction },
            Self::Rewind => Command::IssueRewind,
            Self::RestartTimeline => Command::RestartTimeline,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::Move(Direction::Up) => "up",
            Self::Move(Direction::Right) => "right",
            Self::Move(Direction::Down) => "down",
            Self::Move(Direction::Left) => "left",
            Self::Rewind => "rewind",
            Self::RestartTimeline => "restart",
        }
    }
}

impl FromStr for ReplayAction {
    type Err = ReplayTransferError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "up" | "u" | "w" => Ok(Self::Move(Direction::Up)),
            "right" | "r" | "d" => Ok(Self::Move(Direction::Right)),
            "down" | "s" => Ok(Self::Move(Direction::Down)),
            "left" | "l" | "a" => Ok(Self::Move(Direction::Left)),
            "rewind" | "z" => Ok(Self::Rewind),
            "restart" | "t" => Ok(Self::RestartTimeline),
            other => Err(ReplayTransferError::UnknownAction(other.to_owned())),
        }
    }
}

/// Action issued at a clock offset within the current timeline pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ReplayStep {
    /// Clock value in milliseconds at which the action was issued.
    pub(crate) at_ms: u64,
    /// Issued action.
    pub(crate) action: ReplayAction,
}

impl ReplayStep {
    /// Records an action issued at the provided clock value.
    pub(crate) fn new(at: Duration, action: ReplayAction) -> Self {
        Self {
            at_ms: u64::try_from(at.as_millis()).unwrap_or(u64::MAX),
            action,
        }
    }

    /// Clock value at which the action is due.
    pub(crate) fn at(&self) -> Duration {
        Duration::from_millis(self.at_ms)
    }
}

impl fmt::Display for ReplayStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{TIME_MARKER}{}", self.action.keyword(), self.at_ms)
    }
}

/// Recorded input of a session on a single level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ReplayScript {
    /// Level the script was recorded on.
    pub(crate) level: u32,
    /// Steps in issue order.
    pub(crate) steps: Vec<ReplayStep>,
}

impl ReplayScript {
    /// Parses a textual script such as `right@0,rewind@120,up@130`.
    ///
    /// Issue times must not decrease from one step to the next, except
    /// directly after a timeline restart.
    pub(crate) fn parse(level: u32, text: &str) -> Result<Self, ReplayTransferError> {
        let mut steps = Vec::new();
        for token in text
            .split(STEP_DELIMITER)
            .map(str::trim)
            .filter(|token| !token.is_empty())
        {
            let (action, at) = token
                .split_once(TIME_MARKER)
                .ok_or_else(|| ReplayTransferError::MissingTime(token.to_owned()))?;
            let at_ms = at
                .trim()
                .parse::<u64>()
                .map_err(|_| ReplayTransferError::InvalidTime(token.to_owned()))?;
            steps.push(ReplayStep {
                at_ms,
                action: action.parse()?,
            });
        }

        let script = Self { level, steps };
        script.validate()?;
        Ok(script)
    }

    /// Encodes the script into a single-line string suitable for sharing.
    pub(crate) fn encode(&self) -> Result<String, ReplayTransferError> {
        let json = serde_json::to_vec(&self.steps).map_err(ReplayTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!("{REPLAY_HEADER}:{}:{encoded}", self.level))
    }

    /// Decodes a script from its shared string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, ReplayTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ReplayTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(ReplayTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(ReplayTransferError::MissingVersion)?;
        let level = parts.next().ok_or(ReplayTransferError::MissingLevel)?;
        let payload = parts.next().ok_or(ReplayTransferError::MissingPayload)?;

        if domain != REPLAY_DOMAIN {
            return Err(ReplayTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != REPLAY_VERSION {
            return Err(ReplayTransferError::UnsupportedVersion(version.to_owned()));
        }

        let level = level
            .trim()
            .parse::<u32>()
            .map_err(|_| ReplayTransferError::InvalidLevel(level.to_owned()))?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(ReplayTransferError::InvalidEncoding)?;
        let steps: Vec<ReplayStep> =
            serde_json::from_slice(&bytes).map_err(ReplayTransferError::InvalidPayload)?;

        let script = Self { level, steps };
        script.validate()?;
        Ok(script)
    }

    fn validate(&self) -> Result<(), ReplayTransferError> {
        let mut floor = 0;
        for step in &self.steps {
            if step.at_ms < floor {
                return Err(ReplayTransferError::OutOfOrder {
                    earlier: floor,
                    later: step.at_ms,
                });
            }
            // The clock starts over after a timeline restart.
            floor = match step.action {
                ReplayAction::RestartTimeline => 0,
                _ => step.at_ms,
            };
        }
        Ok(())
    }
}

impl fmt::Display for ReplayScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, step) in self.steps.iter().enumerate() {
            if index > 0 {
                write!(f, "{STEP_DELIMITER}")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// Errors that can occur while reading replay scripts and codes.
#[derive(Debug, Error)]
pub(crate) enum ReplayTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("replay code was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the replay code.
    #[error("replay code is missing the prefix")]
    MissingPrefix,
    /// The replay code did not contain a version segment.
    #[error("replay code is missing the version")]
    MissingVersion,
    /// The replay code did not include the level id.
    #[error("replay code is missing the level id")]
    MissingLevel,
    /// The replay code did not include the payload segment.
    #[error("replay code is missing the payload")]
    MissingPayload,
    /// The replay code used an unexpected prefix segment.
    #[error("replay prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The replay code used an unsupported version identifier.
    #[error("replay version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The level id could not be parsed.
    #[error("could not parse level id '{0}'")]
    InvalidLevel(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode replay payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be converted to or from JSON.
    #[error("could not parse replay payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// A script step named an unknown action.
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    /// A script step had no `@time` suffix.
    #[error("step '{0}' is missing an @time suffix")]
    MissingTime(String),
    /// A script step carried a time that is not a whole number of milliseconds.
    #[error("step '{0}' has an invalid time")]
    InvalidTime(String),
    /// A step was issued before its predecessor.
    #[error("step at {later} ms follows a step at {earlier} ms")]
    OutOfOrder {
        /// Issue time of the preceding step.
        earlier: u64,
        /// Issue time of the offending step.
        later: u64,
    },
}
