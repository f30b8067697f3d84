//! Command vocabulary
//!
//! Typed builders for the commands the device understands. The session
//! layer transmits any valid ASCII text, so [`Command::Raw`] covers
//! everything not listed here.

use std::fmt;
use std::str::FromStr;

use crate::codec::{self, CodecError};

/// Allowed distance for the linear motion commands (cm)
pub const DISTANCE_RANGE_CM: (i64, i64) = (20, 500);

/// Allowed angle for rotation commands (degrees)
pub const ROTATION_RANGE_DEG: (i64, i64) = (1, 3600);

/// Allowed speed setting (cm/s)
pub const SPEED_RANGE_CM_S: (i64, i64) = (10, 100);

/// A command understood by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Enter SDK mode; also the neutral keep-alive command
    Command,
    Takeoff,
    Land,
    /// Stop all motors immediately
    Emergency,
    StreamOn,
    StreamOff,
    Up(u32),
    Down(u32),
    Left(u32),
    Right(u32),
    Forward(u32),
    Back(u32),
    Clockwise(u32),
    CounterClockwise(u32),
    Speed(u32),
    QueryBattery,
    QuerySpeed,
    QueryTime,
    /// Any other instruction, sent verbatim
    Raw(String),
}

impl Command {
    /// Wire keyword, without arguments
    pub fn keyword(&self) -> &str {
        match self {
            Self::Command => "command",
            Self::Takeoff => "takeoff",
            Self::Land => "land",
            Self::Emergency => "emergency",
            Self::StreamOn => "streamon",
            Self::StreamOff => "streamoff",
            Self::Up(_) => "up",
            Self::Down(_) => "down",
            Self::Left(_) => "left",
            Self::Right(_) => "right",
            Self::Forward(_) => "forward",
            Self::Back(_) => "back",
            Self::Clockwise(_) => "cw",
            Self::CounterClockwise(_) => "ccw",
            Self::Speed(_) => "speed",
            Self::QueryBattery => "battery?",
            Self::QuerySpeed => "speed?",
            Self::QueryTime => "time?",
            Self::Raw(text) => text.split_whitespace().next().unwrap_or(""),
        }
    }

    /// Numeric argument, if the command takes one
    pub fn argument(&self) -> Option<u32> {
        match self {
            Self::Up(v)
            | Self::Down(v)
            | Self::Left(v)
            | Self::Right(v)
            | Self::Forward(v)
            | Self::Back(v)
            | Self::Clockwise(v)
            | Self::CounterClockwise(v)
            | Self::Speed(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether the device answers with a value instead of "ok"/"error"
    pub fn is_query(&self) -> bool {
        match self {
            Self::QueryBattery | Self::QuerySpeed | Self::QueryTime => true,
            Self::Raw(text) => text.ends_with('?'),
            _ => false,
        }
    }

    /// Check argument ranges and that the wire text is sendable
    pub fn validate(&self) -> Result<(), CodecError> {
        let range = match self {
            Self::Up(_)
            | Self::Down(_)
            | Self::Left(_)
            | Self::Right(_)
            | Self::Forward(_)
            | Self::Back(_) => Some(DISTANCE_RANGE_CM),
            Self::Clockwise(_) | Self::CounterClockwise(_) => Some(ROTATION_RANGE_DEG),
            Self::Speed(_) => Some(SPEED_RANGE_CM_S),
            _ => None,
        };

        if let (Some((min, max)), Some(value)) = (range, self.argument()) {
            let value = i64::from(value);
            if value < min || value > max {
                return Err(CodecError::InvalidArgument {
                    command: self.keyword().to_string(),
                    value,
                    min,
                    max,
                });
            }
        }

        codec::validate_command(&self.to_string())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(text) => f.write_str(text),
            other => match other.argument() {
                Some(value) => write!(f, "{} {}", other.keyword(), value),
                None => f.write_str(other.keyword()),
            },
        }
    }
}

impl FromStr for Command {
    type Err = CodecError;

    /// Parse wire text; unrecognised instructions become [`Command::Raw`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        codec::validate_command(s)?;

        let mut parts = s.split_whitespace();
        let keyword = parts.next().unwrap_or_default();
        let rest: Vec<&str> = parts.collect();

        let simple = match keyword {
            "command" => Some(Self::Command),
            "takeoff" => Some(Self::Takeoff),
            "land" => Some(Self::Land),
            "emergency" => Some(Self::Emergency),
            "streamon" => Some(Self::StreamOn),
            "streamoff" => Some(Self::StreamOff),
            "battery?" => Some(Self::QueryBattery),
            "speed?" => Some(Self::QuerySpeed),
            "time?" => Some(Self::QueryTime),
            _ => None,
        };
        if let (Some(command), true) = (simple, rest.is_empty()) {
            return Ok(command);
        }

        let with_arg: Option<fn(u32) -> Self> = match keyword {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "forward" => Some(Self::Forward),
            "back" => Some(Self::Back),
            "cw" => Some(Self::Clockwise),
            "ccw" => Some(Self::CounterClockwise),
            "speed" => Some(Self::Speed),
            _ => None,
        };
        if let (Some(build), [value]) = (with_arg, rest.as_slice()) {
            if let Ok(value) = value.parse::<u32>() {
                return Ok(build(value));
            }
        }

        Ok(Self::Raw(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_text() {
        assert_eq!(Command::Command.to_string(), "command");
        assert_eq!(Command::Forward(50).to_string(), "forward 50");
        assert_eq!(Command::Clockwise(30).to_string(), "cw 30");
        assert_eq!(Command::QueryBattery.to_string(), "battery?");
        assert_eq!(Command::Raw("rc 0 0 0 0".into()).to_string(), "rc 0 0 0 0");
    }

    #[test]
    fn test_parse_known_commands() {
        assert_eq!("takeoff".parse::<Command>().unwrap(), Command::Takeoff);
        assert_eq!("ccw 30".parse::<Command>().unwrap(), Command::CounterClockwise(30));
        assert_eq!("streamon".parse::<Command>().unwrap(), Command::StreamOn);
        assert_eq!("battery?".parse::<Command>().unwrap(), Command::QueryBattery);
    }

    #[test]
    fn test_parse_falls_back_to_raw() {
        assert_eq!(
            "go 50 50 0 10".parse::<Command>().unwrap(),
            Command::Raw("go 50 50 0 10".into())
        );
        assert_eq!(
            "forward fast".parse::<Command>().unwrap(),
            Command::Raw("forward fast".into())
        );
        assert!("".parse::<Command>().is_err());
    }

    #[test]
    fn test_validate_ranges() {
        assert!(Command::Forward(50).validate().is_ok());
        assert!(Command::Clockwise(360).validate().is_ok());
        assert_eq!(
            Command::Up(5).validate(),
            Err(CodecError::InvalidArgument {
                command: "up".into(),
                value: 5,
                min: 20,
                max: 500
            })
        );
        assert!(Command::Speed(101).validate().is_err());
        assert!(Command::Raw(String::new()).validate().is_err());
    }

    #[test]
    fn test_query_detection() {
        assert!(Command::QueryTime.is_query());
        assert!(Command::Raw("wifi?".into()).is_query());
        assert!(!Command::Land.is_query());
    }
}
