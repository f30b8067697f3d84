//! Text codec for the Tello datagram protocol
//!
//! Every datagram is plain text:
//! ```text
//! telemetry:  pitch:%d;roll:%d;yaw:%d;...;agz:%.2f;\r\n
//! command:    takeoff
//! response:   ok
//! ```
//!
//! There is no framing beyond the datagram boundary and no correlation
//! identifier between a command and its response.

use std::collections::BTreeMap;

use bytes::Bytes;
use thiserror::Error;

use crate::{now_ms, TelemetrySnapshot};

/// Separator between telemetry fields
pub const FIELD_SEPARATOR: char = ';';

/// Separator between a field name and its value
pub const VALUE_SEPARATOR: char = ':';

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("datagram is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },

    #[error("telemetry datagram contains no fields")]
    EmptyTelemetry,

    #[error("malformed telemetry field: {field:?}")]
    MalformedField { field: String },

    #[error("command is empty")]
    EmptyCommand,

    #[error("command contains non-ASCII characters: {command:?}")]
    NonAsciiCommand { command: String },

    #[error("command contains control characters: {command:?}")]
    ControlCharacter { command: String },

    #[error("unknown command: {command:?}")]
    UnknownCommand { command: String },

    #[error("argument for '{command}' out of range: {value} (allowed {min}..={max})")]
    InvalidArgument {
        command: String,
        value: i64,
        min: i64,
        max: i64,
    },
}

fn decode_text(datagram: &[u8]) -> Result<&str, CodecError> {
    std::str::from_utf8(datagram).map_err(|e| CodecError::InvalidUtf8 {
        valid_up_to: e.valid_up_to(),
    })
}

/// Parse a telemetry datagram into a complete snapshot
///
/// Either every field parses and a snapshot is returned, or an error is
/// returned and nothing is produced.
pub fn parse_telemetry(datagram: &[u8]) -> Result<TelemetrySnapshot, CodecError> {
    let text = decode_text(datagram)?;

    // Strip the "\r\n" terminator, then the separator that precedes it
    let body = text.trim_end();
    let body = body.strip_suffix(FIELD_SEPARATOR).unwrap_or(body);

    if body.trim().is_empty() {
        return Err(CodecError::EmptyTelemetry);
    }

    let mut fields = BTreeMap::new();
    for part in body.split(FIELD_SEPARATOR) {
        let (name, value) = parse_field(part)?;
        fields.insert(name.to_string(), value.to_string());
    }

    Ok(TelemetrySnapshot::new(fields, now_ms()))
}

fn parse_field(part: &str) -> Result<(&str, &str), CodecError> {
    let malformed = || CodecError::MalformedField {
        field: part.to_string(),
    };

    let (name, value) = part.split_once(VALUE_SEPARATOR).ok_or_else(malformed)?;
    let name = name.trim();
    let value = value.trim();

    if name.is_empty() || value.contains(VALUE_SEPARATOR) {
        return Err(malformed());
    }

    Ok((name, value))
}

/// Decode a response datagram; the text is returned exactly as received
pub fn decode_response(datagram: &[u8]) -> Result<String, CodecError> {
    decode_text(datagram).map(str::to_string)
}

/// Check that a command is sendable: non-empty printable ASCII
pub fn validate_command(command: &str) -> Result<(), CodecError> {
    if command.trim().is_empty() {
        return Err(CodecError::EmptyCommand);
    }
    if !command.is_ascii() {
        return Err(CodecError::NonAsciiCommand {
            command: command.to_string(),
        });
    }
    if command.chars().any(|c| c.is_ascii_control()) {
        return Err(CodecError::ControlCharacter {
            command: command.to_string(),
        });
    }
    Ok(())
}

/// Encode a command into its datagram payload
pub fn encode_command(command: &str) -> Result<Bytes, CodecError> {
    validate_command(command)?;
    Ok(Bytes::copy_from_slice(command.as_bytes()))
}
