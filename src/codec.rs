// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Line codec for the text half of the protocol.
//!
//! Requests arrive from the device as `VERB` or `VERB&NAME%VALUE`, with the
//! line terminator already stripped. The only response is the process data
//! list `NAME%VALUE&NAME%VALUE&$`.

use crate::error::{CommandError, EncodingError, FormatError};
use crate::protocol::*;

/// One line of the process data response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessVolumeRecord {
    pub name: String,
    pub volume_percent: u8,
}

/// A request sent by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    GetProcessData,
    SetVolume { name: String, value: i32 },
    Mute { name: String, mute: bool },
}

impl Request {
    pub fn decode(line: &str) -> Result<Self, CommandError> {
        let (verb, args) = match line.split_once(FIELD_SEPARATOR) {
            Some((verb, args)) => (verb, Some(args)),
            None => (line, None),
        };

        match (verb, args) {
            (GET_PROCESS_DATA, None) => Ok(Request::GetProcessData),
            (SET_PROCESS_VOLUME, Some(args)) => {
                let (name, value) = split_argument(line, args)?;
                let value = value
                    .parse::<i32>()
                    .map_err(|_| FormatError::InvalidInteger { token: value.to_string() })?;
                Ok(Request::SetVolume { name: name.to_string(), value })
            }
            (MUTE_PROCESS, Some(args)) => {
                let (name, flag) = split_argument(line, args)?;
                // Any flag other than "0" mutes
                Ok(Request::Mute { name: name.to_string(), mute: flag != "0" })
            }
            (GET_PROCESS_DATA | SET_PROCESS_VOLUME | MUTE_PROCESS, _) => {
                Err(FormatError::MalformedRequest { line: line.to_string() }.into())
            }
            _ => Err(CommandError::UnknownCommand { verb: verb.to_string() }),
        }
    }

    /// Renders the request the way the device sends it, without line terminator.
    pub fn encode(&self) -> Result<String, EncodingError> {
        match self {
            Request::GetProcessData => Ok(GET_PROCESS_DATA.to_string()),
            Request::SetVolume { name, value } => {
                check_name(name)?;
                Ok(format!("{SET_PROCESS_VOLUME}{FIELD_SEPARATOR}{name}{VALUE_SEPARATOR}{value}"))
            }
            Request::Mute { name, mute } => {
                check_name(name)?;
                let flag = if *mute { 1 } else { 0 };
                Ok(format!("{MUTE_PROCESS}{FIELD_SEPARATOR}{name}{VALUE_SEPARATOR}{flag}"))
            }
        }
    }
}

/// Builds the `GET_PD` response. Nothing is produced if any name would
/// break the framing.
pub fn encode_process_data(records: &[ProcessVolumeRecord]) -> Result<String, EncodingError> {
    records.iter().try_for_each(|r| check_name(&r.name))?;

    let mut out = String::new();
    for record in records {
        out.push_str(&record.name);
        out.push(VALUE_SEPARATOR);
        out.push_str(&record.volume_percent.to_string());
        out.push(FIELD_SEPARATOR);
    }
    out.push(RESPONSE_END);
    Ok(out)
}

/// Parses a `GET_PD` response back into records, as the device does.
pub fn decode_process_data(response: &str) -> Result<Vec<ProcessVolumeRecord>, FormatError> {
    let body = response
        .strip_suffix(RESPONSE_END)
        .ok_or_else(|| FormatError::MalformedResponse { token: response.to_string() })?;

    body.split_terminator(FIELD_SEPARATOR)
        .map(|token| {
            let (name, value) = token
                .split_once(VALUE_SEPARATOR)
                .ok_or_else(|| FormatError::MalformedResponse { token: token.to_string() })?;
            let volume_percent = value
                .parse::<u8>()
                .map_err(|_| FormatError::InvalidInteger { token: value.to_string() })?;
            Ok(ProcessVolumeRecord { name: name.to_string(), volume_percent })
        })
        .collect()
}

fn check_name(name: &str) -> Result<(), EncodingError> {
    if name.contains([VALUE_SEPARATOR, FIELD_SEPARATOR]) {
        return Err(EncodingError::ReservedDelimiter { name: name.to_string() });
    }
    Ok(())
}

fn split_argument<'a>(line: &str, args: &'a str) -> Result<(&'a str, &'a str), FormatError> {
    args.split_once(VALUE_SEPARATOR)
        .ok_or_else(|| FormatError::MalformedRequest { line: line.to_string() })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, volume_percent: u8) -> ProcessVolumeRecord {
        ProcessVolumeRecord { name: name.to_string(), volume_percent }
    }

    #[test]
    fn test_decode_requests() {
        assert_eq!(Request::decode("GET_PD"), Ok(Request::GetProcessData));
        assert_eq!(
            Request::decode("SET_PV&Steam%42"),
            Ok(Request::SetVolume { name: "Steam".to_string(), value: 42 })
        );
        assert_eq!(
            Request::decode("MUTE_PROC&Steam%1"),
            Ok(Request::Mute { name: "Steam".to_string(), mute: true })
        );
        assert_eq!(
            Request::decode("MUTE_PROC&Steam%0"),
            Ok(Request::Mute { name: "Steam".to_string(), mute: false })
        );
        assert_eq!(
            Request::decode("MUTE_PROC&Steam%7"),
            Ok(Request::Mute { name: "Steam".to_string(), mute: true })
        );
    }

    #[test]
    fn test_decode_names_with_spaces_and_dots() {
        assert_eq!(
            Request::decode("SET_PV&Mozilla Firef..%0"),
            Ok(Request::SetVolume { name: "Mozilla Firef..".to_string(), value: 0 })
        );
    }

    #[test]
    fn test_decode_bad_integer() {
        assert_eq!(
            Request::decode("SET_PV&Steam%loud"),
            Err(CommandError::Format(FormatError::InvalidInteger { token: "loud".to_string() }))
        );
        assert_eq!(
            Request::decode("SET_PV&Steam%"),
            Err(CommandError::Format(FormatError::InvalidInteger { token: String::new() }))
        );
    }

    #[test]
    fn test_decode_malformed_arguments() {
        for line in ["SET_PV", "SET_PV&Steam", "MUTE_PROC", "MUTE_PROC&Steam", "GET_PD&x%1"] {
            assert!(
                matches!(
                    Request::decode(line),
                    Err(CommandError::Format(FormatError::MalformedRequest { .. }))
                ),
                "line {:?}",
                line
            );
        }
    }

    #[test]
    fn test_decode_unknown_verb() {
        assert_eq!(
            Request::decode("GET_PV"),
            Err(CommandError::UnknownCommand { verb: "GET_PV".to_string() })
        );
        assert_eq!(
            Request::decode(""),
            Err(CommandError::UnknownCommand { verb: String::new() })
        );
        assert_eq!(
            Request::decode("REBOOT&now%1"),
            Err(CommandError::UnknownCommand { verb: "REBOOT".to_string() })
        );
    }

    #[test]
    fn test_encode_process_data() {
        let records = vec![record("Steam", 42), record("Systemsounds", 100), record("Mozilla Firef..", 0)];
        assert_eq!(
            encode_process_data(&records).unwrap(),
            "Steam%42&Systemsounds%100&Mozilla Firef..%0&$"
        );
    }

    #[test]
    fn test_encode_empty_list() {
        assert_eq!(encode_process_data(&[]).unwrap(), "$");
    }

    #[test]
    fn test_encode_rejects_delimiters() {
        for name in ["100% Orange", "Tom & Jerry"] {
            let records = vec![record("Steam", 42), record(name, 5)];
            assert_eq!(
                encode_process_data(&records),
                Err(EncodingError::ReservedDelimiter { name: name.to_string() })
            );
        }
    }

    #[test]
    fn test_process_data_round_trip() {
        let records = vec![
            record("Systemsounds", 50),
            record("Steam", 0),
            record("Steam", 100),
            record("Discord", 73),
        ];
        let wire = encode_process_data(&records).unwrap();
        assert_eq!(decode_process_data(&wire).unwrap(), records);
        assert_eq!(decode_process_data("$").unwrap(), Vec::new());
    }

    #[test]
    fn test_decode_process_data_errors() {
        assert!(matches!(
            decode_process_data("Steam%42&"),
            Err(FormatError::MalformedResponse { .. })
        ));
        assert!(matches!(
            decode_process_data("Steam&$"),
            Err(FormatError::MalformedResponse { .. })
        ));
        assert!(matches!(
            decode_process_data("Steam%300&$"),
            Err(FormatError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn test_request_round_trip() {
        let requests = [
            Request::GetProcessData,
            Request::SetVolume { name: "Groove Music".to_string(), value: 12 },
            Request::Mute { name: "Steam".to_string(), mute: true },
            Request::Mute { name: "Steam".to_string(), mute: false },
        ];
        for request in requests {
            let line = request.encode().unwrap();
            assert_eq!(Request::decode(&line), Ok(request));
        }
    }

    #[test]
    fn test_request_encode_rejects_delimiters() {
        let request = Request::SetVolume { name: "a&b".to_string(), value: 1 };
        assert!(request.encode().is_err());
    }
}
