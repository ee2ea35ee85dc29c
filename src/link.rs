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

//! Link session: the only owner of the transport.
//!
//! Every operation blocks until it completes or the transport fails. Read
//! timeouts of the underlying port are not errors here; they just mean the
//! device has not said anything yet.

use std::time::Duration;
use tracing::{debug, trace};
use crate::error::{FormatError, LineError, LinkError};
use crate::protocol::{MAX_LINE_LEN, READY};
use crate::serial::SerialPort;

/// How long a single read waits on the port before polling again
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// What goes out on the wire. Text must be ASCII; bytes are sent as they are.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl<'a> From<&'a str> for Payload<'a> {
    fn from(text: &'a str) -> Self {
        Payload::Text(text)
    }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Payload::Bytes(bytes)
    }
}

pub struct LinkSession {
    serial: Box<dyn SerialPort>,
}

impl LinkSession {
    pub fn new(serial: Box<dyn SerialPort>) -> Self {
        LinkSession { serial }
    }

    /// Tells the device the host is listening.
    pub fn announce(&mut self) -> Result<(), LinkError> {
        self.serial.write_all(&[READY])?;
        debug!("Sent: ready '{}'", READY as char);
        Ok(())
    }

    pub fn send(&mut self, payload: Payload<'_>) -> Result<(), LinkError> {
        match payload {
            Payload::Text(text) => {
                if !text.is_ascii() {
                    return Err(LinkError::NonAsciiOutput(text.to_string()));
                }
                self.serial.write_all(text.as_bytes())?;
                debug!("Sent: {:?}", text);
            }
            Payload::Bytes(bytes) => {
                self.serial.write_all(bytes)?;
                debug!("Sent: {} raw bytes", bytes.len());
            }
        }
        Ok(())
    }

    /// Sends a text frame. No terminator is appended; responses carry their own.
    pub fn send_line(&mut self, text: &str) -> Result<(), LinkError> {
        self.send(Payload::Text(text))
    }

    /// Receives one line as raw bytes, without the `\r\n` terminator.
    ///
    /// An overlong line is read through to its `\n` and discarded, so the
    /// next call starts on a line boundary.
    pub fn receive_raw_line(&mut self) -> Result<Vec<u8>, LineError> {
        let mut line = Vec::new();
        let mut overflow = false;
        loop {
            let byte = self.read_byte()?;
            if byte == b'\n' {
                break;
            }
            // Room for the content plus a trailing '\r'
            if line.len() <= MAX_LINE_LEN {
                line.push(byte);
            } else {
                overflow = true;
            }
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if overflow || line.len() > MAX_LINE_LEN {
            return Err(FormatError::LineTooLong { limit: MAX_LINE_LEN }.into());
        }
        Ok(line)
    }

    /// Receives one line as ASCII text, without the `\r\n` terminator.
    pub fn receive_line(&mut self) -> Result<String, LineError> {
        let line = self.receive_raw_line()?;
        if !line.is_ascii() {
            return Err(FormatError::NonAsciiLine { bytes: line }.into());
        }
        let text = String::from_utf8(line)
            .map_err(|e| FormatError::NonAsciiLine { bytes: e.into_bytes() })?;
        debug!("Received: {:?}", text);
        Ok(text)
    }

    /// Writes the flag byte and the chunk as one frame.
    pub fn send_tagged_chunk(&mut self, chunk: &[u8], flag: u8) -> Result<(), LinkError> {
        let mut frame = Vec::with_capacity(chunk.len() + 1);
        frame.push(flag);
        frame.extend_from_slice(chunk);
        self.serial.write_all(&frame)?;
        trace!("Sent: frame flag={} len={}", flag, chunk.len());
        Ok(())
    }

    /// Waits for the single handshake byte the device sends after each chunk.
    pub fn receive_ack_byte(&mut self) -> Result<u8, LinkError> {
        let byte = self.read_byte()?;
        trace!("Received: handshake 0x{:02X}", byte);
        Ok(byte)
    }

    fn read_byte(&mut self) -> Result<u8, LinkError> {
        let mut buf = [0u8; 1];
        loop {
            match self.serial.read_timeout(&mut buf, POLL_INTERVAL) {
                Ok(0) => return Err(LinkError::Disconnected),
                Ok(_) => return Ok(buf[0]),
                Err(e) if matches!(
                    e.kind(),
                    std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
                ) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
