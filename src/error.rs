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

//! Error types for the knob link.
//!
//! Parsing and encoding errors are plain values returned to the caller.
//! `LinkError` covers everything the transport can do wrong and is never
//! swallowed; `TransferError` wraps it with the number of bytes the device
//! had acknowledged when the transfer died.

use thiserror::Error;

/// Grammar violation in an XBM source or in a decoded line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("missing line {line}: expected {expected}")]
    MissingLine { line: usize, expected: &'static str },

    #[error("invalid width statement: {line:?}")]
    WidthDeclaration { line: String },

    #[error("invalid height statement: {line:?}")]
    HeightDeclaration { line: String },

    #[error("invalid array declaration statement: {line:?}")]
    ArrayDeclaration { line: String },

    #[error("invalid bits array: missing ',}};' terminator (ends with {tail:?})")]
    MissingTerminator { tail: String },

    #[error("encountered invalid byte: {token:?}")]
    InvalidByte { token: String },

    #[error("array does not match width / height (bit count {actual}, expected {expected})")]
    BitCount { actual: usize, expected: usize },

    #[error("malformed request arguments: {line:?}")]
    MalformedRequest { line: String },

    #[error("not an integer: {token:?}")]
    InvalidInteger { token: String },

    #[error("malformed response record: {token:?}")]
    MalformedResponse { token: String },

    #[error("received non-ASCII line {bytes:02X?}")]
    NonAsciiLine { bytes: Vec<u8> },

    #[error("received line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
}

/// An outgoing field would break the line framing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("process name {name:?} cannot contain '%' or '&'")]
    ReservedDelimiter { name: String },
}

/// Failure of the byte stream underneath a link session.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("device closed the connection")]
    Disconnected,

    #[error("refusing to send non-ASCII text {0:?}")]
    NonAsciiOutput(String),

}

/// Failure to receive one line: either the transport broke, or the line
/// itself was garbled and the stream is still in sync.
#[derive(Debug, Error)]
pub enum LineError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// A chunked transfer was aborted by a transport failure.
#[derive(Debug, Error)]
#[error("transfer aborted after {offset} acknowledged bytes: {source}")]
pub struct TransferError {
    /// Bytes the device acknowledged before the failure
    pub offset: usize,
    #[source]
    pub source: LinkError,
}

/// A request line that could not be turned into a `Request`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("unknown command {verb:?}")]
    UnknownCommand { verb: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AudioError {
    #[error("audio session {id} no longer exists")]
    SessionGone { id: u32 },

    #[error("audio backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrimError {
    #[error("suffix ({suffix} chars) and {dots} dots leave no room in {width} chars")]
    NoRoom { width: usize, suffix: usize, dots: usize },
}

/// Anything that can go wrong while serving one request.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Trim(#[from] TrimError),
}
