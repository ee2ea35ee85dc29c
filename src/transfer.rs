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

//! Chunked binary transfer.
//!
//! The payload goes out in frames of one flag byte plus at most 62 payload
//! bytes. The device answers each frame with a single handshake byte and the
//! next frame is not sent before that byte arrives. A transport failure ends
//! the transfer; retrying is up to the caller.

use std::marker::PhantomData;
use tracing::{debug, info};
use crate::error::{LinkError, TransferError};
use crate::link::LinkSession;
use crate::protocol::CHUNK_SIZE;

// ============================================================================
// Progress
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSession {
    pub total_bytes: usize,
    /// Bytes the device has acknowledged
    pub sent_bytes: usize,
    pub chunk_size: usize,
    pub flag: u8,
}

// ============================================================================
// States
// ============================================================================

pub struct Idle;
pub struct Sending;
pub struct AwaitingAck;
pub struct Done;

// ============================================================================
// FSM Structure
// ============================================================================

pub struct TransferFsm<'a, State> {
    state: PhantomData<State>,
    link: &'a mut LinkSession,
    payload: &'a [u8],
    session: TransferSession,
    // End offset of the chunk waiting for its handshake
    chunk_end: usize,
}

// ============================================================================
// Trait
// ============================================================================

pub trait TransferState<'a>: Send + 'a {
    fn step(self: Box<Self>) -> Result<Next<'a>, TransferError>;

    fn progress(&self) -> TransferSession;

    fn is_done(&self) -> bool {
        false
    }
}

pub type Next<'a> = Box<dyn TransferState<'a> + 'a>;

// ============================================================================
// Helper to transition states
// ============================================================================

impl<'a, S> TransferFsm<'a, S> {
    fn transition<T>(self) -> Box<TransferFsm<'a, T>> {
        Box::new(TransferFsm {
            state: PhantomData,
            link: self.link,
            payload: self.payload,
            session: self.session,
            chunk_end: self.chunk_end,
        })
    }

    fn abort(&self, source: LinkError) -> TransferError {
        let type_name = std::any::type_name::<S>();
        let state_name = type_name.split("::").last().unwrap_or(type_name);
        tracing::error!(
            "Transfer failed in state {} after {} of {} bytes: {}",
            state_name, self.session.sent_bytes, self.session.total_bytes, source
        );
        TransferError { offset: self.session.sent_bytes, source }
    }
}

// ============================================================================
// State Implementations
// ============================================================================

impl<'a> TransferState<'a> for TransferFsm<'a, Idle> {
    fn step(self: Box<Self>) -> Result<Next<'a>, TransferError> {
        let fsm = *self;
        if fsm.payload.is_empty() {
            debug!("Nothing to transfer");
            Ok(fsm.transition::<Done>() as Next<'a>)
        } else {
            Ok(fsm.transition::<Sending>() as Next<'a>)
        }
    }

    fn progress(&self) -> TransferSession {
        self.session
    }
}

impl<'a> TransferState<'a> for TransferFsm<'a, Sending> {
    fn step(self: Box<Self>) -> Result<Next<'a>, TransferError> {
        let mut fsm = *self;
        let start = fsm.session.sent_bytes;
        let end = (start + fsm.session.chunk_size).min(fsm.payload.len());

        if let Err(e) = fsm.link.send_tagged_chunk(&fsm.payload[start..end], fsm.session.flag) {
            return Err(fsm.abort(e));
        }
        debug!("Sent chunk {}..{}, waiting for handshake", start, end);

        fsm.chunk_end = end;
        Ok(fsm.transition::<AwaitingAck>() as Next<'a>)
    }

    fn progress(&self) -> TransferSession {
        self.session
    }
}

impl<'a> TransferState<'a> for TransferFsm<'a, AwaitingAck> {
    fn step(self: Box<Self>) -> Result<Next<'a>, TransferError> {
        let mut fsm = *self;

        match fsm.link.receive_ack_byte() {
            Ok(ack) => {
                debug!("Received handshake 0x{:02X}", ack);
                fsm.session.sent_bytes = fsm.chunk_end;
                if fsm.session.sent_bytes < fsm.session.total_bytes {
                    Ok(fsm.transition::<Sending>() as Next<'a>)
                } else {
                    Ok(fsm.transition::<Done>() as Next<'a>)
                }
            }
            Err(e) => Err(fsm.abort(e)),
        }
    }

    fn progress(&self) -> TransferSession {
        self.session
    }
}

impl<'a> TransferState<'a> for TransferFsm<'a, Done> {
    fn step(self: Box<Self>) -> Result<Next<'a>, TransferError> {
        Ok(self as Next<'a>)
    }

    fn progress(&self) -> TransferSession {
        self.session
    }

    fn is_done(&self) -> bool {
        true
    }
}

// ============================================================================
// Constructor & Runner
// ============================================================================

impl<'a> TransferFsm<'a, Idle> {
    pub fn new(link: &'a mut LinkSession, payload: &'a [u8], flag: u8) -> Next<'a> {
        Box::new(TransferFsm {
            state: PhantomData::<Idle>,
            link,
            payload,
            session: TransferSession {
                total_bytes: payload.len(),
                sent_bytes: 0,
                chunk_size: CHUNK_SIZE,
                flag,
            },
            chunk_end: 0,
        })
    }
}

/// Streams `payload` to the device, one acknowledged chunk at a time.
pub fn transfer(link: &mut LinkSession, payload: &[u8], flag: u8) -> Result<TransferSession, TransferError> {
    let mut state = TransferFsm::new(link, payload, flag);
    while !state.is_done() {
        state = state.step()?;
    }
    let session = state.progress();
    info!("Transferred {} bytes (flag {})", session.sent_bytes, session.flag);
    Ok(session)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::MockSerialPort;

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn frames(payload: &[u8], flag: u8) -> Vec<u8> {
        let mut out = Vec::new();
        for chunk in payload.chunks(CHUNK_SIZE) {
            out.push(flag);
            out.extend_from_slice(chunk);
        }
        out
    }

    fn link(acks: Vec<Option<u8>>, expected_writes: Vec<u8>) -> LinkSession {
        LinkSession::new(Box::new(MockSerialPort::new(acks, expected_writes)))
    }

    #[test]
    fn test_round_trips_per_length() {
        for len in [0usize, 1, 61, 62, 63, 124, 125, 512] {
            let data = payload(len);
            let chunks = len.div_ceil(CHUNK_SIZE);
            let mut link = link(vec![Some(b'A'); chunks], frames(&data, 1));

            let session = transfer(&mut link, &data, 1).expect("transfer");
            assert_eq!(session.sent_bytes, len);
            assert_eq!(session.total_bytes, len);
        }
    }

    #[test]
    fn test_progress_increases_with_each_handshake() {
        let data = payload(200);
        let mut link = link(vec![Some(0); 4], frames(&data, 1));

        let mut state = TransferFsm::new(&mut link, &data, 1);
        let mut acknowledged = vec![state.progress().sent_bytes];
        while !state.is_done() {
            state = state.step().expect("step");
            let sent = state.progress().sent_bytes;
            if sent != *acknowledged.last().unwrap() {
                acknowledged.push(sent);
            }
        }
        assert_eq!(acknowledged, vec![0, 62, 124, 186, 200]);
    }

    #[test]
    fn test_empty_payload_sends_nothing() {
        let mut link = link(vec![], vec![]);
        let session = transfer(&mut link, &[], 1).unwrap();
        assert_eq!(session.sent_bytes, 0);
    }

    #[test]
    fn test_flag_precedes_every_chunk() {
        let data = payload(70);
        let mut expected = vec![7];
        expected.extend_from_slice(&data[..62]);
        expected.push(7);
        expected.extend_from_slice(&data[62..]);
        let mut link = link(vec![Some(1), None, Some(1)], expected);
        transfer(&mut link, &data, 7).unwrap();
    }

    #[test]
    fn test_handshake_failure_reports_acknowledged_offset() {
        let data = payload(512);
        // Two handshakes, then the device disappears while chunk 3 is pending
        let mut link = link(vec![Some(0), Some(0)], frames(&data[..186], 1));

        let err = transfer(&mut link, &data, 1).unwrap_err();
        assert_eq!(err.offset, 124);
        assert!(matches!(err.source, LinkError::Disconnected));
    }

    #[test]
    fn test_first_handshake_failure_reports_zero() {
        let data = payload(10);
        let mut link = link(vec![], frames(&data, 1));
        let err = transfer(&mut link, &data, 1).unwrap_err();
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_send_failure_reports_acknowledged_offset() {
        let data = payload(130);
        let serial = MockSerialPort::new(vec![Some(0)], frames(&data[..62], 1))
            .fail_writes_after(CHUNK_SIZE + 1);
        let mut link = LinkSession::new(Box::new(serial));

        let err = transfer(&mut link, &data, 1).unwrap_err();
        assert_eq!(err.offset, 62);
        assert!(matches!(err.source, LinkError::Io(_)));
    }
}
