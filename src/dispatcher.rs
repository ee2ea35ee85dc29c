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

//! Host side request loop.
//!
//! The device polls with `GET_PD` and pushes `SET_PV` / `MUTE_PROC` when the
//! knob or buttons are used. Names are matched against a fresh enumeration
//! on every request, because sessions come and go between polls.

use tracing::{debug, info, warn};
use crate::audio::{volume_percent, AudioSessionProvider, SessionId};
use crate::codec::{encode_process_data, ProcessVolumeRecord, Request};
use crate::error::{CommandError, DispatchError, LineError, LinkError};
use crate::link::LinkSession;
use crate::names::session_display_name;

pub struct Dispatcher<P> {
    link: LinkSession,
    audio: P,
}

impl<P: AudioSessionProvider> Dispatcher<P> {
    pub fn new(link: LinkSession, audio: P) -> Self {
        Dispatcher { link, audio }
    }

    pub fn audio(&self) -> &P {
        &self.audio
    }

    /// Gives the provider back once the link is gone, for the next session.
    pub fn into_audio(self) -> P {
        self.audio
    }

    /// Announces the host and serves requests until the link fails.
    pub fn run(&mut self) -> Result<(), LinkError> {
        self.link.announce()?;
        info!("Link ready, waiting for requests");
        loop {
            self.serve_one()?;
        }
    }

    /// Reads and handles one request line. Only link failures are returned;
    /// bad requests are logged and dropped.
    pub fn serve_one(&mut self) -> Result<(), LinkError> {
        let line = match self.link.receive_line() {
            Ok(line) => line,
            Err(LineError::Link(e)) => return Err(e),
            Err(LineError::Format(e)) => {
                warn!("Dropping unreadable request: {}", e);
                return Ok(());
            }
        };
        debug!("Received request: {:?}", line);

        match self.handle_line(&line) {
            Ok(()) => Ok(()),
            Err(DispatchError::Link(e)) => Err(e),
            Err(DispatchError::Command(CommandError::UnknownCommand { verb })) => {
                warn!("Ignoring unknown command {:?}", verb);
                Ok(())
            }
            Err(e) => {
                warn!("Dropping request {:?}: {}", line, e);
                Ok(())
            }
        }
    }

    pub fn handle_line(&mut self, line: &str) -> Result<(), DispatchError> {
        match Request::decode(line)? {
            Request::GetProcessData => {
                let records = self.process_data()?;
                let response = encode_process_data(&records)?;
                self.link.send_line(&response)?;
            }
            Request::SetVolume { name, value } => {
                let percent = value.clamp(0, 100);
                if percent != value {
                    warn!("Volume {} for {:?} out of range, using {}", value, name, percent);
                }
                for id in self.sessions_named(&name)? {
                    if let Err(e) = self.audio.set_volume(id, percent as f32 / 100.0) {
                        warn!("Could not set volume of {:?} (session {}): {}", name, id.0, e);
                    }
                }
            }
            Request::Mute { name, mute } => {
                for id in self.sessions_named(&name)? {
                    if let Err(e) = self.audio.set_mute(id, mute) {
                        warn!("Could not mute {:?} (session {}): {}", name, id.0, e);
                    }
                }
            }
        }
        Ok(())
    }

    /// Snapshot of every live session, in enumeration order.
    pub fn process_data(&mut self) -> Result<Vec<ProcessVolumeRecord>, DispatchError> {
        self.audio
            .list_sessions()?
            .into_iter()
            .map(|session| -> Result<ProcessVolumeRecord, DispatchError> {
                Ok(ProcessVolumeRecord {
                    name: session_display_name(session.executable.as_deref())?,
                    volume_percent: volume_percent(session.volume),
                })
            })
            .collect()
    }

    fn sessions_named(&mut self, name: &str) -> Result<Vec<SessionId>, DispatchError> {
        let mut ids = Vec::new();
        for session in self.audio.list_sessions()? {
            if session_display_name(session.executable.as_deref())? == name {
                ids.push(session.id);
            }
        }
        if ids.is_empty() {
            debug!("No session named {:?}", name);
        }
        Ok(ids)
    }
}

// ============================================================================
// Tests
// ============================================================================
