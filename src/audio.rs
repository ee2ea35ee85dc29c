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

//! Audio session capability.
//!
//! The knob link only needs to list sessions and change their volume or
//! mute state. OS backends implement `AudioSessionProvider`; `StaticSessions`
//! keeps them in memory.

use std::path::PathBuf;
use tracing::debug;
use crate::error::AudioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct AudioSession {
    pub id: SessionId,
    /// Owning executable, `None` for the system sounds session
    pub executable: Option<PathBuf>,
    /// Master volume, 0.0 to 1.0
    pub volume: f32,
    pub muted: bool,
}

pub trait AudioSessionProvider {
    fn list_sessions(&mut self) -> Result<Vec<AudioSession>, AudioError>;

    fn set_volume(&mut self, id: SessionId, volume: f32) -> Result<(), AudioError>;

    fn set_mute(&mut self, id: SessionId, mute: bool) -> Result<(), AudioError>;
}

/// Converts a 0.0 to 1.0 volume into the percentage shown on the device.
pub fn volume_percent(volume: f32) -> u8 {
    (volume * 100.0).round().clamp(0.0, 100.0) as u8
}

// ============================================================================
// In-memory provider
// ============================================================================

#[derive(Debug, Default)]
pub struct StaticSessions {
    sessions: Vec<AudioSession>,
    next_id: u32,
}

impl StaticSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, executable: Option<PathBuf>, volume: f32) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        self.sessions.push(AudioSession {
            id,
            executable,
            volume: volume.clamp(0.0, 1.0),
            muted: false,
        });
        id
    }

    pub fn remove(&mut self, id: SessionId) -> Option<AudioSession> {
        let pos = self.sessions.iter().position(|s| s.id == id)?;
        Some(self.sessions.remove(pos))
    }

    pub fn get(&self, id: SessionId) -> Option<&AudioSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    fn get_mut(&mut self, id: SessionId) -> Result<&mut AudioSession, AudioError> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(AudioError::SessionGone { id: id.0 })
    }
}

impl AudioSessionProvider for StaticSessions {
    fn list_sessions(&mut self) -> Result<Vec<AudioSession>, AudioError> {
        Ok(self.sessions.clone())
    }

    fn set_volume(&mut self, id: SessionId, volume: f32) -> Result<(), AudioError> {
        let session = self.get_mut(id)?;
        session.volume = volume.clamp(0.0, 1.0);
        debug!("Session {} volume set to {:.2}", id.0, session.volume);
        Ok(())
    }

    fn set_mute(&mut self, id: SessionId, mute: bool) -> Result<(), AudioError> {
        let session = self.get_mut(id)?;
        session.muted = mute;
        debug!("Session {} mute set to {}", id.0, mute);
        Ok(())
    }
}
