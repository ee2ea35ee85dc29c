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

//! Host side of the knob/display control surface link.
//!
//! The device asks for per-application volumes over a line protocol and
//! changes them with the knob; the host can also push 64x64 icons to the
//! device display using a chunked, handshaked binary transfer.

pub mod audio;
pub mod codec;
pub mod dispatcher;
pub mod error;
pub mod link;
pub mod names;
pub mod protocol;
pub mod serial;
pub mod transfer;
pub mod xbm;

pub use audio::{AudioSession, AudioSessionProvider, SessionId, StaticSessions};
pub use codec::{ProcessVolumeRecord, Request};
pub use dispatcher::Dispatcher;
pub use link::{LinkSession, Payload};
pub use transfer::{transfer, TransferSession};
pub use xbm::BitmapImage;
