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

//! Knob link protocol constants

/// Ready - host announces it is listening, sent once right after the link opens
pub const READY: u8 = b'H';

/// Maximum payload bytes in one binary frame, bounded by the device receive buffer
pub const CHUNK_SIZE: usize = 62;

/// Flag byte tagging a binary frame as icon bitmap data
pub const IMAGE_FLAG: u8 = 1;

/// Longest request line accepted from the device, `\r\n` terminator excluded
pub const MAX_LINE_LEN: usize = 256;

/// Separates the verb from its argument, and records from each other in a response
pub const FIELD_SEPARATOR: char = '&';

/// Separates a process name from its value
pub const VALUE_SEPARATOR: char = '%';

/// Terminates a process data response
pub const RESPONSE_END: char = '$';

/// Device requests the current process names and volumes
pub const GET_PROCESS_DATA: &str = "GET_PD";

/// Device sets the volume of a process: `SET_PV&NAME%VALUE`
pub const SET_PROCESS_VOLUME: &str = "SET_PV";

/// Device mutes or unmutes a process: `MUTE_PROC&NAME%FLAG`
pub const MUTE_PROCESS: &str = "MUTE_PROC";

/// Display name of the session that has no owning executable
pub const SYSTEM_SOUNDS: &str = "Systemsounds";

/// Visible characters available for a process name on the device display
pub const DISPLAY_NAME_WIDTH: usize = 16;

/// Dots appended to a process name that had to be shortened
pub const TRUNCATION_DOTS: usize = 2;

/// Icon width and height in pixels supported by the device display
pub const ICON_SIZE: usize = 64;
