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

//! Display names for audio sessions.

use std::path::Path;
use crate::error::TrimError;
use crate::protocol::{DISPLAY_NAME_WIDTH, SYSTEM_SOUNDS, TRUNCATION_DOTS};

/// Executables whose version info is known to carry an unhelpful description
const KNOWN_PROCESSES: &[(&str, &str)] = &[
    (
        r"C:\Program Files\WindowsApps\Microsoft.ZuneMusic_10.20122.11121.0_x64__8wekyb3d8bbwe\Music.UI.exe",
        "Groove Music",
    ),
    (r"C:\Program Files (x86)\Steam\steam.exe", "Steam"),
    (r"C:\Program Files\Mozilla Firefox\firefox.exe", "Mozilla Firefox"),
];

/// Friendly name for an executable: a known alias, else the file name
/// without extension, else the full path.
pub fn resolve_display_name(executable: &Path) -> String {
    let path = executable.to_string_lossy();
    if let Some((_, name)) = KNOWN_PROCESSES.iter().find(|(known, _)| *known == path) {
        return name.to_string();
    }

    // Paths may come from another OS, so split on both separators
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(&*path);
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    if stem.trim().is_empty() {
        path.to_string()
    } else {
        stem.to_string()
    }
}

/// Shortens `name` so that it and `suffix` fit in `width` characters,
/// marking the cut with `dots` dots.
pub fn trim_process_name(name: &str, width: usize, suffix: &str, dots: usize) -> Result<String, TrimError> {
    let name = name.trim();
    let suffix_len = suffix.chars().count();

    if width < suffix_len + dots + 1 {
        return Err(TrimError::NoRoom { width, suffix: suffix_len, dots });
    }

    let mut result = if name.chars().count() + suffix_len > width {
        let keep = width - suffix_len - dots;
        let mut cut: String = name.chars().take(keep).collect();
        cut.extend(std::iter::repeat_n('.', dots));
        cut
    } else {
        name.to_string()
    };
    result.push_str(suffix);
    Ok(result)
}

/// The name a session is shown and addressed by on the device.
pub fn session_display_name(executable: Option<&Path>) -> Result<String, TrimError> {
    let Some(executable) = executable else {
        return Ok(SYSTEM_SOUNDS.to_string());
    };
    // The link is 7-bit
    let name: String = resolve_display_name(executable)
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect();
    trim_process_name(&name, DISPLAY_NAME_WIDTH, "", TRUNCATION_DOTS)
}
