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

//! XBM icon parsing.
//!
//! Only the exact shape produced by common bitmap editors for a 64x64 icon
//! is accepted. The chunked transfer relies on the byte count being right,
//! so nothing here is lenient.

use std::path::Path;
use crate::error::FormatError;
use crate::protocol::ICON_SIZE;

const TERMINATOR: &str = ",};";

/// A decoded monochrome bitmap, one bit per pixel, rows packed into bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapImage {
    width: usize,
    height: usize,
    bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Format(#[from] FormatError),
}

impl BitmapImage {
    /// Reads and parses an XBM file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::parse(&source)?)
    }

    /// Parses XBM source text.
    ///
    /// The first three lines must be the width, height and array
    /// declarations; everything after them is the byte array, whitespace
    /// insensitive, ending in `,};`.
    pub fn parse(source: &str) -> Result<Self, FormatError> {
        let mut lines = source.split('\n');

        let width_line = next_line(&mut lines, 1, "width statement")?;
        if !is_define(width_line, "_width") {
            return Err(FormatError::WidthDeclaration { line: width_line.to_string() });
        }

        let height_line = next_line(&mut lines, 2, "height statement")?;
        if !is_define(height_line, "_height") {
            return Err(FormatError::HeightDeclaration { line: height_line.to_string() });
        }

        let array_line = next_line(&mut lines, 3, "array declaration statement")?;
        if !is_array_open(array_line) {
            return Err(FormatError::ArrayDeclaration { line: array_line.to_string() });
        }

        let array: String = lines
            .flat_map(|line| line.chars())
            .filter(|c| !c.is_whitespace())
            .collect();

        let Some(body) = array.strip_suffix(TERMINATOR) else {
            let tail_start = array.char_indices().rev().nth(2).map_or(0, |(i, _)| i);
            return Err(FormatError::MissingTerminator { tail: array[tail_start..].to_string() });
        };

        let bytes = body
            .split(',')
            .map(parse_byte)
            .collect::<Result<Vec<u8>, _>>()?;

        let expected = ICON_SIZE * ICON_SIZE;
        if bytes.len() * 8 != expected {
            return Err(FormatError::BitCount { actual: bytes.len() * 8, expected });
        }

        Ok(BitmapImage { width: ICON_SIZE, height: ICON_SIZE, bytes })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn next_line<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
    line: usize,
    expected: &'static str,
) -> Result<&'a str, FormatError> {
    lines
        .next()
        .map(|l| l.trim_end_matches('\r'))
        .ok_or(FormatError::MissingLine { line, expected })
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `#define <ident><suffix> 64`
fn is_define(line: &str, suffix: &str) -> bool {
    let Some(rest) = line.trim_end().strip_prefix("#define ") else {
        return false;
    };
    let Some((name, value)) = rest.split_once(' ') else {
        return false;
    };
    let Some(ident) = name.strip_suffix(suffix) else {
        return false;
    };
    is_identifier(ident) && value == ICON_SIZE.to_string()
}

/// `static char <ident>_bits[] = {`
fn is_array_open(line: &str) -> bool {
    line.trim_end()
        .strip_prefix("static char ")
        .and_then(|rest| rest.strip_suffix("_bits[] = {"))
        .is_some_and(is_identifier)
}

/// `0x` followed by exactly two uppercase hex digits.
fn parse_byte(token: &str) -> Result<u8, FormatError> {
    let invalid = || FormatError::InvalidByte { token: token.to_string() };
    let digits = token.strip_prefix("0x").ok_or_else(invalid)?;
    let valid = digits.len() == 2
        && digits.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b));
    if !valid {
        return Err(invalid());
    }
    u8::from_str_radix(digits, 16).map_err(|_| invalid())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "#define icon_width 64\n#define icon_height 64\nstatic char icon_bits[] = {\n";

    fn xbm_with(bytes: &[String]) -> String {
        let mut source = HEADER.to_string();
        for row in bytes.chunks(12) {
            source.push_str("   ");
            for b in row {
                source.push_str(b);
                source.push_str(", ");
            }
            source.push('\n');
        }
        source.push_str("};\n");
        source
    }

    fn valid_tokens() -> Vec<String> {
        (0..512).map(|i| format!("0x{:02X}", (i * 7 % 256) as u8)).collect()
    }

    #[test]
    fn test_parse_valid_icon() {
        let image = BitmapImage::parse(&xbm_with(&valid_tokens())).expect("valid icon");
        assert_eq!(image.width(), 64);
        assert_eq!(image.height(), 64);
        assert_eq!(image.bytes().len(), 512);
        assert_eq!(image.bytes()[0], 0x00);
        assert_eq!(image.bytes()[1], 0x07);
        assert_eq!(image.bytes()[511], (511 * 7 % 256) as u8);
    }

    #[test]
    fn test_parse_crlf_and_differing_identifiers() {
        let mut source = String::from(
            "#define a_width 64\r\n#define b_height 64\r\nstatic char c_bits[] = {\r\n",
        );
        source.push_str(&valid_tokens().join(",\r\n"));
        source.push_str(",\r\n};\r\n");
        assert_eq!(BitmapImage::parse(&source).unwrap().bytes().len(), 512);
    }

    #[test]
    fn test_wrong_dimensions_rejected() {
        let source = xbm_with(&valid_tokens()).replace("icon_width 64", "icon_width 32");
        assert!(matches!(
            BitmapImage::parse(&source),
            Err(FormatError::WidthDeclaration { .. })
        ));

        let source = xbm_with(&valid_tokens()).replace("icon_height 64", "icon_height 640");
        assert!(matches!(
            BitmapImage::parse(&source),
            Err(FormatError::HeightDeclaration { .. })
        ));

        let source = xbm_with(&valid_tokens()).replace("#define icon_width", "#define icon_w");
        assert!(matches!(
            BitmapImage::parse(&source),
            Err(FormatError::WidthDeclaration { .. })
        ));
    }

    #[test]
    fn test_bad_array_declaration() {
        let source = xbm_with(&valid_tokens()).replace("static char", "static unsigned char");
        assert!(matches!(
            BitmapImage::parse(&source),
            Err(FormatError::ArrayDeclaration { .. })
        ));
    }

    #[test]
    fn test_missing_lines() {
        assert_eq!(
            BitmapImage::parse("#define icon_width 64"),
            Err(FormatError::MissingLine { line: 2, expected: "height statement" })
        );
    }

    #[test]
    fn test_missing_or_altered_terminator() {
        let source = xbm_with(&valid_tokens()).replace("};", "}");
        assert!(matches!(
            BitmapImage::parse(&source),
            Err(FormatError::MissingTerminator { .. })
        ));

        let mut source = HEADER.to_string();
        source.push_str(&valid_tokens().join(","));
        source.push_str("};");
        assert!(matches!(
            BitmapImage::parse(&source),
            Err(FormatError::MissingTerminator { .. })
        ));
    }

    #[test]
    fn test_invalid_byte_tokens() {
        for bad in ["0xab", "0x1", "0x123", "FF", "0XFF", "0xG0", ""] {
            let mut tokens = valid_tokens();
            tokens[100] = bad.to_string();
            assert_eq!(
                BitmapImage::parse(&xbm_with(&tokens)),
                Err(FormatError::InvalidByte { token: bad.to_string() }),
                "token {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_wrong_byte_count() {
        let mut tokens = valid_tokens();
        tokens.pop();
        assert_eq!(
            BitmapImage::parse(&xbm_with(&tokens)),
            Err(FormatError::BitCount { actual: 511 * 8, expected: 4096 })
        );
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("knoblink_no_such_icon.xbm");
        assert!(matches!(BitmapImage::load(&path), Err(LoadError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("knoblink_load_icon.xbm");
        std::fs::write(&path, xbm_with(&valid_tokens())).unwrap();
        let image = BitmapImage::load(&path).expect("load");
        assert_eq!(image.bytes().len(), 512);
        std::fs::remove_file(&path).ok();
    }
}
