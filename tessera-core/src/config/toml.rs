//! Panel profile parser
//!
//! A minimal TOML reader for the `[screen]` section of a board profile. It
//! does NOT support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (quoted strings and integers)
//! - Decimal and `0x` hexadecimal integers, `_` separators
//! - A single `[screen]` section header
//! - Comments (# ...)
//!
//! ```text
//! [screen]
//! width = 240
//! height = 240
//! format = "rgb565"
//! mode = "partial"
//! buffer_size = 9600
//! h_align = 2
//! v_align = 2
//! background = 0x0000
//! ```

use super::{ScreenConfig, UpdateMode};
use crate::surface::PixelFormat;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key is not recognized
    UnknownKey,
    /// Line is not a `key = value` pair
    InvalidLine,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// No `[screen]` section was found
    MissingSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Screen,
}

/// Parse a panel profile into a [`ScreenConfig`]
///
/// Keys that are not present keep their [`ScreenConfig::default`] values.
/// The result is not validated; [`ScreenConfig::validate`] does that.
pub fn parse_config(input: &str) -> Result<ScreenConfig, ParseError> {
    let mut config = ScreenConfig::default();
    let mut section = Section::Root;
    let mut seen_screen = false;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        // Skip empty lines and comments
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = match line[1..line.len() - 1].trim() {
                "screen" => Section::Screen,
                _ => return Err(ParseError::InvalidSection),
            };
            seen_screen = true;
            continue;
        }

        if section != Section::Screen {
            return Err(ParseError::InvalidSection);
        }

        let (key, value) = line.split_once('=').ok_or(ParseError::InvalidLine)?;
        apply_key(&mut config, key.trim(), value.trim())?;
    }

    if !seen_screen {
        return Err(ParseError::MissingSection);
    }
    Ok(config)
}

fn apply_key(config: &mut ScreenConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "width" => config.width = parse_int(value)?,
        "height" => config.height = parse_int(value)?,
        "buffer_size" => config.buffer_size = parse_int(value)?,
        "h_align" => config.h_align = parse_int(value)?,
        "v_align" => config.v_align = parse_int(value)?,
        "background" => config.background = parse_int(value)?,
        "format" => {
            config.format =
                PixelFormat::from_name(parse_str(value)?).ok_or(ParseError::InvalidValue)?
        }
        "mode" => {
            config.mode = UpdateMode::from_name(parse_str(value)?).ok_or(ParseError::InvalidValue)?
        }
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

/// Drop a trailing `# comment`, ignoring `#` inside quotes
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_str(value: &str) -> Result<&str, ParseError> {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ParseError::InvalidValue)
}

fn parse_int<T: TryFrom<u64>>(value: &str) -> Result<T, ParseError> {
    let mut digits: heapless::String<24> = heapless::String::new();
    for ch in value.chars().filter(|&c| c != '_') {
        digits.push(ch).map_err(|_| ParseError::InvalidValue)?;
    }

    let parsed = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => digits.parse::<u64>(),
    }
    .map_err(|_| ParseError::InvalidValue)?;

    T::try_from(parsed).map_err(|_| ParseError::InvalidValue)
}
