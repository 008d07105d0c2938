//! Raw FIX tag-value splitting.
//!
//! Accepts input where `tag=value` pairs are separated by SOH (`0x01`),
//! `|`, or `\n`/`\r\n`. Each pair is split on the **first** `=`. Empty
//! segments, segments without `=`, and segments whose tag is not a
//! positive integer are skipped silently; session-layer tags are filtered
//! out before the pairs reach any downstream stage.

use crate::error::FixParseError;
use crate::{is_session_tag, Tag};

/// Which pair separator to assume when splitting raw FIX input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SeparatorHint {
    /// Detect: SOH if present, else `|`, else newline.
    #[default]
    Auto,
    /// ASCII SOH (`0x01`), the on-the-wire FIX separator.
    Soh,
    /// `|`, the common log-file rendition.
    Pipe,
    /// `\n` (a trailing `\r` per segment is trimmed).
    Newline,
}

const SOH: char = '\u{1}';

/// Split raw FIX text into ordered `(tag, value)` pairs.
///
/// Session tags (8, 9, 10, 35) are dropped. Returns
/// [`FixParseError::Empty`] when nothing recoverable remains — a message
/// consisting solely of session tags still counts as recovered input.
pub fn parse_tag_values(
    input: &str,
    hint: SeparatorHint,
) -> Result<Vec<(Tag, String)>, FixParseError> {
    let sep = match hint {
        SeparatorHint::Soh => SOH,
        SeparatorHint::Pipe => '|',
        SeparatorHint::Newline => '\n',
        SeparatorHint::Auto => detect_separator(input),
    };

    let mut pairs = Vec::new();
    let mut recovered_any = false;
    for raw in input.split(sep) {
        let segment = raw.strip_suffix('\r').unwrap_or(raw);
        if segment.is_empty() {
            continue;
        }
        let Some((tag_str, value)) = segment.split_once('=') else {
            continue;
        };
        let Ok(tag) = tag_str.trim().parse::<Tag>() else {
            continue;
        };
        if tag == 0 {
            continue;
        }
        recovered_any = true;
        if is_session_tag(tag) {
            continue;
        }
        pairs.push((tag, value.to_owned()));
    }

    if !recovered_any {
        return Err(FixParseError::Empty);
    }
    Ok(pairs)
}

fn detect_separator(input: &str) -> char {
    if input.contains(SOH) {
        SOH
    } else if input.contains('|') {
        '|'
    } else {
        '\n'
    }
}
