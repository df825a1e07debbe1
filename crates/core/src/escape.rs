//! `^FH` hex escaping for field data.
//!
//! Record text is copied into `^FD` payloads verbatim. A `^` or `~` inside a
//! payload would be read by the printer as the start of a new command, so
//! such payloads are emitted after `^FH` with those characters written as
//! underscore-prefixed hex pairs (`_5E`, `_7E`). While `^FH` is active the
//! indicator itself must be escaped too (`_5F`).

use std::borrow::Cow;

/// Default `^FH` indicator character.
pub const HEX_INDICATOR: char = '_';

/// Returns `true` if `content` cannot be placed in `^FD` as-is.
pub fn needs_hex_escape(content: &str) -> bool {
    content.contains(['^', '~'])
}

/// Escape `content` for use after `^FH`.
///
/// Returns the input unchanged (borrowed) when no escaping is needed.
pub fn escape_field_data(content: &str) -> Cow<'_, str> {
    if !needs_hex_escape(content) {
        return Cow::Borrowed(content);
    }
    let mut out = String::with_capacity(content.len() + 8);
    for c in content.chars() {
        match c {
            '^' | '~' | HEX_INDICATOR => {
                out.push(HEX_INDICATOR);
                out.push_str(&format!("{:02X}", c as u32));
            }
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
