//! Structural check for generated frames.
//!
//! Guards against truncation and assembly mistakes before a frame leaves the
//! process. It is not a grammar check.

/// Frame-start marker.
pub const FRAME_START: &str = "^XA";

/// Frame-end marker.
pub const FRAME_END: &str = "^XZ";

/// Returns `true` iff the trimmed frame starts with `^XA` and ends with `^XZ`.
pub fn validate(frame: &str) -> bool {
    let trimmed = frame.trim();
    trimmed.len() >= FRAME_START.len() + FRAME_END.len()
        && trimmed.starts_with(FRAME_START)
        && trimmed.ends_with(FRAME_END)
}
