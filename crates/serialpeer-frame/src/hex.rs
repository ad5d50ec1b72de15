//! Hex rendering for diagnostic dumps.

use std::fmt::Write;

/// Render bytes as uppercase, space-separated hex (`01 09 00`).
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02X}");
    }
    out
}
