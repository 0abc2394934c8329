//! Display helpers for decoded packets
//!
//! Formatting shared by the packet table, the stats line and the hex pane.

use std::time::SystemTime;

use chrono::{DateTime, Local};

/// Bytes shown per hex dump line
pub const HEX_BYTES_PER_LINE: usize = 16;

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a wall-clock time as local `HH:MM:SS.mmm`
pub fn format_timestamp(time: SystemTime) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%H:%M:%S%.3f").to_string()
}

/// Format a byte count as `1.5 KB (1536)`
pub fn human_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {} ({})", value, BYTE_UNITS[unit], bytes)
}

/// Format one hex dump line: offset, up to 16 hex bytes, printable ASCII
///
/// Short chunks are padded so the ASCII column stays aligned.
pub fn hex_line(chunk: &[u8], offset: usize) -> String {
    let mut line = format!("{:04x}  ", offset);

    for i in 0..HEX_BYTES_PER_LINE {
        match chunk.get(i) {
            Some(b) => line.push_str(&format!("{:02x} ", b)),
            None => line.push_str("   "),
        }
    }

    line.push(' ');
    line.extend(chunk.iter().take(HEX_BYTES_PER_LINE).map(|&b| {
        if b.is_ascii_graphic() || b == b' ' {
            b as char
        } else {
            '.'
        }
    }));
    line
}

/// Iterate the hex dump lines of a payload
pub fn hex_dump(payload: &[u8]) -> impl Iterator<Item = String> + '_ {
    payload
        .chunks(HEX_BYTES_PER_LINE)
        .enumerate()
        .map(|(i, chunk)| hex_line(chunk, i * HEX_BYTES_PER_LINE))
}
