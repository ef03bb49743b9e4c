//! Marker search over a byte stream.

use std::io::{self, ErrorKind, Read};

/// Read one byte, `None` at end of stream.
pub(crate) fn read_byte<R: Read>(reader: &mut R) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Advance `reader` until the last four bytes read equal `marker` (as a
/// little-endian `u32`).
///
/// Shifts each byte into a 32-bit rolling window from the top. Returns the
/// number of bytes discarded before the marker, or `None` if the stream ended
/// first. The stream is left positioned directly after the marker.
pub fn sync_to<R: Read>(reader: &mut R, marker: u32) -> io::Result<Option<u64>> {
    let mut window: u32 = 0;
    let mut consumed: u64 = 0;
    while window != marker || consumed < 4 {
        match read_byte(reader)? {
            Some(c) => {
                window = (window >> 8) | (u32::from(c) << 24);
                consumed += 1;
            }
            None => return Ok(None),
        }
    }
    Ok(Some(consumed - 4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binnf::{END_MARKER, START_MARKER};

    #[test]
    fn test_marker_at_start() {
        let bytes = [0xDA, 0x8C, 0x5A, 0x66, 0x01];
        let mut cursor = &bytes[..];
        assert_eq!(sync_to(&mut cursor, START_MARKER).unwrap(), Some(0));
        assert_eq!(cursor, &[0x01]);
    }

    #[test]
    fn test_marker_after_garbage() {
        let bytes = [0x00, 0xDA, 0xDA, 0x8C, 0x5A, 0x66];
        let mut cursor = &bytes[..];
        assert_eq!(sync_to(&mut cursor, START_MARKER).unwrap(), Some(2));
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_not_found() {
        let bytes = [0xDA, 0x8C, 0x5A];
        let mut cursor = &bytes[..];
        assert_eq!(sync_to(&mut cursor, START_MARKER).unwrap(), None);

        let mut empty: &[u8] = &[];
        assert_eq!(sync_to(&mut empty, END_MARKER).unwrap(), None);
    }

    #[test]
    fn test_zero_marker_needs_four_bytes() {
        let bytes = [0x00, 0x00, 0x00, 0x00];
        let mut cursor = &bytes[..];
        assert_eq!(sync_to(&mut cursor, 0).unwrap(), Some(0));
    }
}
