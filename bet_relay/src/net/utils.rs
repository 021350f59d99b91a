use log::debug;
use std::io::{self, Read, Write};

/// Write an encoded frame, resuming after partial writes until every
/// byte is out.
///
/// A short write is progress, not an error. Only a write that makes no
/// progress or a failing stream aborts.
pub fn write_frame<W: Write>(writer: &mut W, frame: &[u8]) -> io::Result<()> {
    let mut sent = 0;
    while sent < frame.len() {
        match writer.write(&frame[sent..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("stream accepted no bytes after {sent} of {}", frame.len()),
                ));
            }
            Ok(n) => {
                sent += n;
                if sent < frame.len() {
                    debug!("partial write: {sent}/{} bytes", frame.len());
                }
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
    writer.flush()
}

/// Read exactly `N` bytes, looping over partial reads.
///
/// A stream that ends before the buffer is full yields `UnexpectedEof`,
/// never a partially filled buffer.
pub fn read_array<const N: usize, R: Read>(reader: &mut R) -> io::Result<[u8; N]> {
    let mut buf = [0; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
