//! Little-endian `u32` framing shared by every persisted artifact.
//!
//! All integers on disk are 32-bit little-endian. Strings are written as a
//! `u32` byte length followed by raw UTF-8 with no terminator. Readers never
//! trust a count blindly: every count is checked against the bytes that are
//! actually left, so a truncated artifact fails instead of allocating.

use std::io::{self, Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Result, SearchError};

const U32_SIZE: usize = 4;

pub struct FrameWriter<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        FrameWriter { writer, written: 0 }
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_u32::<LittleEndian>(value)?;
        self.written += U32_SIZE as u64;
        Ok(())
    }

    /// Writes a collection length, refusing anything that does not fit the format.
    pub fn write_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| {
            SearchError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("length {len} does not fit a u32 frame"),
            ))
        })?;
        self.write_u32(len)
    }

    pub fn write_str(&mut self, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        self.write_len(bytes.len())?;
        self.writer.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

pub struct FrameReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> FrameReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        FrameReader { cursor: Cursor::new(bytes) }
    }

    pub fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len();
        len.saturating_sub(self.cursor.position() as usize)
    }

    pub fn read_u32(&mut self, what: &str) -> Result<u32> {
        let offset = self.cursor.position();
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| SearchError::decode(format!("truncated {what} at offset {offset}")))
    }

    /// Reads a count of records, each at least `min_record_size` bytes long.
    pub fn read_count(&mut self, what: &str, min_record_size: usize) -> Result<usize> {
        let count = self.read_u32(what)? as usize;
        let needed = count.saturating_mul(min_record_size);
        if needed > self.remaining() {
            return Err(SearchError::decode(format!(
                "{what} of {count} needs at least {needed} bytes, {} left",
                self.remaining()
            )));
        }
        Ok(count)
    }

    pub fn read_str(&mut self, what: &str) -> Result<String> {
        let len = self.read_u32(what)? as usize;
        if len > self.remaining() {
            return Err(SearchError::decode(format!(
                "{what} length {len} exceeds the {} bytes left",
                self.remaining()
            )));
        }
        let mut buf = vec![0u8; len];
        self.cursor.read_exact(&mut buf)?;
        String::from_utf8(buf).map_err(|e| SearchError::decode(format!("{what} is not UTF-8: {e}")))
    }

    /// Fails when bytes are left over after the last record.
    pub fn finish(self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(SearchError::decode(format!("{n} trailing bytes after last record"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_is_little_endian() {
        let mut w = FrameWriter::new(Vec::new());
        w.write_u32(0x0403_0201).unwrap();
        assert_eq!(w.into_inner().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn short_input_is_a_decode_error() {
        let mut r = FrameReader::new(&[1, 0, 0]);
        assert!(matches!(r.read_u32("count"), Err(SearchError::Decode(_))));
    }

    #[test]
    fn string_prefix_longer_than_input_is_rejected() {
        let bytes = [10u8, 0, 0, 0, b'a', b'b'];
        let mut r = FrameReader::new(&bytes);
        assert!(matches!(r.read_str("key"), Err(SearchError::Decode(_))));
    }

    #[test]
    fn count_is_checked_against_remaining_bytes() {
        let bytes = [200u8, 0, 0, 0, 0, 0, 0, 0];
        let mut r = FrameReader::new(&bytes);
        assert!(r.read_count("entries", 8).is_err());
    }

    #[test]
    fn trailing_bytes_fail_finish() {
        let r = FrameReader::new(&[0u8]);
        assert!(r.finish().is_err());
    }
}
