// Binary table format: bounds-checked little-endian primitives.

use crate::TrieError;

/// Cursor over serialized table bytes.
///
/// Every read is bounds-checked; running off the end surfaces as
/// [`TrieError::TooShort`] with the offset that was needed.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    /// Byte offset of the next read.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], TrieError> {
        let end = self.pos.checked_add(n).ok_or(TrieError::TooShort {
            expected: usize::MAX,
            actual: self.data.len(),
        })?;
        if end > self.data.len() {
            return Err(TrieError::TooShort {
                expected: end,
                actual: self.data.len(),
            });
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_bool(&mut self) -> Result<bool, TrieError> {
        Ok(self.take(1)?[0] != 0)
    }

    pub fn read_i32(&mut self) -> Result<i32, TrieError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, TrieError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a character stored as a `u32` Unicode scalar.
    pub fn read_char(&mut self) -> Result<char, TrieError> {
        let v = self.read_u32()?;
        char::from_u32(v).ok_or(TrieError::InvalidChar(v))
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_str(&mut self) -> Result<String, TrieError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| TrieError::InvalidUtf8)
    }
}

pub fn write_bool(out: &mut Vec<u8>, v: bool) {
    out.push(if v { 1 } else { 0 });
}

pub fn write_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn write_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn write_char(out: &mut Vec<u8>, ch: char) {
    write_u32(out, ch as u32);
}

pub fn write_str(out: &mut Vec<u8>, s: &str) {
    write_u32(out, s.len() as u32);
    out.extend_from_slice(s.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_primitives() {
        let mut buf = Vec::new();
        write_bool(&mut buf, true);
        write_i32(&mut buf, -7);
        write_char(&mut buf, 'ä');
        write_str(&mut buf, "Db-a");

        let mut r = Reader::new(&buf);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_i32().unwrap(), -7);
        assert_eq!(r.read_char().unwrap(), 'ä');
        assert_eq!(r.read_str().unwrap(), "Db-a");
        assert_eq!(r.position(), buf.len());
    }

    #[test]
    fn truncated_read_reports_offsets() {
        let mut buf = Vec::new();
        write_i32(&mut buf, 42);
        let mut r = Reader::new(&buf[..2]);
        let err = r.read_i32().unwrap_err();
        assert!(matches!(
            err,
            TrieError::TooShort {
                expected: 4,
                actual: 2
            }
        ));
    }

    #[test]
    fn truncated_string_body() {
        let mut buf = Vec::new();
        write_str(&mut buf, "hello");
        buf.truncate(buf.len() - 2);
        let mut r = Reader::new(&buf);
        assert!(matches!(r.read_str(), Err(TrieError::TooShort { .. })));
    }

    #[test]
    fn reject_invalid_scalar() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 0xD800); // surrogate, not a scalar value
        let mut r = Reader::new(&buf);
        assert!(matches!(r.read_char(), Err(TrieError::InvalidChar(0xD800))));
    }
}
