//! Little-endian field codec.
//!
//! Every multi-byte value is written explicitly as LE bytes; floats go out
//! as their IEEE-754 bit pattern, so a decode is bit-identical to the encode.

use glam::Vec3;

use crate::core::CodecError;

/// Append-only encoder for payload fields.
#[derive(Debug, Default, Clone)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a boolean as one byte (0 or 1).
    pub fn put_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// Write a u16 (LE).
    pub fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write an i32 (LE).
    pub fn put_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write an f32 (LE bit pattern).
    pub fn put_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a 3-vector as x, y, z.
    pub fn put_vec3(&mut self, value: Vec3) {
        self.put_f32(value.x);
        self.put_f32(value.y);
        self.put_f32(value.z);
    }

    /// Consume the writer and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor-based decoder over a payload slice.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        if self.remaining() < N {
            return Err(CodecError::TooShort {
                expected: self.pos + N,
                actual: self.data.len(),
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    /// Read a single byte.
    pub fn get_u8(&mut self) -> Result<u8, CodecError> {
        let [b] = self.take::<1>()?;
        Ok(b)
    }

    /// Read a boolean byte; any non-zero value is `true`.
    pub fn get_bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.get_u8()? != 0)
    }

    /// Read a u16 (LE).
    pub fn get_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    /// Read an i32 (LE).
    pub fn get_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    /// Read an f32 (LE bit pattern).
    pub fn get_f32(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    /// Read a 3-vector.
    pub fn get_vec3(&mut self) -> Result<Vec3, CodecError> {
        let x = self.get_f32()?;
        let y = self.get_f32()?;
        let z = self.get_f32()?;
        Ok(Vec3::new(x, y, z))
    }

    /// Fail if any bytes remain unread.
    pub fn finish(self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_layout() {
        let mut w = WireWriter::new();
        w.put_i32(1);
        w.put_u16(0x0203);
        assert_eq!(w.into_bytes(), vec![1, 0, 0, 0, 0x03, 0x02]);
    }

    #[test]
    fn test_reader_too_short() {
        let mut r = WireReader::new(&[1, 2, 3]);
        assert!(matches!(
            r.get_i32(),
            Err(CodecError::TooShort {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_nonzero_bool_is_true() {
        let mut r = WireReader::new(&[0, 1, 7]);
        assert!(!r.get_bool().unwrap());
        assert!(r.get_bool().unwrap());
        assert!(r.get_bool().unwrap());
        r.finish().unwrap();
    }

    #[test]
    fn test_finish_reports_trailing() {
        let mut r = WireReader::new(&[0, 0, 0, 0, 9, 9]);
        r.get_i32().unwrap();
        assert_eq!(r.finish(), Err(CodecError::TrailingBytes(2)));
    }

    #[test]
    fn test_float_bits_preserved() {
        let odd = f32::from_bits(0x7fc0_1234);
        let mut w = WireWriter::new();
        w.put_vec3(Vec3::new(-0.0, odd, f32::MIN_POSITIVE));
        let bytes = w.into_bytes();

        let v = WireReader::new(&bytes).get_vec3().unwrap();
        assert_eq!(v.x.to_bits(), (-0.0f32).to_bits());
        assert_eq!(v.y.to_bits(), 0x7fc0_1234);
        assert_eq!(v.z, f32::MIN_POSITIVE);
    }
}
