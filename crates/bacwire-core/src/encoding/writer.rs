use crate::EncodeError;

/// Bit-addressable writer that owns and grows its output buffer.
///
/// Mirrors [`Reader`](super::reader::Reader): most-significant bit first, no
/// implicit alignment.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
    pos: u64,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buf: Vec::with_capacity(bytes),
            pos: 0,
        }
    }

    pub const fn position_bits(&self) -> u64 {
        self.pos
    }

    pub const fn position_bytes(&self) -> u64 {
        self.pos / 8
    }

    pub const fn is_byte_aligned(&self) -> bool {
        self.pos % 8 == 0
    }

    /// Bytes written so far. A trailing partial byte is zero padded.
    pub fn as_written(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Writes the low `width` bits (1..=64) of `value`.
    pub fn write_bits(&mut self, width: u8, value: u64) -> Result<(), EncodeError> {
        if width == 0 || width > 64 {
            return Err(EncodeError::InvalidBitWidth(width));
        }
        if width < 64 && value >> width != 0 {
            return Err(EncodeError::ValueOutOfRange {
                field: "bits",
                value,
                bits: width,
            });
        }

        let end = self.pos + u64::from(width);
        let needed = end.div_ceil(8) as usize;
        if self.buf.len() < needed {
            self.buf.resize(needed, 0);
        }

        let mut left = u32::from(width);
        while left > 0 {
            let idx = (self.pos / 8) as usize;
            let room = 8 - (self.pos % 8) as u32;
            let take = room.min(left);
            let chunk = ((value >> (left - take)) & ((1u64 << take) - 1)) as u8;
            self.buf[idx] |= chunk << (room - take);
            left -= take;
            self.pos += u64::from(take);
        }
        Ok(())
    }

    pub fn write_bit(&mut self, value: bool) -> Result<(), EncodeError> {
        self.write_bits(1, u64::from(value))
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), EncodeError> {
        self.write_bits(8, u64::from(value))
    }

    pub fn write_i8(&mut self, value: i8) -> Result<(), EncodeError> {
        self.write_u8(value as u8)
    }

    pub fn write_be_u16(&mut self, value: u16) -> Result<(), EncodeError> {
        self.write_bits(16, u64::from(value))
    }

    pub fn write_be_u32(&mut self, value: u32) -> Result<(), EncodeError> {
        self.write_bits(32, u64::from(value))
    }

    pub fn write_be_u64(&mut self, value: u64) -> Result<(), EncodeError> {
        self.write_bits(64, value)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), EncodeError> {
        self.write_be_u32(value.to_bits())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<(), EncodeError> {
        self.write_be_u64(value.to_bits())
    }

    pub fn write_all(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        if self.is_byte_aligned() {
            self.buf.extend_from_slice(data);
            self.pos += data.len() as u64 * 8;
            return Ok(());
        }
        for byte in data {
            self.write_u8(*byte)?;
        }
        Ok(())
    }
}
