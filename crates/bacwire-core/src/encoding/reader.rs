use crate::error::{Diagnostic, ResultExt};
use crate::DecodeError;

/// Settings for a single decode call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Turn reserved-field mismatches into hard errors instead of diagnostics.
    pub strict_reserved_fields: bool,
}

impl DecodeOptions {
    pub const fn strict() -> Self {
        Self {
            strict_reserved_fields: true,
        }
    }
}

/// Bit-addressable reader over a borrowed byte buffer.
///
/// Bits are consumed most-significant first. Fields may start and end in the
/// middle of a byte. The cursor only advances when a read succeeds.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: u64,
    options: DecodeOptions,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_options(buf, DecodeOptions::default())
    }

    pub fn with_options(buf: &'a [u8], options: DecodeOptions) -> Self {
        Self {
            buf,
            pos: 0,
            options,
            diagnostics: Vec::new(),
        }
    }

    pub const fn options(&self) -> DecodeOptions {
        self.options
    }

    pub fn capacity_bits(&self) -> u64 {
        self.buf.len() as u64 * 8
    }

    pub const fn position_bits(&self) -> u64 {
        self.pos
    }

    /// Cursor position in whole bytes, truncating.
    pub const fn position_bytes(&self) -> u64 {
        self.pos / 8
    }

    pub fn remaining_bits(&self) -> u64 {
        self.capacity_bits().saturating_sub(self.pos)
    }

    pub fn remaining_bytes(&self) -> u64 {
        self.remaining_bits() / 8
    }

    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0
    }

    pub const fn is_byte_aligned(&self) -> bool {
        self.pos % 8 == 0
    }

    /// Moves the cursor to an absolute bit position. Only used for look-ahead.
    pub fn seek_bits(&mut self, position: u64) -> Result<(), DecodeError> {
        if position > self.capacity_bits() {
            return Err(DecodeError::BufferUnderflow {
                requested: position - self.pos,
                available: self.remaining_bits(),
            });
        }
        self.pos = position;
        Ok(())
    }

    fn ensure(&self, bits: u64) -> Result<(), DecodeError> {
        let available = self.remaining_bits();
        if bits > available {
            return Err(DecodeError::BufferUnderflow {
                requested: bits,
                available,
            });
        }
        Ok(())
    }

    fn bits_at(&self, mut pos: u64, width: u8) -> u64 {
        let mut value = 0u64;
        let mut left = u32::from(width);
        while left > 0 {
            let byte = self.buf[(pos / 8) as usize];
            let offset = (pos % 8) as u32;
            let room = 8 - offset;
            let take = room.min(left);
            let bits = (byte >> (room - take)) & ((1u16 << take) - 1) as u8;
            value = (value << take) | u64::from(bits);
            left -= take;
            pos += u64::from(take);
        }
        value
    }

    /// Reads `width` bits (1..=64) without advancing the cursor.
    pub fn peek_bits(&self, width: u8) -> Result<u64, DecodeError> {
        if width == 0 || width > 64 {
            return Err(DecodeError::InvalidBitWidth(width));
        }
        self.ensure(u64::from(width))?;
        Ok(self.bits_at(self.pos, width))
    }

    pub fn read_bits(&mut self, width: u8) -> Result<u64, DecodeError> {
        let value = self.peek_bits(width)?;
        self.pos += u64::from(width);
        Ok(value)
    }

    pub fn read_bit(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_bits(1)? == 1)
    }

    pub fn peek_u8(&self) -> Result<u8, DecodeError> {
        Ok(self.peek_bits(8)? as u8)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bits(8)? as u8)
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_be_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(self.read_bits(16)? as u16)
    }

    pub fn read_be_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(self.read_bits(32)? as u32)
    }

    pub fn read_be_u64(&mut self) -> Result<u64, DecodeError> {
        self.read_bits(64)
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_bits(self.read_be_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_bits(self.read_be_u64()?))
    }

    /// Reads `len` whole bytes starting at the current bit position.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, DecodeError> {
        self.ensure(len as u64 * 8)?;
        if self.is_byte_aligned() {
            let start = (self.pos / 8) as usize;
            self.pos += len as u64 * 8;
            return Ok(self.buf[start..start + len].to_vec());
        }
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.read_u8()?);
        }
        Ok(out)
    }

    /// Reads a fixed field and fails unless it equals `expected`.
    pub fn read_const(
        &mut self,
        field: &'static str,
        width: u8,
        expected: u64,
    ) -> Result<u64, DecodeError> {
        let actual = self.read_bits(width).field(field)?;
        if actual != expected {
            return Err(DecodeError::ConstantMismatch {
                field,
                expected,
                actual,
            });
        }
        Ok(actual)
    }

    /// Reads a reserved field. A mismatch is recorded as a diagnostic and
    /// decoding continues, unless the reader is in strict mode.
    pub fn check_reserved(
        &mut self,
        field: &'static str,
        width: u8,
        expected: u64,
    ) -> Result<(), DecodeError> {
        let position_bits = self.pos;
        let actual = self.read_bits(width).field(field)?;
        if actual != expected {
            let error = DecodeError::ReservedFieldMismatch {
                field,
                expected,
                actual,
            };
            if self.options.strict_reserved_fields {
                return Err(error);
            }
            log::warn!("reserved field mismatch at bit {position_bits}: {error}");
            self.diagnostics.push(Diagnostic {
                position_bits,
                error,
            });
        }
        Ok(())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
