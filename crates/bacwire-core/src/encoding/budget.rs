use crate::encoding::reader::Reader;
use crate::DecodeError;

/// Bytes left in a sub-message of `total` bytes once `consumed` have been read.
pub const fn remaining(total: u64, consumed: u64) -> u64 {
    total.saturating_sub(consumed)
}

/// Byte budget of the sub-message currently being decoded.
///
/// A parent frame knows how long its child is and hands that length down
/// together with the position where the child starts. The child uses the
/// budget to bound "read until exhausted" loops and to decide whether an
/// optional trailing field was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBudget {
    start_bits: u64,
    total: u64,
}

impl LengthBudget {
    /// Budget of `total` bytes starting at the reader's current position.
    pub fn starting_at(r: &Reader<'_>, total: u64) -> Self {
        Self {
            start_bits: r.position_bits(),
            total,
        }
    }

    /// Budget covering everything left in the reader.
    pub fn rest_of(r: &Reader<'_>) -> Self {
        Self::starting_at(r, r.remaining_bytes())
    }

    pub const fn total(&self) -> u64 {
        self.total
    }

    pub const fn start_bits(&self) -> u64 {
        self.start_bits
    }

    /// Whole bytes consumed since the start of the sub-message.
    pub fn consumed(&self, r: &Reader<'_>) -> u64 {
        r.position_bits().saturating_sub(self.start_bits) / 8
    }

    /// Bytes still owed to the sub-message. Fails if the decoder has already
    /// read past the end.
    pub fn remaining(&self, r: &Reader<'_>) -> Result<u64, DecodeError> {
        let consumed = self.consumed(r);
        if consumed > self.total {
            return Err(DecodeError::InvalidLength {
                field: "length budget",
                length: self.total,
            });
        }
        Ok(remaining(self.total, consumed))
    }

    pub fn is_exhausted(&self, r: &Reader<'_>) -> bool {
        self.consumed(r) >= self.total
    }

    /// True when at least one more byte of the sub-message is unread.
    pub fn has_more(&self, r: &Reader<'_>) -> bool {
        !self.is_exhausted(r)
    }

    /// Presence test for an optional trailing field that is at least one
    /// byte long: `consumed < total - 1`.
    pub fn has_optional_field(&self, r: &Reader<'_>) -> bool {
        self.consumed(r) < self.total.saturating_sub(1)
    }

    /// Budget for a nested sub-message that starts at the reader's position
    /// and runs to the end of this one.
    pub fn child(&self, r: &Reader<'_>) -> Result<LengthBudget, DecodeError> {
        Ok(Self::starting_at(r, self.remaining(r)?))
    }

    /// Budget for a nested sub-message of `len` bytes, which must fit.
    pub fn child_of(&self, r: &Reader<'_>, len: u64) -> Result<LengthBudget, DecodeError> {
        if len > self.remaining(r)? {
            return Err(DecodeError::InvalidLength {
                field: "nested length",
                length: len,
            });
        }
        Ok(Self::starting_at(r, len))
    }
}

#[cfg(test)]
mod tests {
    use super::{remaining, LengthBudget};
    use crate::encoding::reader::Reader;

    #[test]
    fn remaining_is_total_minus_consumed() {
        assert_eq!(remaining(10, 4), 6);
        assert_eq!(remaining(4, 10), 0);
    }

    #[test]
    fn optional_field_threshold_is_length_minus_one() {
        let bytes = [0u8; 8];
        let mut r = Reader::new(&bytes);
        let budget = LengthBudget::starting_at(&r, 5);
        r.read_bits(24).unwrap();
        // 3 consumed of 5: a two-byte trailing field fits.
        assert!(budget.has_optional_field(&r));
        r.read_u8().unwrap();
        // 4 consumed of 5: only a single stray byte remains.
        assert!(!budget.has_optional_field(&r));
        assert!(budget.has_more(&r));
        r.read_u8().unwrap();
        assert!(budget.is_exhausted(&r));
        assert_eq!(budget.remaining(&r).unwrap(), 0);
        r.read_u8().unwrap();
        assert!(budget.remaining(&r).is_err());
    }

    #[test]
    fn child_budget_starts_at_cursor() {
        let bytes = [0u8; 8];
        let mut r = Reader::new(&bytes);
        r.read_u8().unwrap();
        let outer = LengthBudget::starting_at(&r, 6);
        r.read_be_u16().unwrap();
        let inner = outer.child(&r).unwrap();
        assert_eq!(inner.total(), 4);
        assert_eq!(inner.start_bits(), 24);
        assert!(outer.child_of(&r, 5).is_err());
    }

    #[test]
    fn zero_budget_has_no_optional_field() {
        let r = Reader::new(&[]);
        let budget = LengthBudget::starting_at(&r, 0);
        assert!(!budget.has_optional_field(&r));
        assert!(budget.is_exhausted(&r));
    }
}
