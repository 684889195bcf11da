use crate::encoding::{reader::Reader, writer::Writer};
use crate::error::ResultExt;
use crate::{DecodeError, EncodeError};
use core::fmt;

/// Decoder for one variant. Receives the discriminator that selected it and
/// the context handed down by the enclosing frame.
pub type DecodeFn<T, C> = fn(&mut Reader<'_>, u64, C) -> Result<T, DecodeError>;

/// Implemented by every value that is one variant of a discriminated frame.
pub trait Discriminated {
    /// The wire value that selects this variant.
    fn discriminator(&self) -> u64;
}

/// One registered discriminator value or inclusive range.
pub struct DispatchEntry<T, C> {
    pub first: u64,
    pub last: u64,
    pub name: &'static str,
    pub decode: DecodeFn<T, C>,
}

impl<T, C> DispatchEntry<T, C> {
    pub const fn exact(value: u64, name: &'static str, decode: DecodeFn<T, C>) -> Self {
        Self {
            first: value,
            last: value,
            name,
            decode,
        }
    }

    pub const fn range(
        first: u64,
        last: u64,
        name: &'static str,
        decode: DecodeFn<T, C>,
    ) -> Self {
        Self {
            first,
            last,
            name,
            decode,
        }
    }

    pub const fn contains(&self, discriminator: u64) -> bool {
        self.first <= discriminator && discriminator <= self.last
    }
}

/// Immutable mapping from discriminator values to variant decoders.
///
/// Tables are `static` items: built at compile time and shared read-only by
/// every decode call.
pub struct DispatchTable<T: 'static, C: 'static> {
    pub frame: &'static str,
    pub width_bits: u8,
    pub entries: &'static [DispatchEntry<T, C>],
}

impl<T, C> DispatchTable<T, C> {
    pub const fn new(
        frame: &'static str,
        width_bits: u8,
        entries: &'static [DispatchEntry<T, C>],
    ) -> Self {
        Self {
            frame,
            width_bits,
            entries,
        }
    }

    pub fn lookup(&self, discriminator: u64) -> Option<&'static DispatchEntry<T, C>> {
        self.entries.iter().find(|e| e.contains(discriminator))
    }

    pub fn is_registered(&self, discriminator: u64) -> bool {
        self.lookup(discriminator).is_some()
    }

    pub fn read_discriminator(&self, r: &mut Reader<'_>) -> Result<u64, DecodeError> {
        r.read_bits(self.width_bits).field(self.frame)
    }

    /// Runs the decoder registered for `discriminator`.
    pub fn dispatch(
        &self,
        discriminator: u64,
        r: &mut Reader<'_>,
        ctx: C,
    ) -> Result<T, DecodeError> {
        match self.lookup(discriminator) {
            Some(entry) => (entry.decode)(r, discriminator, ctx).field(entry.name),
            None => {
                log::debug!(
                    "no {} decoder for discriminator 0x{discriminator:x}",
                    self.frame
                );
                Err(DecodeError::UnknownVariant {
                    frame: self.frame,
                    discriminator,
                })
            }
        }
    }

    /// Reads the discriminator at the cursor and dispatches on it.
    pub fn decode(&self, r: &mut Reader<'_>, ctx: C) -> Result<T, DecodeError> {
        let discriminator = self.read_discriminator(r)?;
        self.dispatch(discriminator, r, ctx)
    }

    /// Writes a variant's discriminator, refusing values no decoder would
    /// accept back.
    pub fn write_discriminator(
        &self,
        w: &mut Writer,
        discriminator: u64,
    ) -> Result<(), EncodeError> {
        if !self.is_registered(discriminator) {
            return Err(EncodeError::UnknownVariant {
                frame: self.frame,
                discriminator,
            });
        }
        w.write_bits(self.width_bits, discriminator)
    }

    /// Names of the first two entries that claim a common discriminator.
    pub fn find_overlap(&self) -> Option<(&'static str, &'static str)> {
        for (i, a) in self.entries.iter().enumerate() {
            for b in &self.entries[i + 1..] {
                if a.first <= b.last && b.first <= a.last {
                    return Some((a.name, b.name));
                }
            }
        }
        None
    }

    /// Entries whose discriminators cannot be represented in the table width.
    pub fn out_of_width(&self) -> impl Iterator<Item = &'static str> + '_ {
        let max = if self.width_bits >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width_bits) - 1
        };
        self.entries
            .iter()
            .filter(move |e| e.last > max || e.first > e.last)
            .map(|e| e.name)
    }
}

impl<T, C> fmt::Debug for DispatchTable<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("frame", &self.frame)
            .field("width_bits", &self.width_bits)
            .field(
                "entries",
                &self.entries.iter().map(|e| e.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
