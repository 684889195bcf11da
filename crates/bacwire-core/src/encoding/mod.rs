/// Byte budgets threaded from enclosing frames into their children.
pub mod budget;
/// Static discriminator-to-decoder tables shared by every layered frame.
pub mod dispatch;
/// Integer helpers and fixed-header field shapes used by service layouts.
pub mod primitives;
/// Bit-addressable reader over a borrowed buffer.
pub mod reader;
/// BACnet tag (type-length-value) codec.
pub mod tag;
/// Bit-addressable writer over a growable buffer.
pub mod writer;

use crate::error::Decoded;
use crate::DecodeError;
use budget::LengthBudget;
use reader::{DecodeOptions, Reader};

/// Decodes a whole buffer with `decode`, handing it a budget that spans the
/// buffer, and returns the value together with any diagnostics.
pub fn decode_buffer<T>(
    buf: &[u8],
    options: DecodeOptions,
    decode: impl FnOnce(&mut Reader<'_>, LengthBudget) -> Result<T, DecodeError>,
) -> Result<Decoded<T>, DecodeError> {
    let mut r = Reader::with_options(buf, options);
    let budget = LengthBudget::rest_of(&r);
    let value = decode(&mut r, budget)?;
    Ok(Decoded {
        value,
        diagnostics: r.take_diagnostics(),
    })
}
