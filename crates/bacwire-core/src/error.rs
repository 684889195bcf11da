use core::fmt;
use thiserror::Error;

/// Errors raised while serializing a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("value {value} of {field} does not fit in {bits} bits")]
    ValueOutOfRange {
        field: &'static str,
        value: u64,
        bits: u8,
    },
    #[error("invalid length {length} for {field}")]
    InvalidLength { field: &'static str, length: u64 },
    #[error("no {frame} variant registered for discriminator 0x{discriminator:x}")]
    UnknownVariant {
        frame: &'static str,
        discriminator: u64,
    },
    #[error("tag header inconsistent with payload: {0}")]
    TagMismatch(&'static str),
    #[error("{0} requires {1}")]
    MissingField(&'static str, &'static str),
    #[error("invalid bit width {0}")]
    InvalidBitWidth(u8),
}

/// Errors raised while decoding a message.
///
/// Failures deep inside a frame are wrapped in [`DecodeError::InField`] by
/// every enclosing layer, so the error carries the path of fields that led
/// to it. Use [`DecodeError::root`] to get at the underlying cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("buffer underflow: requested {requested} bits, {available} available")]
    BufferUnderflow { requested: u64, available: u64 },
    #[error("constant {field} mismatch: expected 0x{expected:x}, found 0x{actual:x}")]
    ConstantMismatch {
        field: &'static str,
        expected: u64,
        actual: u64,
    },
    #[error("unknown {frame} discriminator 0x{discriminator:x}")]
    UnknownVariant {
        frame: &'static str,
        discriminator: u64,
    },
    #[error("sub-message type mismatch: expected {expected}, decoded {actual}")]
    SubMessageTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("reserved {field} mismatch: expected 0x{expected:x}, found 0x{actual:x}")]
    ReservedFieldMismatch {
        field: &'static str,
        expected: u64,
        actual: u64,
    },
    #[error("invalid length {length} for {field}")]
    InvalidLength { field: &'static str, length: u64 },
    #[error("invalid value {value} for {field}")]
    InvalidValue { field: &'static str, value: u64 },
    #[error("invalid bit width {0}")]
    InvalidBitWidth(u8),
    #[error("{field}/{source}")]
    InField {
        field: &'static str,
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Wraps `self` with the name of the field being decoded.
    pub fn in_field(self, field: &'static str) -> Self {
        Self::InField {
            field,
            source: Box::new(self),
        }
    }

    /// The innermost error, with all field wrappers removed.
    pub fn root(&self) -> &DecodeError {
        let mut err = self;
        while let Self::InField { source, .. } = err {
            err = source;
        }
        err
    }

    /// Field names from the outermost frame to the failing field.
    pub fn path(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        let mut err = self;
        while let Self::InField { field, source } = err {
            out.push(*field);
            err = source;
        }
        out
    }

    pub fn is_underflow(&self) -> bool {
        matches!(self.root(), Self::BufferUnderflow { .. })
    }
}

/// Attaches field names to decode failures as they propagate.
pub trait ResultExt<T> {
    fn field(self, name: &'static str) -> Result<T, DecodeError>;
}

impl<T> ResultExt<T> for Result<T, DecodeError> {
    fn field(self, name: &'static str) -> Result<T, DecodeError> {
        self.map_err(|err| err.in_field(name))
    }
}

/// A non-fatal anomaly observed while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Bit offset of the anomalous field within the decoded buffer.
    pub position_bits: u64,
    pub error: DecodeError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bit {} (byte {}): {}",
            self.position_bits,
            self.position_bits / 8,
            self.error
        )
    }
}

/// A decoded value together with the diagnostics collected while decoding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Decoded<T> {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
