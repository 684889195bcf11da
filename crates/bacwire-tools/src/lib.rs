use bacwire_core::{Apdu, DecodeError, DecodeOptions, Decoded, Diagnostic, Npdu};
use bacwire_datalink::Bvlc;
use clap::ValueEnum;
use thiserror::Error;

/// Protocol layer a hex frame starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layer {
    Bvlc,
    Npdu,
    Apdu,
}

/// Output rendering for decoded frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Rust pretty debug output.
    Debug,
    Json,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HexError {
    #[error("line {line}: odd number of hex digits")]
    OddLength { line: usize },
    #[error("line {line}: invalid hex digit {digit:?}")]
    InvalidDigit { line: usize, digit: char },
}

/// A frame decoded at one of the three layers.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Bvlc(Bvlc),
    Npdu(Npdu),
    Apdu(Apdu),
}

impl Frame {
    pub fn decode(
        layer: Layer,
        bytes: &[u8],
        options: DecodeOptions,
    ) -> Result<(Self, Vec<Diagnostic>), DecodeError> {
        fn split<T>(d: Decoded<T>, wrap: fn(T) -> Frame) -> (Frame, Vec<Diagnostic>) {
            (wrap(d.value), d.diagnostics)
        }
        Ok(match layer {
            Layer::Bvlc => split(Bvlc::decode_with_diagnostics(bytes, options)?, Frame::Bvlc),
            Layer::Npdu => split(Npdu::decode_with_diagnostics(bytes, options)?, Frame::Npdu),
            Layer::Apdu => split(Apdu::decode_with_diagnostics(bytes, options)?, Frame::Apdu),
        })
    }

    pub fn render(&self, format: Format) -> Result<String, serde_json::Error> {
        match format {
            Format::Debug => Ok(format!("{self:#?}")),
            Format::Json => match self {
                Self::Bvlc(v) => serde_json::to_string_pretty(v),
                Self::Npdu(v) => serde_json::to_string_pretty(v),
                Self::Apdu(v) => serde_json::to_string_pretty(v),
            },
        }
    }
}

/// Parses one frame of hex digits. Whitespace, `:` and `-` separators and a
/// leading `0x` are ignored.
pub fn parse_hex(line_no: usize, text: &str) -> Result<Vec<u8>, HexError> {
    let text = text.trim();
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    let mut nibbles = Vec::with_capacity(text.len());
    for c in text.chars() {
        if c.is_whitespace() || c == ':' || c == '-' {
            continue;
        }
        let digit = c.to_digit(16).ok_or(HexError::InvalidDigit {
            line: line_no,
            digit: c,
        })?;
        nibbles.push(digit as u8);
    }
    if nibbles.len() % 2 != 0 {
        return Err(HexError::OddLength { line: line_no });
    }
    Ok(nibbles.chunks(2).map(|p| (p[0] << 4) | p[1]).collect())
}

/// Splits text into frames: one per line, `#` starts a comment, blank lines
/// are skipped. Line numbers start at 1.
pub fn parse_frames(text: &str) -> Result<Vec<(usize, Vec<u8>)>, HexError> {
    let mut frames = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default();
        if line.trim().is_empty() {
            continue;
        }
        frames.push((i + 1, parse_hex(i + 1, line)?));
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::{parse_frames, parse_hex, Format, Frame, HexError, Layer};
    use bacwire_core::DecodeOptions;

    #[test]
    fn hex_separators_and_prefix() {
        assert_eq!(parse_hex(1, "0x81 0a:00-08").unwrap(), vec![0x81, 0x0A, 0x00, 0x08]);
        assert_eq!(parse_hex(3, "8"), Err(HexError::OddLength { line: 3 }));
        assert_eq!(
            parse_hex(2, "8g"),
            Err(HexError::InvalidDigit { line: 2, digit: 'g' })
        );
    }

    #[test]
    fn frames_skip_comments_and_blanks() {
        let text = "# captured frames\n810a0008 01001008  # who-is\n\n10 08\n";
        let frames = parse_frames(text).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], (2, vec![0x81, 0x0A, 0x00, 0x08, 0x01, 0x00, 0x10, 0x08]));
        assert_eq!(frames[1], (4, vec![0x10, 0x08]));
    }

    #[test]
    fn decode_at_each_layer() {
        let bvlc = [0x81, 0x0A, 0x00, 0x08, 0x01, 0x00, 0x10, 0x08];
        let (frame, diagnostics) =
            Frame::decode(Layer::Bvlc, &bvlc, DecodeOptions::default()).unwrap();
        assert!(matches!(frame, Frame::Bvlc(_)));
        assert!(diagnostics.is_empty());

        let (frame, _) = Frame::decode(Layer::Npdu, &bvlc[4..], DecodeOptions::default()).unwrap();
        assert!(matches!(frame, Frame::Npdu(_)));

        let (frame, _) = Frame::decode(Layer::Apdu, &bvlc[6..], DecodeOptions::default()).unwrap();
        let json = frame.render(Format::Json).unwrap();
        assert!(json.contains("UnconfirmedRequest"));
        assert!(frame.render(Format::Debug).unwrap().contains("WhoIs"));
    }
}
