/// SLIP-style byte stuffing
///
/// `END` and `ESC` are the only reserved values. Inside a frame they are
/// sent as `ESC ESC_END` and `ESC ESC_ESC`; every other byte passes through.
/// The same substitute table is used for outbound image data and inbound
/// track data.

use crate::protocol::constants::{END, ESC, ESC_END, ESC_ESC};

/// One decoded input byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// A data byte
    Ordinary(u8),
    /// Unescaped `END`
    FrameDelimiter,
    /// First half of an escape sequence; carries no data
    EscapeBegin,
    /// `ESC` followed by something other than a substitute code
    Error,
}

/// Escape a byte sequence for transmission
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 32);
    encode_into(data, &mut out);
    out
}

/// Escape a byte sequence, appending to `out`
pub fn encode_into(data: &[u8], out: &mut Vec<u8>) {
    for &b in data {
        match b {
            END => out.extend_from_slice(&[ESC, ESC_END]),
            ESC => out.extend_from_slice(&[ESC, ESC_ESC]),
            _ => out.push(b),
        }
    }
}

/// Stateful decoder
///
/// The pending-escape flag survives between calls, so an escape sequence
/// split across two socket reads decodes correctly. Keep one decoder per
/// link for its whole lifetime.
#[derive(Debug, Default, Clone)]
pub struct Decoder {
    escaping: bool,
}

impl Decoder {
    /// Create a decoder with no escape pending
    pub fn new() -> Self {
        Self::default()
    }

    /// Is an escape sequence half-way through?
    pub fn is_escaping(&self) -> bool {
        self.escaping
    }

    /// Decode a single input byte
    pub fn decode(&mut self, byte: u8) -> Symbol {
        if self.escaping {
            self.escaping = false;
            match byte {
                ESC_END => Symbol::Ordinary(END),
                ESC_ESC => Symbol::Ordinary(ESC),
                _ => Symbol::Error,
            }
        } else {
            match byte {
                END => Symbol::FrameDelimiter,
                ESC => {
                    self.escaping = true;
                    Symbol::EscapeBegin
                }
                _ => Symbol::Ordinary(byte),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode_all(decoder: &mut Decoder, input: &[u8], out: &mut Vec<u8>) {
        for &b in input {
            if let Symbol::Ordinary(v) = decoder.decode(b) {
                out.push(v);
            }
        }
    }

    #[test]
    fn test_encode_reserved_bytes() {
        assert_eq!(encode(&[0x01, END, 0x02]), vec![0x01, ESC, ESC_END, 0x02]);
        assert_eq!(encode(&[ESC]), vec![ESC, ESC_ESC]);
        assert_eq!(encode(&[ESC_END, ESC_ESC]), vec![ESC_END, ESC_ESC]);
        assert!(encode(&[]).is_empty());
    }

    #[test]
    fn test_decode_symbols() {
        let mut decoder = Decoder::new();
        assert_eq!(decoder.decode(END), Symbol::FrameDelimiter);
        assert_eq!(decoder.decode(0x41), Symbol::Ordinary(0x41));
        assert_eq!(decoder.decode(ESC), Symbol::EscapeBegin);
        assert!(decoder.is_escaping());
        assert_eq!(decoder.decode(ESC_ESC), Symbol::Ordinary(ESC));
        assert!(!decoder.is_escaping());
        assert_eq!(decoder.decode(ESC), Symbol::EscapeBegin);
        assert_eq!(decoder.decode(ESC_END), Symbol::Ordinary(END));
    }

    #[test]
    fn test_bad_escape_is_error() {
        let mut decoder = Decoder::new();
        decoder.decode(ESC);
        assert_eq!(decoder.decode(0x00), Symbol::Error);
        // The flag is consumed by the bad sequence
        assert_eq!(decoder.decode(0x00), Symbol::Ordinary(0x00));

        decoder.decode(ESC);
        assert_eq!(decoder.decode(END), Symbol::Error);
    }

    #[test]
    fn test_escape_straddles_reads() {
        let encoded = encode(&[END, ESC]);
        let mut decoder = Decoder::new();
        let mut out = Vec::new();
        decode_all(&mut decoder, &encoded[..1], &mut out);
        assert!(decoder.is_escaping());
        decode_all(&mut decoder, &encoded[1..3], &mut out);
        decode_all(&mut decoder, &encoded[3..], &mut out);
        assert_eq!(out, vec![END, ESC]);
    }

    proptest! {
        #[test]
        fn prop_round_trip(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let encoded = encode(&data);
            prop_assert!(!encoded.contains(&END));
            let mut decoder = Decoder::new();
            let mut out = Vec::new();
            decode_all(&mut decoder, &encoded, &mut out);
            prop_assert_eq!(out, data);
        }

        #[test]
        fn prop_round_trip_chunked(
            data in proptest::collection::vec(prop_oneof![Just(END), Just(ESC), any::<u8>()], 0..512),
            chunk in 1usize..17,
        ) {
            let encoded = encode(&data);
            let mut decoder = Decoder::new();
            let mut out = Vec::new();
            for piece in encoded.chunks(chunk) {
                decode_all(&mut decoder, piece, &mut out);
            }
            prop_assert!(!decoder.is_escaping());
            prop_assert_eq!(out, data);
        }
    }
}
