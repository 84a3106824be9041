//! Host text to guest key codes.

/// Key code delivered for Enter.
pub const KEY_ENTER: u8 = 0x0A;
/// Key code delivered for Backspace.
pub const KEY_BACKSPACE: u8 = 0x7F;

/// Maps one host byte to a guest key code.
///
/// CR and LF become [`KEY_ENTER`], BS and DEL become [`KEY_BACKSPACE`],
/// printable ASCII passes through and everything else is dropped.
#[must_use]
pub const fn key_code(byte: u8) -> Option<u8> {
    match byte {
        b'\r' | b'\n' => Some(KEY_ENTER),
        0x08 | 0x7F => Some(KEY_BACKSPACE),
        0x20..=0x7E => Some(byte),
        _ => None,
    }
}

/// Incremental form of [`key_codes`] for input that arrives in pieces.
///
/// Remembers a trailing CR so a CRLF split across two reads still yields a
/// single Enter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyDecoder {
    after_cr: bool,
}

impl KeyDecoder {
    /// Creates a decoder with no pending CR.
    #[must_use]
    pub const fn new() -> Self {
        Self { after_cr: false }
    }

    /// Translates the next piece of host input.
    #[must_use]
    pub fn feed(&mut self, input: &[u8]) -> Vec<u8> {
        let mut keys = Vec::with_capacity(input.len());
        for &byte in input {
            if !(self.after_cr && byte == b'\n') {
                keys.extend(key_code(byte));
            }
            self.after_cr = byte == b'\r';
        }
        keys
    }
}

/// Translates host input into the key sequence the guest would see.
///
/// A CRLF pair yields a single Enter.
#[must_use]
pub fn key_codes(input: &[u8]) -> Vec<u8> {
    KeyDecoder::new().feed(input)
}
