/// Padded frame writer
///
/// The device moves data in 64-byte SPI transactions, so every write on the
/// primary link is topped up with a NOP frame to the next block boundary. A
/// NOP frame is at least two bytes (`END`, `OP_NOP`), so a gap of a single
/// byte is filled with 65 bytes instead.

use std::io::{self, Write};

use crate::drive::DriveId;
use crate::protocol::constants::{BLOCK_LEN, END, OP_NOP};
use crate::protocol::opcode::Opcode;

const MAX_PADDING: usize = BLOCK_LEN + 1;

/// Number of filler bytes that follow a write of `total` bytes
pub fn padding_len(total: usize) -> usize {
    match BLOCK_LEN - total % BLOCK_LEN {
        1 => MAX_PADDING,
        n => n,
    }
}

/// Writes frames to the primary link, padding each send
pub struct FrameWriter<W: Write> {
    inner: W,
    padding: [u8; MAX_PADDING],
}

impl<W: Write> FrameWriter<W> {
    /// Wrap a writer
    pub fn new(inner: W) -> Self {
        let mut padding = [0u8; MAX_PADDING];
        padding[0] = END;
        padding[1] = OP_NOP;
        Self { inner, padding }
    }

    /// Get a reference to the wrapped writer
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Send the parts back to back followed by padding, then flush
    pub fn send(&mut self, parts: &[&[u8]]) -> io::Result<()> {
        let mut total = 0;
        for part in parts {
            self.inner.write_all(part)?;
            total += part.len();
        }
        let pad = padding_len(total);
        self.inner.write_all(&self.padding[..pad])?;
        self.inner.flush()
    }

    /// Send a single per-drive command
    pub fn send_command(&mut self, opcode: Opcode, drive: DriveId) -> io::Result<()> {
        self.send(&[&[END, opcode.code(drive)]])
    }

    /// Send a keep-alive NOP frame followed by `filler` zero bytes
    pub fn send_nop(&mut self, filler: usize) -> io::Result<()> {
        if filler == 0 {
            self.send(&[&[END, OP_NOP]])
        } else {
            let zeros = vec![0u8; filler];
            self.send(&[&[END, OP_NOP], &zeros])
        }
    }
}
