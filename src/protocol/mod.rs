/// Wire protocol of the drive emulator: framing, opcodes and padding

/// Reserved bytes and wire sizes
pub mod constants;
/// Padded frame writer for the primary link
pub mod frame;
/// Drive-indexed opcode table
pub mod opcode;
/// SLIP-style escaping shared by both directions
pub mod slip;

pub use frame::{padding_len, FrameWriter};
pub use opcode::Opcode;
pub use slip::{Decoder, Symbol};
