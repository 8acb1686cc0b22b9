/// Wire protocol constants

/// Frame delimiter
pub const END: u8 = 0xC0;

/// Escape byte
pub const ESC: u8 = 0xDB;

/// Substitute code for an escaped `END`
pub const ESC_END: u8 = 0xDC;

/// Substitute code for an escaped `ESC`
pub const ESC_ESC: u8 = 0xDD;

/// Every write on the primary link is padded to a multiple of this
pub const BLOCK_LEN: usize = 64;

/// Length of a remote identity token (SHA-1 digest)
pub const ID_LEN: usize = 20;

/// Number of drive slots on the remote device
pub const DRIVE_COUNT: usize = 4;

/// Default host of the device when it runs its own access point
pub const DEFAULT_HOST: &str = "192.168.4.1";

/// Default primary port; the identity table lives on `port + 1`
pub const DEFAULT_PORT: u16 = 4500;

/// No-operation opcode, used for keep-alive and padding
pub const OP_NOP: u8 = 0x00;
