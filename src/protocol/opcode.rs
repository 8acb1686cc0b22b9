/// Per-drive command opcodes
///
/// Each command family has one opcode per drive slot. The codes are not a
/// simple base + drive offset (drives 2 and 3 were added later in a second
/// range), so they are kept as a table indexed by family and drive.

use crate::drive::DriveId;
use crate::image::Geometry;
use crate::protocol::constants::DRIVE_COUNT;

/// Command family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Disk inserted; the drive becomes ready
    Insert,
    /// Disk removed
    Eject,
    /// Image data follows
    Fill,
    /// Write protection switched on
    WriteProtect,
    /// Write protection switched off
    WriteUnprotect,
    /// Image uses the ADF (sector) geometry
    TypeAdf,
    /// Image uses the raw MFM geometry
    TypeRaw,
}

const OPCODES: [[u8; DRIVE_COUNT]; 7] = [
    [0x01, 0x02, 0x11, 0x12], // Insert
    [0x03, 0x04, 0x13, 0x14], // Eject
    [0x05, 0x06, 0x15, 0x16], // Fill
    [0x07, 0x08, 0x17, 0x18], // WriteProtect
    [0x09, 0x0A, 0x19, 0x1A], // WriteUnprotect
    [0x1B, 0x1C, 0x1D, 0x1E], // TypeAdf
    [0x1F, 0x20, 0x21, 0x22], // TypeRaw
];

impl Opcode {
    /// Wire byte for this command on the given drive
    pub fn code(self, drive: DriveId) -> u8 {
        OPCODES[self as usize][drive.index()]
    }

    /// Type selection opcode for an image geometry
    pub fn set_type(geometry: Geometry) -> Self {
        match geometry {
            Geometry::Adf => Opcode::TypeAdf,
            Geometry::Raw => Opcode::TypeRaw,
        }
    }

    /// Protect or unprotect opcode for a switch position
    pub fn write_protect(protected: bool) -> Self {
        if protected {
            Opcode::WriteProtect
        } else {
            Opcode::WriteUnprotect
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(n: u8) -> DriveId {
        DriveId::new(n).unwrap()
    }

    #[test]
    fn test_first_pair_of_drives() {
        assert_eq!(Opcode::Insert.code(drive(0)), 0x01);
        assert_eq!(Opcode::Insert.code(drive(1)), 0x02);
        assert_eq!(Opcode::Eject.code(drive(1)), 0x04);
        assert_eq!(Opcode::WriteUnprotect.code(drive(1)), 0x0A);
    }

    #[test]
    fn test_second_pair_of_drives() {
        assert_eq!(Opcode::Insert.code(drive(2)), 0x11);
        assert_eq!(Opcode::Eject.code(drive(3)), 0x14);
        assert_eq!(Opcode::Fill.code(drive(2)), 0x15);
        assert_eq!(Opcode::WriteProtect.code(drive(3)), 0x18);
    }

    #[test]
    fn test_type_opcodes() {
        assert_eq!(Opcode::set_type(Geometry::Adf).code(drive(0)), 0x1B);
        assert_eq!(Opcode::set_type(Geometry::Raw).code(drive(3)), 0x22);
    }

    #[test]
    fn test_opcodes_are_unique() {
        let mut seen: Vec<u8> = OPCODES.iter().flatten().copied().collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 7 * DRIVE_COUNT);
        assert!(!seen.contains(&crate::protocol::constants::OP_NOP));
    }
}
