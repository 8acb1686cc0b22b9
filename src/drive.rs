/// Drive slots of the remote device

use crate::error::{PhloppyError, Result};
use crate::image::FloppyImage;
use crate::protocol::constants::DRIVE_COUNT;
use log::warn;

/// Drive slot number, 0..=3 (DF0: to DF3:)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DriveId(u8);

impl DriveId {
    /// All drive slots in order
    pub const ALL: [DriveId; DRIVE_COUNT] = [DriveId(0), DriveId(1), DriveId(2), DriveId(3)];

    /// Create a drive id, checking the range
    pub fn new(n: u8) -> Result<Self> {
        if (n as usize) < DRIVE_COUNT {
            Ok(DriveId(n))
        } else {
            Err(PhloppyError::InvalidDrive(n))
        }
    }

    /// Slot index for table lookups
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Drive number
    pub fn number(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for DriveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DF{}", self.0)
    }
}

impl std::str::FromStr for DriveId {
    type Err = PhloppyError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let digits = s
            .strip_prefix("DF")
            .or_else(|| s.strip_prefix("df"))
            .unwrap_or(s)
            .trim_end_matches(':');
        let n: u8 = digits.parse().map_err(|_| PhloppyError::InvalidDrive(u8::MAX))?;
        DriveId::new(n)
    }
}

/// One drive slot
#[derive(Debug)]
pub struct Drive {
    /// Mounted image, if any
    pub image: Option<FloppyImage>,
    /// Write protection switch; incoming writes are ignored while set
    pub write_protected: bool,
}

impl Default for Drive {
    fn default() -> Self {
        Self {
            image: None,
            write_protected: true,
        }
    }
}

impl Drive {
    /// Release the mounted image, if any
    pub fn close(&mut self) {
        if let Some(image) = self.image.take() {
            let path = image.path().display().to_string();
            if let Err(e) = image.close() {
                warn!("Failed to close {}: {}", path, e);
            }
        }
    }
}

/// The four drive slots
#[derive(Debug, Default)]
pub struct DriveTable {
    drives: [Drive; DRIVE_COUNT],
}

impl DriveTable {
    /// Create a table with every drive empty and write protected
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a drive
    pub fn get(&self, drive: DriveId) -> &Drive {
        &self.drives[drive.index()]
    }

    /// Get a mutable drive
    pub fn get_mut(&mut self, drive: DriveId) -> &mut Drive {
        &mut self.drives[drive.index()]
    }

    /// Look up a drive by the number received on the wire
    pub fn by_number(&self, n: u8) -> Option<(DriveId, &Drive)> {
        DriveId::new(n).ok().map(|id| (id, self.get(id)))
    }

    /// Close every mounted image
    pub fn close_all(&mut self) {
        for drive in &mut self.drives {
            drive.close();
        }
    }

    /// Iterate over all drives with their ids
    pub fn iter(&self) -> impl Iterator<Item = (DriveId, &Drive)> {
        DriveId::ALL.into_iter().zip(self.drives.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_id_range() {
        assert_eq!(DriveId::new(3).unwrap().index(), 3);
        assert!(matches!(DriveId::new(4), Err(PhloppyError::InvalidDrive(4))));
    }

    #[test]
    fn test_drive_id_parse() {
        assert_eq!("2".parse::<DriveId>().unwrap(), DriveId::ALL[2]);
        assert_eq!("DF1:".parse::<DriveId>().unwrap(), DriveId::ALL[1]);
        assert_eq!("df0".parse::<DriveId>().unwrap(), DriveId::ALL[0]);
        assert!("5".parse::<DriveId>().is_err());
        assert!("x".parse::<DriveId>().is_err());
        assert_eq!(DriveId::ALL[3].to_string(), "DF3");
    }

    #[test]
    fn test_defaults_write_protected() {
        let table = DriveTable::new();
        assert!(table.iter().all(|(_, d)| d.write_protected && d.image.is_none()));
        assert!(table.by_number(4).is_none());
        assert_eq!(table.by_number(1).map(|(id, _)| id), Some(DriveId::ALL[1]));
    }
}
