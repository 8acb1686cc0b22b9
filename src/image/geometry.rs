/// Disk geometry and track addressing

use crate::error::{PhloppyError, Result};

/// Cylinders on a double-density 3.5" disk
pub const CYLINDERS: usize = 80;

/// Heads (sides)
pub const HEADS: usize = 2;

/// Tracks per disk (cylinders x heads)
pub const TRACKS_PER_DISK: usize = CYLINDERS * HEADS;

/// AmigaDOS sector size
pub const SECTOR_SIZE: usize = 512;

/// AmigaDOS sectors per track
pub const SECTORS_PER_TRACK: usize = 11;

/// Bytes per track in an ADF image
pub const ADF_BYTES_PER_TRACK: usize = SECTOR_SIZE * SECTORS_PER_TRACK;

/// Bytes per track in a raw MFM image
pub const RAW_BYTES_PER_TRACK: usize = 12668;

/// Image layout, identified by file length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// Decoded sectors, 11 x 512 bytes per track (901,120 bytes)
    Adf,
    /// Raw MFM track data, 12,668 bytes per track (2,026,880 bytes)
    Raw,
}

impl Geometry {
    /// Bytes in one track
    pub const fn bytes_per_track(self) -> usize {
        match self {
            Geometry::Adf => ADF_BYTES_PER_TRACK,
            Geometry::Raw => RAW_BYTES_PER_TRACK,
        }
    }

    /// Total image length in bytes
    pub const fn image_len(self) -> u64 {
        (self.bytes_per_track() * TRACKS_PER_DISK) as u64
    }

    /// Identify the geometry of an image from its length
    pub fn from_len(len: u64) -> Option<Self> {
        [Geometry::Adf, Geometry::Raw]
            .into_iter()
            .find(|g| g.image_len() == len)
    }

    /// Short display name
    pub fn name(self) -> &'static str {
        match self {
            Geometry::Adf => "ADF",
            Geometry::Raw => "RAW",
        }
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Linear track number, `cylinder * 2 + head`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackIndex(u8);

impl TrackIndex {
    /// Create a track index, checking it is on the disk
    pub fn new(index: u8) -> Result<Self> {
        if (index as usize) < TRACKS_PER_DISK {
            Ok(TrackIndex(index))
        } else {
            Err(PhloppyError::InvalidTrack {
                track: index,
                max: (TRACKS_PER_DISK - 1) as u8,
            })
        }
    }

    /// Create a track index from cylinder and head
    pub fn from_cylinder_head(cylinder: u8, head: u8) -> Result<Self> {
        Self::new(cylinder.saturating_mul(2).saturating_add(head & 1))
    }

    /// Linear index
    pub fn index(self) -> u8 {
        self.0
    }

    /// Head (side) number
    pub fn head(self) -> u8 {
        self.0 & 1
    }

    /// Cylinder number
    pub fn cylinder(self) -> u8 {
        self.0 >> 1
    }

    /// Byte offset of this track within an image
    pub fn offset(self, geometry: Geometry) -> u64 {
        self.0 as u64 * geometry.bytes_per_track() as u64
    }
}

impl std::fmt::Display for TrackIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:02}", self.head(), self.cylinder())
    }
}
