/// Floppy image files
///
/// A `FloppyImage` keeps its backing file open for random access so decoded
/// tracks coming back from the drive can be written in place.

/// Empty image synthesis and the AmigaDOS block checksum
pub mod blank;
/// Geometry and track addressing
pub mod geometry;

pub use blank::{block_checksum, block_checksum_valid, create_empty_image, empty_adf, empty_raw};
pub use geometry::{Geometry, TrackIndex, TRACKS_PER_DISK};

use crate::error::{PhloppyError, Result};
use crate::protocol::constants::ID_LEN;
use log::debug;
use sha1::{Digest, Sha1};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Content identity: SHA-1 of the whole image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContentId(pub [u8; ID_LEN]);

impl ContentId {
    /// All-zero token, stored for an empty drive
    pub const EMPTY: ContentId = ContentId([0u8; ID_LEN]);

    /// Hash a complete image
    pub fn of(data: &[u8]) -> Self {
        let digest = Sha1::digest(data);
        let mut id = [0u8; ID_LEN];
        id.copy_from_slice(&digest);
        ContentId(id)
    }

    /// Raw token bytes
    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Is this the empty-drive token?
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// An open floppy image
#[derive(Debug)]
pub struct FloppyImage {
    path: PathBuf,
    id: ContentId,
    geometry: Geometry,
    file: File,
}

impl FloppyImage {
    /// Open an image read-write, identify its geometry and hash its contents
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;

        let len = file.metadata()?.len();
        let geometry = Geometry::from_len(len).ok_or_else(|| PhloppyError::ImageSize {
            path: path.clone(),
            len,
        })?;

        let mut data = Vec::with_capacity(len as usize);
        file.read_to_end(&mut data)?;
        let id = ContentId::of(&data);
        debug!("Opened {} ({}, id {})", path.display(), geometry, id);

        Ok(Self {
            path,
            id,
            geometry,
            file,
        })
    }

    /// Wrap an already open file without reading or hashing it
    #[cfg(test)]
    pub(crate) fn from_file(path: PathBuf, geometry: Geometry, file: File) -> Self {
        Self {
            path,
            id: ContentId::EMPTY,
            geometry,
            file,
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content hash taken when the image was opened
    pub fn content_id(&self) -> ContentId {
        self.id
    }

    /// Image geometry
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Bytes per track for this image
    pub fn bytes_per_track(&self) -> usize {
        self.geometry.bytes_per_track()
    }

    /// Is this a raw MFM image?
    pub fn is_raw(&self) -> bool {
        self.geometry == Geometry::Raw
    }

    /// Read the whole image
    pub fn data(&mut self) -> Result<Vec<u8>> {
        let mut data = vec![0u8; self.geometry.image_len() as usize];
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_exact(&mut data)?;
        Ok(data)
    }

    /// Read one track
    pub fn read_track(&mut self, track: TrackIndex) -> Result<Vec<u8>> {
        let mut data = vec![0u8; self.bytes_per_track()];
        self.file
            .seek(SeekFrom::Start(track.offset(self.geometry)))?;
        self.file.read_exact(&mut data)?;
        Ok(data)
    }

    /// Overwrite one track in place
    pub fn write_track(&mut self, track: TrackIndex, data: &[u8]) -> Result<()> {
        let length = self.bytes_per_track();
        if data.len() != length {
            return Err(PhloppyError::TrackLength {
                expected: length,
                actual: data.len(),
            });
        }
        let offset = track.offset(self.geometry);
        debug!(
            "Writing {}: {}..{}",
            self.path.display(),
            offset,
            offset + length as u64
        );
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        self.file.flush()?;
        Ok(())
    }

    /// Flush to storage and release the file
    pub fn close(self) -> Result<()> {
        debug!("Closing {}", self.path.display());
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_file(len: usize, fill: u8) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![fill; len]).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_open_adf() {
        let file = image_file(901_120, 0);
        let image = FloppyImage::open(file.path()).unwrap();
        assert_eq!(image.geometry(), Geometry::Adf);
        assert_eq!(image.bytes_per_track(), 5632);
        assert!(!image.is_raw());
        assert_eq!(image.content_id(), ContentId::of(&vec![0u8; 901_120]));
    }

    #[test]
    fn test_open_raw() {
        let file = image_file(2_026_880, 0xAA);
        let image = FloppyImage::open(file.path()).unwrap();
        assert_eq!(image.geometry(), Geometry::Raw);
        assert!(image.is_raw());
    }

    #[test]
    fn test_open_wrong_size() {
        let file = image_file(1000, 0);
        match FloppyImage::open(file.path()) {
            Err(PhloppyError::ImageSize { len, .. }) => assert_eq!(len, 1000),
            other => panic!("expected size error, got {:?}", other),
        }
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = FloppyImage::open(dir.path().join("missing.adf"));
        assert!(matches!(result, Err(PhloppyError::Io(_))));
    }

    #[test]
    fn test_track_write_and_read() {
        let file = image_file(901_120, 0);
        let mut image = FloppyImage::open(file.path()).unwrap();
        let track = TrackIndex::new(81).unwrap();

        image.write_track(track, &vec![0x5A; 5632]).unwrap();
        assert_eq!(image.read_track(track).unwrap(), vec![0x5A; 5632]);

        let data = image.data().unwrap();
        let offset = 81 * 5632;
        assert!(data[..offset].iter().all(|&b| b == 0));
        assert!(data[offset..offset + 5632].iter().all(|&b| b == 0x5A));
        assert!(data[offset + 5632..].iter().all(|&b| b == 0));

        // The identity is fixed at open time
        assert_eq!(image.content_id(), ContentId::of(&vec![0u8; 901_120]));
        image.close().unwrap();

        let reopened = FloppyImage::open(file.path()).unwrap();
        assert_ne!(reopened.content_id(), ContentId::of(&vec![0u8; 901_120]));
    }

    #[test]
    fn test_track_length_checked() {
        let file = image_file(901_120, 0);
        let mut image = FloppyImage::open(file.path()).unwrap();
        let result = image.write_track(TrackIndex::new(0).unwrap(), &[0u8; 100]);
        assert!(matches!(
            result,
            Err(PhloppyError::TrackLength { expected: 5632, actual: 100 })
        ));
    }

    #[test]
    fn test_content_id_display() {
        let id = ContentId([0xAB; ID_LEN]);
        assert_eq!(id.to_string(), "ab".repeat(ID_LEN));
        assert!(ContentId::EMPTY.is_empty());
        assert!(!id.is_empty());
    }
}
