use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for emulator operations
pub type Result<T> = std::result::Result<T, PhloppyError>;

/// Errors that can occur while talking to the drive emulator or handling images
#[derive(Debug, Error)]
pub enum PhloppyError {
    /// I/O error occurred while reading or writing an image file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Socket connect, read or write failure
    #[error("Connection to {addr} failed: {source}")]
    Connection {
        /// Remote address (host:port)
        addr: String,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// The primary link was closed by the remote side
    #[error("Connection closed by remote device")]
    Disconnected,

    /// Image file length matches neither supported geometry
    #[error("File size not handled: {path} is {len} bytes")]
    ImageSize {
        /// Image path
        path: PathBuf,
        /// Actual file length
        len: u64,
    },

    /// Drive number outside 0..=3
    #[error("Invalid drive {0} (max: 3)")]
    InvalidDrive(u8),

    /// Track number outside the disk
    #[error("Invalid track {track} (max: {max})")]
    InvalidTrack {
        /// Track index
        track: u8,
        /// Maximum allowed track index
        max: u8,
    },

    /// Track buffer of the wrong size for the image geometry
    #[error("Track length mismatch: expected {expected} bytes, got {actual}")]
    TrackLength {
        /// Bytes per track for the image geometry
        expected: usize,
        /// Supplied buffer length
        actual: usize,
    },
}

impl PhloppyError {
    /// Create a connection error for the given address
    pub fn connection<S: Into<String>>(addr: S, source: std::io::Error) -> Self {
        PhloppyError::Connection {
            addr: addr.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PhloppyError::InvalidTrack { track: 170, max: 159 };
        assert_eq!(err.to_string(), "Invalid track 170 (max: 159)");
    }

    #[test]
    fn test_image_size_error() {
        let err = PhloppyError::ImageSize {
            path: PathBuf::from("disk.adf"),
            len: 1234,
        };
        assert_eq!(err.to_string(), "File size not handled: disk.adf is 1234 bytes");
    }

    #[test]
    fn test_connection_error() {
        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = PhloppyError::connection("192.168.4.1:4500", refused);
        assert_eq!(err.to_string(), "Connection to 192.168.4.1:4500 failed: refused");
        assert!(std::error::Error::source(&err).is_some());
    }
}
