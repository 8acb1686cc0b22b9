/// Queue messages for the engine thread

use crate::drive::DriveId;
use std::path::PathBuf;

/// Request from the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Mount an image file in a drive
    Insert {
        /// Target drive
        drive: DriveId,
        /// Image file
        path: PathBuf,
    },
    /// Remove the image from a drive
    Eject {
        /// Target drive
        drive: DriveId,
    },
    /// Flip a drive's write protection switch
    SetWriteProtect {
        /// Target drive
        drive: DriveId,
        /// New switch position
        protected: bool,
    },
    /// Close the link and release every image
    Shutdown,
}

/// Everything the engine consumes, in arrival order
///
/// Commands and inbound data share one queue so their relative order is kept.
#[derive(Debug)]
pub(crate) enum Message {
    /// Application request
    Command(Command),
    /// Raw bytes read from the primary link
    Received(Vec<u8>),
    /// The reader stopped: EOF (`None`) or a read error
    Disconnected(Option<std::io::Error>),
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Message::Command(command)
    }
}
