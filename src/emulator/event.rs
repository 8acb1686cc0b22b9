/// Notifications from the engine to the application

use crate::drive::DriveId;
use crate::error::PhloppyError;
use crate::image::TrackIndex;
use crossbeam_channel::Sender;

/// Receives engine notifications
///
/// Called on the engine thread; implementations should hand work off rather
/// than block.
pub trait Callback: Send {
    /// The primary link came up, or failed to
    fn connected(&mut self, result: Result<(), &PhloppyError>);

    /// An insert finished
    fn image_loaded(&mut self, drive: DriveId, result: Result<(), &PhloppyError>);

    /// The drive wrote a track back and it was stored in the image
    fn track_written(&mut self, drive: DriveId, track: TrackIndex);

    /// A received track could not be stored
    fn write_error(&mut self, drive: DriveId, error: &PhloppyError);

    /// The link went down after being established
    fn disconnected(&mut self, _error: Option<&PhloppyError>) {}
}

/// Owned form of a callback notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Link established or failed
    Connected(Result<(), String>),
    /// Insert finished
    ImageLoaded {
        /// Drive
        drive: DriveId,
        /// Outcome
        result: Result<(), String>,
    },
    /// Track stored
    TrackWritten {
        /// Drive
        drive: DriveId,
        /// Track that was written
        track: TrackIndex,
    },
    /// Track could not be stored
    WriteError {
        /// Drive
        drive: DriveId,
        /// Error message
        error: String,
    },
    /// Link lost; `None` for a clean close by the device
    Disconnected(Option<String>),
}

fn owned(result: Result<(), &PhloppyError>) -> Result<(), String> {
    result.map_err(|e| e.to_string())
}

/// Forward notifications into a channel
impl Callback for Sender<Event> {
    fn connected(&mut self, result: Result<(), &PhloppyError>) {
        let _ = self.send(Event::Connected(owned(result)));
    }

    fn image_loaded(&mut self, drive: DriveId, result: Result<(), &PhloppyError>) {
        let _ = self.send(Event::ImageLoaded {
            drive,
            result: owned(result),
        });
    }

    fn track_written(&mut self, drive: DriveId, track: TrackIndex) {
        let _ = self.send(Event::TrackWritten { drive, track });
    }

    fn write_error(&mut self, drive: DriveId, error: &PhloppyError) {
        let _ = self.send(Event::WriteError {
            drive,
            error: error.to_string(),
        });
    }

    fn disconnected(&mut self, error: Option<&PhloppyError>) {
        let _ = self.send(Event::Disconnected(error.map(|e| e.to_string())));
    }
}
