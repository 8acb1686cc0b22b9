/// Receive state machine
///
/// When the Amiga writes a track, the device sends it back as
/// `END <drive> <track> <data...>` with the data escaped. Any delimiter or
/// bad escape before the track is complete abandons it.

use crate::drive::{DriveId, DriveTable};
use crate::emulator::event::Callback;
use crate::image::TrackIndex;
use crate::protocol::slip::{Decoder, Symbol};
use log::{debug, trace};

/// Position within an inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxState {
    /// Waiting for a frame delimiter
    Idle,
    /// Expecting the drive number
    DriveNumber,
    /// Expecting the track number
    TrackIndex,
    /// Collecting track data
    Transmit,
}

/// Decodes inbound traffic and stores completed tracks
#[derive(Debug)]
pub struct RxMachine {
    decoder: Decoder,
    state: RxState,
    drive: Option<DriveId>,
    track: Option<TrackIndex>,
    bytes_per_track: usize,
    buffer: Vec<u8>,
}

impl Default for RxMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RxMachine {
    /// Create an idle machine
    pub fn new() -> Self {
        Self {
            decoder: Decoder::new(),
            state: RxState::Idle,
            drive: None,
            track: None,
            bytes_per_track: 0,
            buffer: Vec::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> RxState {
        self.state
    }

    /// True between frames
    pub fn is_idle(&self) -> bool {
        self.state == RxState::Idle
    }

    /// Bytes collected for the track in progress
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a chunk read from the link
    pub fn process<C: Callback + ?Sized>(
        &mut self,
        bytes: &[u8],
        drives: &mut DriveTable,
        callback: &mut C,
    ) {
        for &byte in bytes {
            match self.decoder.decode(byte) {
                Symbol::EscapeBegin => {}
                Symbol::FrameDelimiter if self.state == RxState::Idle => {
                    self.state = RxState::DriveNumber;
                }
                Symbol::FrameDelimiter | Symbol::Error => self.reset(),
                Symbol::Ordinary(value) => self.ordinary(value, drives, callback),
            }
        }
    }

    fn reset(&mut self) {
        if self.state != RxState::Idle {
            debug!("RX reset in {:?} after {} bytes", self.state, self.buffer.len());
        }
        self.state = RxState::Idle;
        self.buffer.clear();
    }

    fn ordinary<C: Callback + ?Sized>(&mut self, value: u8, drives: &mut DriveTable, callback: &mut C) {
        match self.state {
            RxState::Idle => {}
            RxState::DriveNumber => match drives.by_number(value) {
                Some((id, drive)) if !drive.write_protected => {
                    self.drive = Some(id);
                    self.state = RxState::TrackIndex;
                }
                Some((id, _)) => {
                    trace!("RX ignoring write to protected {}", id);
                    self.state = RxState::Idle;
                }
                None => {
                    debug!("RX invalid drive {}", value);
                    self.state = RxState::Idle;
                }
            },
            RxState::TrackIndex => {
                let image = self.drive.and_then(|id| drives.get(id).image.as_ref());
                match (TrackIndex::new(value), image) {
                    (Ok(track), Some(image)) => {
                        self.track = Some(track);
                        self.bytes_per_track = image.bytes_per_track();
                        self.buffer.clear();
                        self.buffer.reserve(self.bytes_per_track);
                        self.state = RxState::Transmit;
                    }
                    (Err(e), _) => {
                        debug!("RX {}", e);
                        self.state = RxState::Idle;
                    }
                    (_, None) => {
                        debug!("RX track for empty drive {:?}", self.drive);
                        self.state = RxState::Idle;
                    }
                }
            }
            RxState::Transmit => {
                self.buffer.push(value);
                if self.buffer.len() == self.bytes_per_track {
                    self.complete(drives, callback);
                }
            }
        }
    }

    fn complete<C: Callback + ?Sized>(&mut self, drives: &mut DriveTable, callback: &mut C) {
        self.state = RxState::Idle;
        let (Some(id), Some(track)) = (self.drive, self.track) else {
            self.buffer.clear();
            return;
        };

        match drives.get_mut(id).image.as_mut() {
            Some(image) if image.bytes_per_track() == self.buffer.len() => {
                match image.write_track(track, &self.buffer) {
                    Ok(()) => callback.track_written(id, track),
                    Err(e) => callback.write_error(id, &e),
                }
            }
            _ => debug!("RX discarding track {} for {}: image gone", track, id),
        }
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::event::Event;
    use crate::image::{FloppyImage, Geometry};
    use crate::protocol::constants::END;
    use crate::protocol::slip;
    use std::io::Write;

    struct Fixture {
        drives: DriveTable,
        events: crossbeam_channel::Sender<Event>,
        received: crossbeam_channel::Receiver<Event>,
        _file: tempfile::NamedTempFile,
    }

    fn fixture(protected: bool) -> Fixture {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; 901_120]).unwrap();
        file.flush().unwrap();

        let mut drives = DriveTable::new();
        let drive = drives.get_mut(DriveId::ALL[1]);
        drive.image = Some(FloppyImage::open(file.path()).unwrap());
        drive.write_protected = protected;

        let (events, received) = crossbeam_channel::unbounded();
        Fixture {
            drives,
            events,
            received,
            _file: file,
        }
    }

    fn frame(drive: u8, track: u8, data: &[u8]) -> Vec<u8> {
        let mut out = vec![END, drive, track];
        out.extend(slip::encode(data));
        out.push(END);
        out
    }

    #[test]
    fn test_track_written() {
        let mut fx = fixture(false);
        let mut rx = RxMachine::new();
        let data: Vec<u8> = (0..5632).map(|i| (i % 256) as u8).collect();

        rx.process(&frame(1, 3, &data), &mut fx.drives, &mut fx.events);
        assert!(rx.is_idle());

        let track = TrackIndex::new(3).unwrap();
        assert_eq!(
            fx.received.try_recv().unwrap(),
            Event::TrackWritten {
                drive: DriveId::ALL[1],
                track
            }
        );
        assert!(fx.received.try_recv().is_err());

        let image = fx.drives.get_mut(DriveId::ALL[1]).image.as_mut().unwrap();
        assert_eq!(image.read_track(track).unwrap(), data);
        assert!(image.read_track(TrackIndex::new(2).unwrap()).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_split_across_chunks() {
        let mut fx = fixture(false);
        let mut rx = RxMachine::new();
        let data = vec![END; 5632];
        let bytes = frame(1, 159, &data);

        for piece in bytes.chunks(7) {
            rx.process(piece, &mut fx.drives, &mut fx.events);
        }
        assert!(rx.is_idle());
        assert!(matches!(
            fx.received.try_recv(),
            Ok(Event::TrackWritten { .. })
        ));
    }

    #[test]
    fn test_write_protected_drive_ignored() {
        let mut fx = fixture(true);
        let mut rx = RxMachine::new();
        rx.process(&[END, 1], &mut fx.drives, &mut fx.events);
        assert_eq!(rx.state(), RxState::Idle);

        rx.process(&frame(1, 0, &[0x11; 5632]), &mut fx.drives, &mut fx.events);
        assert!(fx.received.try_recv().is_err());
    }

    #[test]
    fn test_delimiter_aborts_track() {
        let mut fx = fixture(false);
        let mut rx = RxMachine::new();
        rx.process(&[END, 1, 4], &mut fx.drives, &mut fx.events);
        assert_eq!(rx.state(), RxState::Transmit);
        rx.process(&[0x22; 1000], &mut fx.drives, &mut fx.events);
        assert_eq!(rx.pending(), 1000);

        rx.process(&[END], &mut fx.drives, &mut fx.events);
        assert!(rx.is_idle());
        assert_eq!(rx.pending(), 0);
        assert!(fx.received.try_recv().is_err());

        let image = fx.drives.get_mut(DriveId::ALL[1]).image.as_mut().unwrap();
        assert!(image.read_track(TrackIndex::new(4).unwrap()).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_bad_escape_resets() {
        let mut fx = fixture(false);
        let mut rx = RxMachine::new();
        rx.process(&[END, 1, 4, 0x01, 0xDB, 0x00], &mut fx.drives, &mut fx.events);
        assert!(rx.is_idle());
    }

    #[test]
    fn test_escape_does_not_advance_state() {
        let mut fx = fixture(false);
        let mut rx = RxMachine::new();
        rx.process(&[END, 0xDB], &mut fx.drives, &mut fx.events);
        assert_eq!(rx.state(), RxState::DriveNumber);
        // Escaped END is not a valid drive number
        rx.process(&[0xDC], &mut fx.drives, &mut fx.events);
        assert!(rx.is_idle());
    }

    #[test]
    fn test_empty_drive_and_bad_numbers() {
        let mut fx = fixture(false);
        fx.drives.get_mut(DriveId::ALL[2]).write_protected = false;
        let mut rx = RxMachine::new();

        rx.process(&[END, 2, 0], &mut fx.drives, &mut fx.events);
        assert!(rx.is_idle());
        rx.process(&[END, 9], &mut fx.drives, &mut fx.events);
        assert!(rx.is_idle());
        rx.process(&[END, 1, 160], &mut fx.drives, &mut fx.events);
        assert!(rx.is_idle());
    }

    #[test]
    fn test_write_failure_reported_and_reception_continues() {
        let mut fx = fixture(false);
        let file = tempfile::NamedTempFile::new().unwrap();
        file.as_file().set_len(901_120).unwrap();
        let read_only = std::fs::File::open(file.path()).unwrap();
        let broken = fx.drives.get_mut(DriveId::ALL[2]);
        broken.image = Some(FloppyImage::from_file(
            file.path().to_path_buf(),
            Geometry::Adf,
            read_only,
        ));
        broken.write_protected = false;

        let mut rx = RxMachine::new();
        rx.process(&frame(2, 10, &[0x44; 5632]), &mut fx.drives, &mut fx.events);
        match fx.received.try_recv() {
            Ok(Event::WriteError { drive, .. }) => assert_eq!(drive, DriveId::ALL[2]),
            other => panic!("expected write error, got {:?}", other),
        }

        // The trailing delimiter already opened the next frame
        assert_eq!(rx.state(), RxState::DriveNumber);
        rx.process(&frame(1, 10, &[0x44; 5632])[1..], &mut fx.drives, &mut fx.events);
        assert_eq!(
            fx.received.try_recv().unwrap(),
            Event::TrackWritten {
                drive: DriveId::ALL[1],
                track: TrackIndex::new(10).unwrap()
            }
        );
        let image = fx.drives.get_mut(DriveId::ALL[1]).image.as_mut().unwrap();
        assert_eq!(image.read_track(TrackIndex::new(10).unwrap()).unwrap(), vec![0x44; 5632]);
    }

    #[test]
    fn test_eject_mid_track_discards() {
        let mut fx = fixture(false);
        let mut rx = RxMachine::new();
        rx.process(&[END, 1, 0], &mut fx.drives, &mut fx.events);
        fx.drives.get_mut(DriveId::ALL[1]).close();
        rx.process(&[0x33; 5632], &mut fx.drives, &mut fx.events);
        assert!(rx.is_idle());
        assert!(fx.received.try_recv().is_err());
    }
}
