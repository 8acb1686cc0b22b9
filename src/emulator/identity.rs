/// Remote identity table
///
/// The device remembers, per drive, the content hash of the image it holds.
/// On connect to the identity port it sends all four 20-byte tokens; anything
/// written back replaces the whole table. There is no per-slot update, so a
/// change to one drive is a read-modify-write of all four.

use crate::drive::DriveId;
use crate::error::{PhloppyError, Result};
use crate::image::ContentId;
use crate::protocol::constants::DRIVE_COUNT;
use log::{debug, trace};
use std::io::{self, Read, Write};
use std::net::TcpStream;

/// The four identity tokens held by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteIdentityTable {
    slots: [ContentId; DRIVE_COUNT],
}

impl RemoteIdentityTable {
    /// Read all four tokens, looping over short reads
    pub fn read_from<R: Read>(source: &mut R) -> io::Result<Self> {
        let mut table = Self::default();
        for slot in table.slots.iter_mut() {
            source.read_exact(&mut slot.0)?;
        }
        Ok(table)
    }

    /// Write all four tokens
    pub fn write_to<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        for slot in &self.slots {
            sink.write_all(slot.as_bytes())?;
        }
        sink.flush()
    }

    /// Token for a drive
    pub fn get(&self, drive: DriveId) -> ContentId {
        self.slots[drive.index()]
    }

    /// Replace the token for a drive
    pub fn set(&mut self, drive: DriveId, id: ContentId) {
        self.slots[drive.index()] = id;
    }
}

/// Short-lived connections to the identity port
#[derive(Debug, Clone)]
pub struct IdentityLink {
    host: String,
    port: u16,
}

impl IdentityLink {
    /// Identity service at `host:port`
    pub fn new<S: Into<String>>(host: S, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn connect(&self) -> Result<TcpStream> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .map_err(|e| PhloppyError::connection(self.addr(), e))?;
        debug!("Connected to {}", self.addr());
        Ok(stream)
    }

    fn read_table(&self, stream: &mut TcpStream) -> Result<RemoteIdentityTable> {
        let table = RemoteIdentityTable::read_from(stream)
            .map_err(|e| PhloppyError::connection(self.addr(), e))?;
        for drive in DriveId::ALL {
            trace!("Remote ID {}: {}", drive, table.get(drive));
        }
        Ok(table)
    }

    /// Fetch the current table
    pub fn fetch(&self) -> Result<RemoteIdentityTable> {
        let mut stream = self.connect()?;
        self.read_table(&mut stream)
    }

    /// Record a new token for one drive
    pub fn store(&self, drive: DriveId, id: ContentId) -> Result<()> {
        let mut stream = self.connect()?;
        let mut table = self.read_table(&mut stream)?;
        table.set(drive, id);
        table
            .write_to(&mut stream)
            .map_err(|e| PhloppyError::connection(self.addr(), e))?;
        debug!("Stored remote ID {} for {}", id, drive);
        Ok(())
    }
}
