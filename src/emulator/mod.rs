/// Client side of the drive emulator link
///
/// Three threads are involved: the application, which submits [`Command`]s
/// through an [`Emulator`] handle; a reader blocked on the primary socket;
/// and the engine, which owns the socket writer and every drive. Commands and
/// received data meet in one FIFO queue that only the engine consumes, so no
/// drive state is shared.

/// Engine configuration
pub mod config;
/// Engine run loop
mod engine;
/// Notifications to the application
pub mod event;
/// Remote identity table on the secondary port
pub mod identity;
/// Queue messages
pub mod message;
/// Primary socket reader thread
pub(crate) mod reader;
/// Receive state machine
pub mod rx;

pub use config::EmulatorConfig;
pub use event::{Callback, Event};
pub use identity::{IdentityLink, RemoteIdentityTable};
pub use message::Command;
pub use rx::{RxMachine, RxState};

use crate::drive::DriveId;
use crate::error::{PhloppyError, Result};
use crossbeam_channel::Sender;
use engine::Engine;
use message::Message;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

/// Handle to a running engine
///
/// Dropping the handle shuts the engine down and waits for it.
pub struct Emulator {
    queue: Sender<Message>,
    thread: Option<JoinHandle<()>>,
}

impl Emulator {
    /// Start the engine thread; the outcome of connecting is reported through
    /// [`Callback::connected`]
    pub fn start<C: Callback + 'static>(config: EmulatorConfig, callback: C) -> Result<Self> {
        let (queue, inbox) = crossbeam_channel::unbounded();
        let engine = Engine::new(config, callback, inbox, queue.clone());
        let thread = thread::Builder::new()
            .name("phloppy-engine".into())
            .spawn(move || engine.run())?;
        Ok(Self {
            queue,
            thread: Some(thread),
        })
    }

    /// Queue a command; fails once the engine has stopped
    pub fn submit(&self, command: Command) -> Result<()> {
        self.queue
            .send(command.into())
            .map_err(|_| PhloppyError::Disconnected)
    }

    /// Mount an image file in a drive
    pub fn insert<P: Into<PathBuf>>(&self, drive: DriveId, path: P) -> Result<()> {
        self.submit(Command::Insert {
            drive,
            path: path.into(),
        })
    }

    /// Remove the image from a drive
    pub fn eject(&self, drive: DriveId) -> Result<()> {
        self.submit(Command::Eject { drive })
    }

    /// Set a drive's write protection switch
    pub fn set_write_protect(&self, drive: DriveId, protected: bool) -> Result<()> {
        self.submit(Command::SetWriteProtect { drive, protected })
    }

    /// Has the engine thread exited?
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Stop the engine and wait for it to release the link and images
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.queue.send(Message::Command(Command::Shutdown));
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Emulator {
    fn drop(&mut self) {
        self.stop();
    }
}
