/// Engine thread: the only writer of the primary link and owner of the drives

use crate::drive::{DriveId, DriveTable};
use crate::emulator::config::EmulatorConfig;
use crate::emulator::event::Callback;
use crate::emulator::identity::IdentityLink;
use crate::emulator::message::{Command, Message};
use crate::emulator::reader::SocketReader;
use crate::emulator::rx::RxMachine;
use crate::error::{PhloppyError, Result};
use crate::image::{ContentId, FloppyImage};
use crate::protocol::constants::END;
use crate::protocol::{slip, FrameWriter, Opcode};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, info, warn};
use std::io::{self, BufWriter};
use std::net::TcpStream;
use std::path::Path;
use std::time::Instant;

type Link = FrameWriter<BufWriter<TcpStream>>;

pub(crate) struct Engine<C: Callback> {
    config: EmulatorConfig,
    callback: C,
    queue: Receiver<Message>,
    reader_queue: Option<Sender<Message>>,
    identity: IdentityLink,
    drives: DriveTable,
    rx: RxMachine,
}

impl<C: Callback> Engine<C> {
    pub(crate) fn new(
        config: EmulatorConfig,
        callback: C,
        queue: Receiver<Message>,
        reader_queue: Sender<Message>,
    ) -> Self {
        let identity = IdentityLink::new(config.host.clone(), config.identity_port());
        Self {
            config,
            callback,
            queue,
            reader_queue: Some(reader_queue),
            identity,
            drives: DriveTable::new(),
            rx: RxMachine::new(),
        }
    }

    /// Connect, serve the queue until shutdown or link loss, then release everything
    pub(crate) fn run(mut self) {
        let addr = self.config.primary_addr();
        let (stream, reader) = match self.connect(&addr) {
            Ok(connected) => connected,
            Err(e) => {
                warn!("{}", e);
                self.callback.connected(Err(&e));
                return;
            }
        };
        info!("Connected to {}", addr);
        self.callback.connected(Ok(()));

        let mut link = FrameWriter::new(BufWriter::new(stream));
        match self.serve(&mut link) {
            Ok(()) => info!("Shutting down"),
            Err(e) => {
                warn!("Link lost: {}", e);
                let error = match e {
                    PhloppyError::Disconnected => None,
                    ref other => Some(other),
                };
                self.callback.disconnected(error);
            }
        }

        debug!("Closing connections");
        reader.close();
        self.drives.close_all();
        info!("Emulator finished");
    }

    fn connect(&mut self, addr: &str) -> Result<(TcpStream, SocketReader)> {
        let stream = TcpStream::connect((self.config.host.as_str(), self.config.port))
            .map_err(|e| PhloppyError::connection(addr, e))?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY on {}: {}", addr, e);
        }

        let queue = self.reader_queue.take().ok_or(PhloppyError::Disconnected)?;
        let reader = SocketReader::spawn(&stream, queue, self.config.read_buffer_len)
            .map_err(|e| PhloppyError::connection(addr, e))?;
        Ok((stream, reader))
    }

    fn serve(&mut self, link: &mut Link) -> Result<()> {
        loop {
            let message = if self.rx.is_idle() {
                match self.queue.recv_timeout(self.config.keepalive_interval) {
                    Ok(message) => Some(message),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => return Ok(()),
                }
            } else {
                // Mid-frame: never wait, the device only talks while we do
                match self.queue.try_recv() {
                    Ok(message) => Some(message),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => return Ok(()),
                }
            };

            match message {
                None => {
                    let filler = if self.rx.is_idle() {
                        0
                    } else {
                        self.config.busy_filler_len
                    };
                    link.send_nop(filler).map_err(|e| self.link_error(e))?;
                }
                Some(Message::Received(chunk)) => {
                    self.rx.process(&chunk, &mut self.drives, &mut self.callback);
                }
                Some(Message::Disconnected(None)) => return Err(PhloppyError::Disconnected),
                Some(Message::Disconnected(Some(e))) => return Err(self.link_error(e)),
                Some(Message::Command(Command::Shutdown)) => return Ok(()),
                Some(Message::Command(command)) => {
                    debug!("{:?}", command);
                    self.execute(command, link)?;
                }
            }
        }
    }

    fn link_error(&self, e: io::Error) -> PhloppyError {
        PhloppyError::connection(self.config.primary_addr(), e)
    }

    fn execute(&mut self, command: Command, link: &mut Link) -> Result<()> {
        match command {
            Command::Insert { drive, path } => {
                self.drives.get_mut(drive).close();
                match self.insert(drive, &path, link) {
                    Ok(image) => {
                        self.drives.get_mut(drive).image = Some(image);
                        self.callback.image_loaded(drive, Ok(()));
                    }
                    Err(e) => {
                        warn!("Insert {} into {} failed: {}", path.display(), drive, e);
                        self.callback.image_loaded(drive, Err(&e));
                    }
                }
            }
            Command::Eject { drive } => {
                self.identity.store(drive, ContentId::EMPTY)?;
                link.send_command(Opcode::Eject, drive)
                    .map_err(|e| self.link_error(e))?;
                self.drives.get_mut(drive).close();
            }
            Command::SetWriteProtect { drive, protected } => {
                self.drives.get_mut(drive).write_protected = protected;
                link.send_command(Opcode::write_protect(protected), drive)
                    .map_err(|e| self.link_error(e))?;
            }
            Command::Shutdown => {}
        }
        Ok(())
    }

    /// Open an image and make sure the device holds the same contents
    fn insert(&mut self, drive: DriveId, path: &Path, link: &mut Link) -> Result<FloppyImage> {
        let started = Instant::now();
        let mut image = FloppyImage::open(path)?;

        let remote = self.identity.fetch()?;
        if remote.get(drive) == image.content_id() {
            debug!("Skip sending {} data", drive);
            return Ok(image);
        }

        debug!("Sending {} data", drive);
        let payload = slip::encode(&image.data()?);
        let head = [
            END,
            Opcode::Eject.code(drive),
            END,
            Opcode::set_type(image.geometry()).code(drive),
            END,
            Opcode::Fill.code(drive),
        ];
        let tail = [END, Opcode::Insert.code(drive)];
        link.send(&[&head, &payload, &tail])
            .map_err(|e| self.link_error(e))?;

        self.identity.store(drive, image.content_id())?;
        debug!("Elapsed time: {} ms", started.elapsed().as_millis());
        Ok(image)
    }
}
