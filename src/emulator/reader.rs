/// Background reader for the primary link

use crate::emulator::message::Message;
use crossbeam_channel::Sender;
use log::{debug, trace};
use std::io::{self, Read};
use std::net::{Shutdown, TcpStream};
use std::thread::{self, JoinHandle};

/// Blocks on socket reads and forwards each chunk to the engine queue
pub struct SocketReader {
    stream: TcpStream,
    handle: Option<JoinHandle<()>>,
}

impl SocketReader {
    /// Start reading from a clone of `stream`
    pub(crate) fn spawn(
        stream: &TcpStream,
        queue: Sender<Message>,
        buffer_len: usize,
    ) -> io::Result<Self> {
        let mut source = stream.try_clone()?;
        let handle = thread::Builder::new()
            .name("phloppy-reader".into())
            .spawn(move || read_loop(&mut source, &queue, buffer_len))?;
        Ok(Self {
            stream: stream.try_clone()?,
            handle: Some(handle),
        })
    }

    /// Unblock the reader by shutting the socket down and wait for it
    pub fn close(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SocketReader {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_loop<R: Read>(source: &mut R, queue: &Sender<Message>, buffer_len: usize) {
    let mut buffer = vec![0u8; buffer_len];
    loop {
        match source.read(&mut buffer) {
            Ok(0) => {
                debug!("Reader: end of stream");
                let _ = queue.send(Message::Disconnected(None));
                break;
            }
            Ok(n) => {
                trace!("Reader: {} bytes", n);
                if queue.send(Message::Received(buffer[..n].to_vec())).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                debug!("Reader: {}", e);
                let _ = queue.send(Message::Disconnected(Some(e)));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_forwards_chunks_then_eof() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut source = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        read_loop(&mut source, &tx, 2);

        let mut received = Vec::new();
        let mut saw_eof = false;
        for message in rx.try_iter() {
            match message {
                Message::Received(chunk) => {
                    assert!(!chunk.is_empty());
                    received.extend(chunk);
                }
                Message::Disconnected(None) => saw_eof = true,
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(received, vec![1, 2, 3, 4, 5]);
        assert!(saw_eof);
    }

    #[test]
    fn test_read_error_reported() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            }
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        read_loop(&mut Broken, &tx, 16);
        assert!(matches!(rx.try_recv(), Ok(Message::Disconnected(Some(_)))));
    }
}
