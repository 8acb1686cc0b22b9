/*!
# phloppy

Client library for the phloppy_0 network floppy drive emulator: a
microcontroller that stands in for up to four Amiga floppy drives and is fed
disk images over Wi-Fi.

## Features

- SLIP-style framing with block padding and keep-alives on the primary link
- Image upload skipped when the device already holds the same contents
  (SHA-1 identity table on the secondary port)
- Tracks written by the Amiga are decoded and stored back into the image file
- ADF (901,120 bytes) and raw MFM (2,026,880 bytes) images
- Blank image synthesis with valid AmigaDOS checksums

## Quick Start

```rust,no_run
use phloppy::{DriveId, Emulator, EmulatorConfig, Event};

let (events, received) = crossbeam_channel::unbounded();
let config = EmulatorConfig::new().host("192.168.4.1").port(4500);
let emulator = Emulator::start(config, events)?;

let df0 = DriveId::new(0)?;
emulator.insert(df0, "workbench.adf")?;
emulator.set_write_protect(df0, false)?;

for event in received.iter() {
    match event {
        Event::TrackWritten { drive, track } => println!("{} wrote {}", drive, track),
        Event::Disconnected(_) => break,
        other => println!("{:?}", other),
    }
}
emulator.shutdown();
# Ok::<(), phloppy::PhloppyError>(())
```

## Modules

- `protocol`: wire constants, framing, opcodes and padding
- `image`: floppy image files, geometry and blank image synthesis
- `drive`: drive slots
- `emulator`: engine thread, reader thread and the application handle
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// Drive slots
pub mod drive;
/// Engine, reader and application handle
pub mod emulator;
/// Error types and Result alias
pub mod error;
/// Floppy image files
pub mod image;
/// Wire protocol
pub mod protocol;

// Re-export common types
pub use drive::{Drive, DriveId, DriveTable};
pub use emulator::{Callback, Command, Emulator, EmulatorConfig, Event, RxMachine, RxState};
pub use error::{PhloppyError, Result};
pub use image::{ContentId, FloppyImage, Geometry, TrackIndex};
