/// Interactive console for the phloppy_0 drive emulator

use phloppy::image::blank::create_empty_image;
use phloppy::*;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, ExternalPrinter, Helper};
use std::path::Path;
use std::sync::{Arc, Mutex};

const HELP: &str = "\
phloppy - console for the phloppy_0 Amiga floppy drive emulator

USAGE:
  phloppy [OPTIONS]

OPTIONS:
  -h, --help              Prints help information
  -a, --address <host>    Drive address (default: 192.168.4.1)
  -p, --port <port>       Drive TCP port (default: 4500)
  -v, -vv, -vvv           Log connection events, protocol detail, socket traffic
";

struct AppArgs {
    host: String,
    port: u16,
    level: log::LevelFilter,
}

fn parse_args() -> std::result::Result<AppArgs, pico_args::Error> {
    let mut pargs = pico_args::Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{}", HELP);
        std::process::exit(0);
    }

    let level = if pargs.contains("-vvv") {
        log::LevelFilter::Trace
    } else if pargs.contains("-vv") {
        log::LevelFilter::Debug
    } else if pargs.contains(["-v", "--verbose"]) {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };

    let args = AppArgs {
        host: pargs
            .opt_value_from_str(["-a", "--address"])?
            .unwrap_or_else(|| protocol::constants::DEFAULT_HOST.to_string()),
        port: pargs
            .opt_value_from_str(["-p", "--port"])?
            .unwrap_or(protocol::constants::DEFAULT_PORT),
        level,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        eprintln!("Warning: unused arguments left: {:?}.", remaining);
    }

    Ok(args)
}

/// What the console believes is in each drive
#[derive(Debug, Clone)]
struct DriveStatus {
    path: Option<String>,
    protected: bool,
}

impl Default for DriveStatus {
    fn default() -> Self {
        Self {
            path: None,
            protected: true,
        }
    }
}

type SharedStatus = Arc<Mutex<[DriveStatus; 4]>>;

/// Command completer for the REPL
struct CommandCompleter {
    commands: Vec<&'static str>,
}

impl CommandCompleter {
    fn new() -> Self {
        Self {
            commands: vec![
                "create-adf",
                "create-raw",
                "eject",
                "exit",
                "help",
                "insert",
                "protect",
                "quit",
                "status",
                "unprotect",
            ],
        }
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Only complete the first word (command name)
        let line_to_cursor = &line[..pos];
        if line_to_cursor.contains(' ') {
            return Ok((pos, vec![]));
        }

        let prefix = line_to_cursor.to_lowercase();
        let matches: Vec<Pair> = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(&prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

/// Get the path to the history file
fn history_path() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".phloppy_history");
        p
    })
}

fn main() {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error parsing arguments: {}", e);
            std::process::exit(1);
        }
    };

    env_logger::Builder::new()
        .filter_level(args.level)
        .parse_default_env()
        .init();

    println!("=== phloppy ===");
    println!("Connecting to {}:{}...", args.host, args.port);
    println!("Type 'help' for available commands\n");

    let mut rl = match Editor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to create editor: {}", e);
            std::process::exit(1);
        }
    };
    rl.set_helper(Some(CommandCompleter::new()));

    if let Some(history_path) = history_path() {
        let _ = rl.load_history(&history_path);
    }

    let status: SharedStatus = Arc::default();
    let output: Box<dyn FnMut(String) + Send> = match rl.create_external_printer() {
        Ok(mut printer) => Box::new(move |msg| {
            let _ = printer.print(msg);
        }),
        Err(_) => Box::new(|msg| println!("{}", msg)),
    };

    let (events, received) = crossbeam_channel::unbounded();
    let config = EmulatorConfig::new().host(args.host.clone()).port(args.port);
    let emulator = match Emulator::start(config, events) {
        Ok(emulator) => emulator,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let printer_status = status.clone();
    let addr = format!("{}:{}", args.host, args.port);
    let printer = std::thread::spawn(move || print_events(received, printer_status, addr, output));

    loop {
        let input = match rl.readline("phloppy> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        let parts = parse_command_line(input);
        if parts.is_empty() {
            continue;
        }
        let command = parts[0].to_lowercase();

        match command.as_str() {
            "help" | "h" => print_help(),
            "quit" | "exit" | "q" => break,
            "status" | "s" => print_status(&status),
            "insert" | "i" => {
                if parts.len() < 3 {
                    println!("Usage: insert 0|1|2|3 <path>");
                    continue;
                }
                let Some(drive) = parse_drive(&parts[1]) else { continue };
                let path = parts[2..].join(" ");
                report(emulator.insert(drive, &path));
                if let Ok(mut drives) = status.lock() {
                    drives[drive.index()].path = Some(path);
                }
            }
            "eject" | "e" => {
                if parts.len() != 2 {
                    println!("Usage: eject 0|1|2|3");
                    continue;
                }
                let Some(drive) = parse_drive(&parts[1]) else { continue };
                report(emulator.eject(drive));
                if let Ok(mut drives) = status.lock() {
                    drives[drive.index()].path = None;
                }
            }
            "protect" | "p" | "unprotect" | "u" => {
                if parts.len() != 2 {
                    println!("Usage: {} 0|1|2|3", command);
                    continue;
                }
                let Some(drive) = parse_drive(&parts[1]) else { continue };
                let protected = command.starts_with('p');
                report(emulator.set_write_protect(drive, protected));
                if let Ok(mut drives) = status.lock() {
                    drives[drive.index()].protected = protected;
                }
            }
            "create-adf" | "create-raw" => {
                let force = parts.iter().any(|p| p == "-f");
                let paths: Vec<&String> = parts[1..].iter().filter(|p| *p != "-f").collect();
                if paths.len() != 1 {
                    println!("Usage: {} <path> [-f]", command);
                    continue;
                }
                let geometry = if command == "create-adf" {
                    Geometry::Adf
                } else {
                    Geometry::Raw
                };
                create_image(Path::new(paths[0]), geometry, force);
            }
            _ => {
                println!("Unknown command: {}. Type 'help' for available commands.", command);
            }
        }
    }

    if let Some(history_path) = history_path() {
        let _ = rl.save_history(&history_path);
    }

    emulator.shutdown();
    let _ = printer.join();
    println!("Goodbye!");
}

fn print_events(
    received: crossbeam_channel::Receiver<Event>,
    status: SharedStatus,
    addr: String,
    mut output: Box<dyn FnMut(String) + Send>,
) {
    for event in received.iter() {
        let message = match event {
            Event::Connected(Ok(())) => format!("Connected to {}", addr),
            Event::Connected(Err(e)) => format!("Connection failed: {}", e),
            Event::ImageLoaded { drive, result: Ok(()) } => format!("{}: image loaded", drive),
            Event::ImageLoaded { drive, result: Err(e) } => {
                if let Ok(mut drives) = status.lock() {
                    drives[drive.index()].path = None;
                }
                format!("{}: {}", drive, e)
            }
            Event::TrackWritten { drive, track } => {
                format!("{}: track {} written (head {}, cylinder {})", drive, track.index(), track.head(), track.cylinder())
            }
            Event::WriteError { drive, error } => format!("{}: write error: {}", drive, error),
            Event::Disconnected(None) => "Disconnected".to_string(),
            Event::Disconnected(Some(e)) => format!("Disconnected: {}", e),
        };
        output(message);
    }
}

fn report(result: Result<()>) {
    if let Err(e) = result {
        println!("Error: {}", e);
    }
}

fn parse_drive(s: &str) -> Option<DriveId> {
    match s.parse::<DriveId>() {
        Ok(drive) => Some(drive),
        Err(_) => {
            println!("Invalid drive: {} (expected 0, 1, 2 or 3)", s);
            None
        }
    }
}

fn create_image(path: &Path, geometry: Geometry, force: bool) {
    if path.exists() && !force {
        println!("{} already exists, use -f to overwrite", path.display());
        return;
    }
    match create_empty_image(path, geometry) {
        Ok(()) => println!("Created empty {} image {}", geometry, path.display()),
        Err(e) => println!("Error: {}", e),
    }
}

/// Parse command line input, respecting quoted strings
fn parse_command_line(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
            }
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

fn print_help() {
    println!("Available commands:");
    println!("  insert 0|1|2|3 <path>      - Insert a floppy image (use quotes for paths with spaces)");
    println!("  eject 0|1|2|3              - Eject a floppy image");
    println!("  protect 0|1|2|3            - Write protect a drive");
    println!("  unprotect 0|1|2|3          - Remove write protection");
    println!("  status                     - Show drive status");
    println!("  create-adf <path> [-f]     - Create an empty formatted ADF image");
    println!("  create-raw <path> [-f]     - Create an empty raw MFM image");
    println!("  help                       - Show this help");
    println!("  quit, exit                 - Exit");
}

fn print_status(status: &SharedStatus) {
    let Ok(drives) = status.lock() else { return };
    for (drive, s) in DriveId::ALL.iter().zip(drives.iter()) {
        println!(
            "{}: {} [write protection = {}]",
            drive,
            s.path.as_deref().unwrap_or("(empty)"),
            if s.protected { "on" } else { "off" }
        );
    }
}
