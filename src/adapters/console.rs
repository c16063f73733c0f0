//! Serial console adapter.
//!
//! A reader thread blocks on the UART and hands complete lines to the
//! control loop through a bounded `embassy-sync` channel; the loop drains at
//! most one line per iteration through [`QueuedConsole`].
//!
//! ```text
//! ┌──────────────┐  ConsoleLine  ┌──────────────┐
//! │ stdin thread │──────────────▶│ Control Loop │
//! │  (blocking)  │               │   (sync)     │
//! └──────────────┘               └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::String;
use log::warn;

use crate::app::ports::{CONSOLE_LINE_LEN, ConsoleChannel};

pub type ConsoleLine = String<CONSOLE_LINE_LEN>;

/// Channel depth for console lines.
const CONSOLE_DEPTH: usize = 4;

pub type ConsoleQueue = Channel<CriticalSectionRawMutex, ConsoleLine, CONSOLE_DEPTH>;

/// Queue one typed line. Blank lines are ignored; over-long lines are
/// truncated; a full queue drops the line. Returns whether it was queued.
pub fn submit_line(queue: &ConsoleQueue, line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    let mut buf = ConsoleLine::new();
    for ch in trimmed.chars() {
        if buf.push(ch).is_err() {
            warn!("console line truncated to {CONSOLE_LINE_LEN} bytes");
            break;
        }
    }
    if queue.try_send(buf).is_err() {
        warn!("console queue full; line dropped");
        return false;
    }
    true
}

/// Control-loop side of the console queue.
pub struct QueuedConsole<'a> {
    queue: &'a ConsoleQueue,
}

impl<'a> QueuedConsole<'a> {
    pub fn new(queue: &'a ConsoleQueue) -> Self {
        Self { queue }
    }
}

impl ConsoleChannel for QueuedConsole<'_> {
    fn poll(&mut self) -> Option<ConsoleLine> {
        self.queue.try_receive().ok()
    }
}

/// Spawn the UART reader. ESP-IDF's stdin is non-blocking, so the thread
/// backs off briefly whenever nothing is buffered.
#[cfg(target_os = "espidf")]
pub fn spawn_stdin_reader(
    queue: &'static ConsoleQueue,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    use std::io::{BufRead, ErrorKind};
    use std::time::Duration;

    const BACKOFF: Duration = Duration::from_millis(50);

    std::thread::Builder::new()
        .name("console".into())
        .stack_size(4096)
        .spawn(move || {
            let stdin = std::io::stdin();
            let mut line = std::string::String::new();
            loop {
                match stdin.lock().read_line(&mut line) {
                    Ok(0) => std::thread::sleep(BACKOFF),
                    Ok(_) if line.ends_with('\n') => {
                        submit_line(queue, &line);
                        line.clear();
                    }
                    Ok(_) => {}
                    Err(e) if e.kind() == ErrorKind::WouldBlock => std::thread::sleep(BACKOFF),
                    Err(e) => {
                        warn!("console read failed: {e}");
                        line.clear();
                        std::thread::sleep(BACKOFF);
                    }
                }
            }
        })
}
