//! Memory-mapped console output
//!
//! A single 4-byte register. Writing a word prints the low byte to the host's
//! standard output (or an injected sink) and retains the value for readback.

use super::IoDevice;
use neptune_spec::{Address, Word};
use std::io::Write;
use std::sync::{Arc, Mutex};

pub const CONSOLE_SIZE: u32 = 4;
pub const OFFSET_OUTPUT_PRINT: u32 = 0;

pub struct ConsoleDevice {
    base: Address,
    last: Word,
    sink: Arc<Mutex<dyn Write + Send>>,
}

impl ConsoleDevice {
    /// Console printing to the process's standard output.
    pub fn new() -> Self {
        Self::with_writer(Arc::new(Mutex::new(std::io::stdout())))
    }

    /// Console printing to an arbitrary sink. Tests capture output this way.
    pub fn with_writer(sink: Arc<Mutex<dyn Write + Send>>) -> Self {
        ConsoleDevice {
            base: 0,
            last: 0,
            sink,
        }
    }

    fn emit(&self, value: Word) {
        let byte = (value & 0xFF) as u8;
        let mut sink = self
            .sink
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // The host owns buffering; a failed write is its problem, not a VM
        // fault.
        let _ = sink.write_all(&[byte]);
        let _ = sink.flush();
    }
}

impl Default for ConsoleDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl IoDevice for ConsoleDevice {
    fn base(&self) -> Address {
        self.base
    }

    fn attach(&mut self, base: Address) {
        self.base = base;
    }

    fn size(&self) -> u32 {
        CONSOLE_SIZE
    }

    fn name(&self) -> &'static str {
        "console-out"
    }

    fn read_word(&self, addr: Address) -> Word {
        match addr - self.base {
            OFFSET_OUTPUT_PRINT => self.last,
            _ => 0,
        }
    }

    fn write_word(&mut self, addr: Address, value: Word) {
        if addr - self.base == OFFSET_OUTPUT_PRINT {
            self.emit(value);
            self.last = value;
        }
    }

    fn offset_names(&self) -> &'static [(u32, &'static str)] {
        &[(OFFSET_OUTPUT_PRINT, "OUTPUT_PRINT")]
    }
}
