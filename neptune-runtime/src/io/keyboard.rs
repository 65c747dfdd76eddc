//! Memory-mapped keyboard input buffer
//!
//! A 32-entry FIFO of character codes fed by the host input thread through a
//! [`KeyboardHandle`]. On overflow the oldest character is dropped. All
//! buffer mutation and register reads go through one mutex, so the CPU always
//! sees a consistent snapshot.
//!
//! Register map (16 bytes):
//!
//! | offset | register     | access | contents                                |
//! |--------|--------------|--------|-----------------------------------------|
//! | +0x00  | FIRST_CHAR   | RO     | oldest buffered character, 0 if empty   |
//! | +0x04  | BUFFER_READY | RO     | 1 iff the buffer holds >= 2 characters  |
//! | +0x08  | CURRENT_CHAR | RO     | most recently enqueued character        |
//! | +0x0C  | CONTROL      | WO     | 1 consume oldest, 2 clear, 3 reset      |

use super::IoDevice;
use neptune_spec::{Address, Word};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

pub const KEYBOARD_SIZE: u32 = 16;
pub const KEYBOARD_BUFFER_CAPACITY: usize = 32;

pub const OFFSET_FIRST_CHAR: u32 = 0;
pub const OFFSET_BUFFER_READY: u32 = 4;
pub const OFFSET_CURRENT_CHAR: u32 = 8;
pub const OFFSET_CONTROL: u32 = 12;

const CTRL_CONSUME_CHAR: Word = 1;
const CTRL_CLEAR_BUFFER: Word = 2;
const CTRL_RESET: Word = 3;

/// A key event as reported by the host input system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent<'a> {
    Enter,
    Backspace,
    Tab,
    Space,
    /// Any other key, carrying its textual representation.
    Text(&'a str),
}

impl KeyEvent<'_> {
    /// Character code enqueued for this event, if any.
    pub fn to_char(self) -> Option<char> {
        match self {
            KeyEvent::Enter => Some('\n'),
            KeyEvent::Backspace => Some('\u{8}'),
            KeyEvent::Tab => Some('\t'),
            KeyEvent::Space => Some(' '),
            KeyEvent::Text(text) => text.chars().next(),
        }
    }
}

#[derive(Debug, Default)]
struct KeyboardState {
    buffer: VecDeque<Word>,
}

impl KeyboardState {
    fn enqueue(&mut self, code: Word) {
        if self.buffer.len() >= KEYBOARD_BUFFER_CAPACITY {
            self.buffer.pop_front();
        }
        self.buffer.push_back(code);
    }

    fn first_char(&self) -> Word {
        self.buffer.front().copied().unwrap_or(0)
    }

    fn current_char(&self) -> Word {
        self.buffer.back().copied().unwrap_or(0)
    }

    fn ready(&self) -> Word {
        (self.buffer.len() >= 2) as Word
    }

    fn handle_command(&mut self, command: Word) {
        match command {
            CTRL_CONSUME_CHAR => {
                self.buffer.pop_front();
            }
            CTRL_CLEAR_BUFFER | CTRL_RESET => {
                // Registers are derived from the buffer, so reset and clear
                // coincide observably; both commands stay valid.
                self.buffer.clear();
            }
            _ => {}
        }
    }
}

/// Host-side handle for feeding key events into the buffer.
///
/// Cloneable and `Send`; the host input thread keeps one while the device
/// itself lives on the I/O bus.
#[derive(Clone)]
pub struct KeyboardHandle {
    state: Arc<Mutex<KeyboardState>>,
}

impl KeyboardHandle {
    /// Enqueue the character for a key event. Events with no textual
    /// representation are ignored.
    pub fn push_event(&self, event: KeyEvent<'_>) {
        if let Some(c) = event.to_char() {
            self.push_char(c);
        }
    }

    /// Enqueue a character directly.
    pub fn push_char(&self, c: char) {
        lock(&self.state).enqueue(c as Word);
    }

    /// Buffered character count.
    pub fn len(&self) -> usize {
        lock(&self.state).buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The memory-mapped device half.
pub struct KeyboardDevice {
    base: Address,
    state: Arc<Mutex<KeyboardState>>,
}

impl KeyboardDevice {
    pub fn new() -> Self {
        KeyboardDevice {
            base: 0,
            state: Arc::new(Mutex::new(KeyboardState::default())),
        }
    }

    /// Handle for the host input side.
    pub fn handle(&self) -> KeyboardHandle {
        KeyboardHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for KeyboardDevice {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(state: &Mutex<KeyboardState>) -> MutexGuard<'_, KeyboardState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl IoDevice for KeyboardDevice {
    fn base(&self) -> Address {
        self.base
    }

    fn attach(&mut self, base: Address) {
        self.base = base;
    }

    fn size(&self) -> u32 {
        KEYBOARD_SIZE
    }

    fn name(&self) -> &'static str {
        "keyboard"
    }

    fn read_word(&self, addr: Address) -> Word {
        let state = lock(&self.state);
        match addr - self.base {
            OFFSET_FIRST_CHAR => state.first_char(),
            OFFSET_BUFFER_READY => state.ready(),
            OFFSET_CURRENT_CHAR => state.current_char(),
            _ => 0, // CONTROL is write-only
        }
    }

    fn write_word(&mut self, addr: Address, value: Word) {
        if addr - self.base == OFFSET_CONTROL {
            lock(&self.state).handle_command(value);
        }
    }

    fn offset_names(&self) -> &'static [(u32, &'static str)] {
        &[
            (OFFSET_FIRST_CHAR, "FIRST_CHAR"),
            (OFFSET_BUFFER_READY, "BUFFER_READY"),
            (OFFSET_CURRENT_CHAR, "CURRENT_CHAR"),
            (OFFSET_CONTROL, "CONTROL"),
        ]
    }
}
