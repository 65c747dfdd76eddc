//! Memory-mapped millisecond timer
//!
//! CURRENT_TIME counts milliseconds since construction or the last reset,
//! modulo 2^32. A background thread ticks the compare-match check at roughly
//! 1 kHz and exits once the device is dropped; hosts driving their own
//! cadence can call [`TimerDevice::tick`] as well.
//!
//! Register map (16 bytes):
//!
//! | offset | register      | access | contents                               |
//! |--------|---------------|--------|----------------------------------------|
//! | +0x00  | CURRENT_TIME  | RO     | monotonic millisecond counter          |
//! | +0x04  | COMPARE_VALUE | RW     | match value latching STATUS            |
//! | +0x08  | STATUS        | RO     | 1 after a compare match until cleared  |
//! | +0x0C  | CONTROL       | WO     | 1 clear STATUS, 2 reset time + STATUS  |

use super::IoDevice;
use neptune_spec::{Address, Word};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

pub const TIMER_SIZE: u32 = 16;

pub const OFFSET_CURRENT_TIME: u32 = 0;
pub const OFFSET_COMPARE_VALUE: u32 = 4;
pub const OFFSET_STATUS: u32 = 8;
pub const OFFSET_CONTROL: u32 = 12;

const CTRL_CLEAR_STATUS: Word = 1;
const CTRL_RESET: Word = 2;

const TICK_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct TimerState {
    epoch: Instant,
    compare: Word,
    status: bool,
}

impl TimerState {
    fn new() -> Self {
        TimerState {
            epoch: Instant::now(),
            compare: 0,
            status: false,
        }
    }

    fn current_time(&self) -> Word {
        self.epoch.elapsed().as_millis() as Word
    }

    fn tick(&mut self) {
        if self.current_time() == self.compare {
            self.status = true;
        }
    }

    fn handle_command(&mut self, command: Word) {
        match command {
            CTRL_CLEAR_STATUS => self.status = false,
            CTRL_RESET => {
                self.epoch = Instant::now();
                self.status = false;
            }
            _ => {}
        }
    }
}

pub struct TimerDevice {
    base: Address,
    state: Arc<Mutex<TimerState>>,
}

impl TimerDevice {
    pub fn new() -> Self {
        let state = Arc::new(Mutex::new(TimerState::new()));
        spawn_ticker(Arc::downgrade(&state));
        TimerDevice { base: 0, state }
    }

    /// Run one compare-match check. The background ticker calls this at
    /// ~1 kHz; hosts with their own frame loop may call it directly.
    pub fn tick(&self) {
        lock(&self.state).tick();
    }
}

impl Default for TimerDevice {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_ticker(state: Weak<Mutex<TimerState>>) {
    std::thread::spawn(move || loop {
        std::thread::sleep(TICK_INTERVAL);
        match state.upgrade() {
            Some(state) => lock(&state).tick(),
            None => break,
        }
    });
}

fn lock(state: &Mutex<TimerState>) -> MutexGuard<'_, TimerState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl IoDevice for TimerDevice {
    fn base(&self) -> Address {
        self.base
    }

    fn attach(&mut self, base: Address) {
        self.base = base;
    }

    fn size(&self) -> u32 {
        TIMER_SIZE
    }

    fn name(&self) -> &'static str {
        "timer"
    }

    fn read_word(&self, addr: Address) -> Word {
        let state = lock(&self.state);
        match addr - self.base {
            OFFSET_CURRENT_TIME => state.current_time(),
            OFFSET_COMPARE_VALUE => state.compare,
            OFFSET_STATUS => state.status as Word,
            _ => 0, // CONTROL is write-only
        }
    }

    fn write_word(&mut self, addr: Address, value: Word) {
        let mut state = lock(&self.state);
        match addr - self.base {
            OFFSET_COMPARE_VALUE => state.compare = value,
            OFFSET_CONTROL => state.handle_command(value),
            _ => {}
        }
    }

    fn offset_names(&self) -> &'static [(u32, &'static str)] {
        &[
            (OFFSET_CURRENT_TIME, "CURRENT_TIME"),
            (OFFSET_COMPARE_VALUE, "COMPARE_VALUE"),
            (OFFSET_STATUS, "STATUS"),
            (OFFSET_CONTROL, "CONTROL"),
        ]
    }
}
