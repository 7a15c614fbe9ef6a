//! Windows console input
//!
//! Keys are read as console input records. Special keys carry no character
//! and are resolved by scan code.

use std::io;
use std::time::Duration;

use crossterm::terminal;
use ::windows::Win32::Foundation::{HANDLE, WAIT_OBJECT_0};
use ::windows::Win32::System::Console::{
    GetConsoleMode, GetStdHandle, ReadConsoleInputW, SetConsoleMode, CONSOLE_MODE,
    ENABLE_VIRTUAL_TERMINAL_PROCESSING, INPUT_RECORD, KEY_EVENT, STD_INPUT_HANDLE,
    STD_OUTPUT_HANDLE,
};
use ::windows::Win32::System::Threading::WaitForSingleObject;
use tracing::{debug, warn};

use super::RawInput;
use crate::core::keys::{decode_console_key, Key};

/// Raw console mode plus VT output processing, undone on restore or drop
pub struct ModeGuard {
    raw: bool,
    output: HANDLE,
    original_output: Option<CONSOLE_MODE>,
}

// Console handles may be used from any thread
unsafe impl Send for ModeGuard {}

impl ModeGuard {
    pub fn enable() -> io::Result<Option<Self>> {
        terminal::enable_raw_mode()?;

        let mut guard = Self {
            raw: true,
            output: HANDLE::default(),
            original_output: None,
        };
        unsafe {
            let handle = GetStdHandle(STD_OUTPUT_HANDLE).unwrap_or_default();
            let mut mode = CONSOLE_MODE(0);
            if GetConsoleMode(handle, &mut mode).is_ok() {
                let vt = CONSOLE_MODE(mode.0 | ENABLE_VIRTUAL_TERMINAL_PROCESSING.0);
                match SetConsoleMode(handle, vt) {
                    Ok(_) => {
                        guard.output = handle;
                        guard.original_output = Some(mode);
                    }
                    Err(e) => warn!("failed to enable VT output: {:?}", e),
                }
            } else {
                debug!("stdout is not a console");
            }
        }
        Ok(Some(guard))
    }

    pub fn restore(&mut self) {
        if let Some(mode) = self.original_output.take() {
            unsafe {
                let _ = SetConsoleMode(self.output, mode);
            }
        }
        if !std::mem::take(&mut self.raw) {
            return;
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("failed to restore console mode: {}", e);
        }
    }
}

impl Drop for ModeGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Reads key events from the console input buffer
pub struct Reader {
    input: HANDLE,
    records: [INPUT_RECORD; 16],
}

unsafe impl Send for Reader {}

impl Reader {
    pub fn new() -> io::Result<Self> {
        let input = unsafe { GetStdHandle(STD_INPUT_HANDLE) }.map_err(io::Error::from)?;
        Ok(Self {
            input,
            records: [INPUT_RECORD::default(); 16],
        })
    }
}

impl RawInput for Reader {
    fn read_keys(&mut self, timeout: Duration, out: &mut Vec<Key>) -> io::Result<()> {
        unsafe {
            if WaitForSingleObject(self.input, timeout.as_millis() as u32) != WAIT_OBJECT_0 {
                return Ok(());
            }

            let mut count = 0u32;
            ReadConsoleInputW(self.input, &mut self.records, &mut count).map_err(io::Error::from)?;

            for record in &self.records[..count as usize] {
                if record.EventType as u32 != KEY_EVENT {
                    continue;
                }
                let event = record.Event.KeyEvent;
                if !event.bKeyDown.as_bool() {
                    continue;
                }
                if let Some(key) = decode_console_key(event.uChar.UnicodeChar, event.wVirtualScanCode) {
                    for _ in 0..event.wRepeatCount.max(1) {
                        out.push(key);
                    }
                }
            }
        }
        Ok(())
    }
}
