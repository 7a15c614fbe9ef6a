//! Asynchronous key source
//!
//! A background reader thread owns the platform input handle, decodes raw
//! input into [`Key`]s and queues them. The game thread only ever polls the
//! queue, so a slow frame never loses a key press and a blocked read never
//! stalls a frame.
//!
//! - `unix` - termios raw mode, `poll(2)` + byte decoder
//! - `windows` - console input records

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
use self::unix as platform;
#[cfg(windows)]
use self::windows as platform;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::keys::Key;

/// How long a single platform read may block before re-checking the stop flag
const READ_SLICE: Duration = Duration::from_millis(100);
/// Pause after a failed read before trying again
const ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// A blocking platform key reader, driven by the reader thread
pub trait RawInput: Send + 'static {
    /// Wait up to `timeout` for input and append any decoded keys to `out`.
    ///
    /// Returning with nothing appended is normal.
    fn read_keys(&mut self, timeout: Duration, out: &mut Vec<Key>) -> io::Result<()>;
}

/// Queue of keys filled by a background reader thread
pub struct KeySource {
    /// Running flag shared with the reader
    running: Arc<AtomicBool>,
    /// Reader thread handle
    reader_thread: Option<JoinHandle<()>>,
    /// Decoded keys, oldest first
    key_rx: Receiver<Key>,
    /// Saved console mode, restored on stop
    mode: Option<platform::ModeGuard>,
}

impl KeySource {
    /// Put the console into key-at-a-time mode and start reading stdin
    pub fn start() -> io::Result<Self> {
        let reader = platform::Reader::new()?;
        let mode = platform::ModeGuard::enable()?;
        let mut source = Self::spawn(reader);
        source.mode = mode;
        Ok(source)
    }

    /// Start a reader thread around any [`RawInput`]
    pub fn spawn<R: RawInput>(mut reader: R) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::channel::<Key>();

        let flag = running.clone();
        let reader_thread = thread::Builder::new()
            .name("key-reader".into())
            .spawn(move || {
                let mut keys = Vec::new();
                while flag.load(Ordering::SeqCst) {
                    if let Err(e) = reader.read_keys(READ_SLICE, &mut keys) {
                        debug!("key read failed: {}", e);
                        thread::sleep(ERROR_BACKOFF);
                        continue;
                    }
                    if !forward(&tx, &mut keys) {
                        break;
                    }
                }
                debug!("key reader stopped");
            });

        let reader_thread = match reader_thread {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("failed to spawn key reader: {}", e);
                running.store(false, Ordering::SeqCst);
                None
            }
        };

        Self {
            running,
            reader_thread,
            key_rx: rx,
            mode: None,
        }
    }

    /// A source with no reader thread, fed through the returned sender
    #[cfg(test)]
    pub fn detached() -> (Sender<Key>, Self) {
        let (tx, rx) = mpsc::channel();
        let source = Self {
            running: Arc::new(AtomicBool::new(false)),
            reader_thread: None,
            key_rx: rx,
            mode: None,
        };
        (tx, source)
    }

    /// Oldest queued key, waiting up to `timeout` for one to arrive
    pub fn poll(&self, timeout: Duration) -> Option<Key> {
        match self.key_rx.recv_timeout(timeout) {
            Ok(key) => Some(key),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                // Reader is gone; keep the caller's pacing
                thread::sleep(timeout);
                None
            }
        }
    }

    /// Oldest queued key without waiting
    pub fn try_key(&self) -> Option<Key> {
        self.key_rx.try_recv().ok()
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the reader and restore the console mode. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.reader_thread.take() {
            if handle.join().is_err() {
                warn!("key reader panicked");
            }
        }
        if let Some(mut mode) = self.mode.take() {
            mode.restore();
        }
    }
}

impl Drop for KeySource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Push decoded keys to the queue in order. False once the receiver is gone.
fn forward(tx: &Sender<Key>, keys: &mut Vec<Key>) -> bool {
    for key in keys.drain(..) {
        trace!(code = key.code(), "key queued");
        if tx.send(key).is_err() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays scripted batches, then idles
    struct Scripted {
        batches: VecDeque<io::Result<Vec<Key>>>,
    }

    impl RawInput for Scripted {
        fn read_keys(&mut self, timeout: Duration, out: &mut Vec<Key>) -> io::Result<()> {
            match self.batches.pop_front() {
                Some(Ok(keys)) => {
                    out.extend(keys);
                    Ok(())
                }
                Some(Err(e)) => Err(e),
                None => {
                    thread::sleep(timeout.min(Duration::from_millis(5)));
                    Ok(())
                }
            }
        }
    }

    fn collect(source: &KeySource, n: usize) -> Vec<Key> {
        let mut keys = Vec::new();
        while keys.len() < n {
            match source.poll(Duration::from_secs(2)) {
                Some(key) => keys.push(key),
                None => break,
            }
        }
        keys
    }

    #[test]
    fn test_keys_arrive_in_order() {
        let reader = Scripted {
            batches: VecDeque::from(vec![
                Ok(vec![Key::Up, Key::Char(b'a')]),
                Ok(vec![]),
                Ok(vec![Key::Enter]),
            ]),
        };
        let mut source = KeySource::spawn(reader);
        assert_eq!(collect(&source, 3), vec![Key::Up, Key::Char(b'a'), Key::Enter]);
        source.stop();
        assert!(!source.is_running());
    }

    #[test]
    fn test_read_error_is_not_fatal() {
        let reader = Scripted {
            batches: VecDeque::from(vec![
                Err(io::Error::new(io::ErrorKind::Other, "transient")),
                Ok(vec![Key::Escape]),
            ]),
        };
        let source = KeySource::spawn(reader);
        assert_eq!(collect(&source, 1), vec![Key::Escape]);
    }

    #[test]
    fn test_poll_times_out_without_keys() {
        let (_tx, source) = KeySource::detached();
        assert_eq!(source.poll(Duration::from_millis(10)), None);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut source = KeySource::spawn(Scripted { batches: VecDeque::new() });
        source.stop();
        source.stop();
        assert!(source.try_key().is_none());
    }

    #[test]
    fn test_detached_queue() {
        let (tx, source) = KeySource::detached();
        tx.send(Key::Left).unwrap();
        tx.send(Key::Right).unwrap();
        assert_eq!(source.try_key(), Some(Key::Left));
        assert_eq!(source.poll(Duration::from_millis(10)), Some(Key::Right));
    }
}
