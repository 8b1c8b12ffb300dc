use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::device::{ResetLine, RxIndicate, SerialDevice};
use crate::error::{Error, Result};

#[derive(Default)]
struct MockState {
    rx: VecDeque<u8>,
    written: Vec<u8>,
    baud_changes: Vec<u32>,
    /// One entry per `set_rx_indicate` call: true for install, false
    /// for clear.
    indicate_calls: Vec<bool>,
    indicate: Option<RxIndicate>,
    fail_writes: bool,
}

/// In-memory serial device for tests and simulators.
///
/// Clones share state, so a clone kept outside the transport can
/// inject receive traffic and inspect writes. `inject_rx` fires the
/// installed indication synchronously, standing in for the receive
/// interrupt.
#[derive(Clone)]
pub struct MockSerialDevice {
    name: String,
    state: Arc<Mutex<MockState>>,
}

impl MockSerialDevice {
    pub fn new(name: impl Into<String>) -> Self {
        MockSerialDevice {
            name: name.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Queues `data` as received bytes and fires the indication with
    /// the new byte count, in the caller's context.
    pub fn inject_rx(&self, data: &[u8]) {
        let mut state = self.state.lock();
        state.rx.extend(data.iter().copied());
        if let Some(indicate) = state.indicate.as_ref() {
            indicate(data.len());
        }
    }

    /// Fires the indication with an arbitrary claimed count without
    /// queueing any bytes. For exercising short and empty reads.
    pub fn indicate(&self, claimed: usize) {
        let state = self.state.lock();
        if let Some(indicate) = state.indicate.as_ref() {
            indicate(claimed);
        }
    }

    /// Everything written to the device so far.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().written.clone()
    }

    pub fn clear_written(&self) {
        self.state.lock().written.clear();
    }

    /// Baud rates applied via `set_baud_rate`, in order.
    pub fn baud_changes(&self) -> Vec<u32> {
        self.state.lock().baud_changes.clone()
    }

    /// Install/clear history of the receive indication.
    pub fn indicate_calls(&self) -> Vec<bool> {
        self.state.lock().indicate_calls.clone()
    }

    pub fn has_indicate(&self) -> bool {
        self.state.lock().indicate.is_some()
    }

    /// Makes subsequent writes fail with a broken-pipe error.
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Received bytes not yet read by the consumer.
    pub fn pending_rx(&self) -> usize {
        self.state.lock().rx.len()
    }
}

impl SerialDevice for MockSerialDevice {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.state.lock();
        let mut count = 0;
        for slot in buf.iter_mut() {
            match state.rx.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }
        state.written.extend_from_slice(data);
        Ok(data.len())
    }

    fn set_baud_rate(&mut self, baud: u32) -> Result<()> {
        self.state.lock().baud_changes.push(baud);
        Ok(())
    }

    fn set_rx_indicate(&mut self, indicate: Option<RxIndicate>) -> Result<()> {
        let mut state = self.state.lock();
        state.indicate_calls.push(indicate.is_some());
        state.indicate = indicate;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Records the levels driven onto a reset pin.
#[derive(Clone, Default)]
pub struct MockResetLine {
    levels: Arc<Mutex<Vec<bool>>>,
}

impl MockResetLine {
    pub fn new() -> Self {
        MockResetLine::default()
    }

    pub fn levels(&self) -> Vec<bool> {
        self.levels.lock().clone()
    }
}

impl ResetLine for MockResetLine {
    fn set_level(&mut self, high: bool) -> bool {
        self.levels.lock().push(high);
        true
    }
}
