use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serialport::SerialPort;
use serlink_sys::{Thread, ThreadSpec};

use crate::config::LinkConfig;
use crate::device::{RxIndicate, SerialDevice};
use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// A real serial port.
///
/// `serialport` exposes no receive interrupt, so the indication is
/// synthesized by a monitor thread watching the driver's pending-byte
/// count. Reporting is level-triggered: every poll that observes a
/// nonzero count fires the indication, drained or not since the last
/// one. Consumers tolerate duplicates because a zero-byte read
/// dispatches nothing.
pub struct SerialPortDevice {
    port: Box<dyn SerialPort>,
    name: String,
    monitor: Option<Monitor>,
}

struct Monitor {
    stop: Arc<AtomicBool>,
    thread: Thread,
}

impl SerialPortDevice {
    /// Opens and configures the device named by `config`. The receive
    /// indication starts out uninstalled.
    pub fn open(config: &LinkConfig) -> Result<Self> {
        let port = serialport::new(&config.device, config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .flow_control(config.flow_control)
            .timeout(Duration::from_millis(50))
            .open()
            .map_err(|err| match err.kind() {
                serialport::ErrorKind::NoDevice => {
                    Error::DeviceUnavailable(config.device.clone())
                }
                _ => Error::Serial(err),
            })?;
        log::info!("opened {} at {} baud", config.device, config.baud_rate);
        Ok(SerialPortDevice {
            port,
            name: config.device.clone(),
            monitor: None,
        })
    }

    fn stop_monitor(&mut self) {
        if let Some(mut monitor) = self.monitor.take() {
            monitor.stop.store(true, Ordering::Relaxed);
            monitor.thread.terminate();
        }
    }
}

impl SerialDevice for SerialPortDevice {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(err)
                if err.kind() == io::ErrorKind::TimedOut
                    || err.kind() == io::ErrorKind::WouldBlock =>
            {
                Ok(0)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let written = self.port.write(data)?;
        self.port.flush()?;
        Ok(written)
    }

    fn set_baud_rate(&mut self, baud: u32) -> Result<()> {
        self.port.set_baud_rate(baud)?;
        Ok(())
    }

    fn set_rx_indicate(&mut self, indicate: Option<RxIndicate>) -> Result<()> {
        self.stop_monitor();
        let Some(indicate) = indicate else {
            return Ok(());
        };

        let watcher = self.port.try_clone()?;
        let stop = Arc::new(AtomicBool::new(false));
        let thread = {
            let stop = Arc::clone(&stop);
            Thread::spawn(ThreadSpec::new("serlink-devmon"), move || {
                watch_pending(move || watcher.bytes_to_read(), indicate, stop)
            })?
        };
        self.monitor = Some(Monitor { stop, thread });
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for SerialPortDevice {
    fn drop(&mut self) {
        self.stop_monitor();
    }
}

/// Hosted stand-in for the receive interrupt: any nonzero pending
/// count is reported on every poll until the reader drains it.
fn watch_pending<F>(pending: F, indicate: RxIndicate, stop: Arc<AtomicBool>)
where
    F: Fn() -> serialport::Result<u32>,
{
    while !stop.load(Ordering::Relaxed) {
        match pending() {
            Ok(n) if n > 0 => indicate(n as usize),
            Ok(_) => {}
            Err(err) => {
                log::debug!("rx monitor stopping: {err}");
                break;
            }
        }
        thread::sleep(POLL_INTERVAL);
    }
}
