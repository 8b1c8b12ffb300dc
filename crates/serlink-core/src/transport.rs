use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serlink_sys::{Mailbox, Thread};

use crate::config::LinkConfig;
use crate::device::{ResetLine, RxIndicate, SerialDevice, SerialPortDevice};
use crate::error::{Error, Result};
use crate::notify::{RxNotification, SharedDevice};
use crate::worker::{self, InputProcessor};

#[derive(Default)]
pub(crate) struct StatsCells {
    pub(crate) notified: AtomicU64,
    pub(crate) dropped: AtomicU64,
    pub(crate) bytes_ingested: AtomicU64,
}

/// Counters published by the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Receive indications observed.
    pub notified: u64,
    /// Indications discarded because the mailbox was full.
    pub dropped: u64,
    /// Bytes handed to the input processor.
    pub bytes_ingested: u64,
}

/// Transmit and reset surface handed to the protocol engine.
pub trait LinkControl: Send + Sync {
    /// Sends `data` to the attached module, returning the number of
    /// bytes written. Anything short of a full write reports 0.
    fn send(&self, data: &[u8]) -> usize;

    /// Drives the module's hardware reset line, returning whether the
    /// level was applied.
    fn reset(&self, asserted: bool) -> bool;
}

/// Owner of the serial device, the notification mailbox and the
/// ingestion worker.
///
/// Construction brings the pipeline up in a fixed order: the device is
/// configured with indications silenced, the mailbox is created, the
/// worker is started, and only then is the receive indication
/// installed. Nothing can fire into a mailbox that does not exist yet.
pub struct SerialTransport {
    device: Option<SharedDevice>,
    mailbox: Mailbox<RxNotification>,
    worker: Option<Thread>,
    reset_line: Option<Mutex<Box<dyn ResetLine>>>,
    stats: Arc<StatsCells>,
}

impl SerialTransport {
    /// Opens the named serial device and starts the ingestion pipeline.
    pub fn open(config: LinkConfig, processor: Box<dyn InputProcessor>) -> Result<Self> {
        let device = SerialPortDevice::open(&config)?;
        Self::open_with(config, Box::new(device), None, processor)
    }

    /// Builds the pipeline on an already-acquired device. This is the
    /// entry point for tests and simulators; [`SerialTransport::open`]
    /// is the hardware path.
    pub fn open_with(
        config: LinkConfig,
        mut device: Box<dyn SerialDevice>,
        reset_line: Option<Box<dyn ResetLine>>,
        processor: Box<dyn InputProcessor>,
    ) -> Result<Self> {
        let device_name = device.name().to_string();

        // The device must stay silent until the mailbox it feeds exists.
        device.set_rx_indicate(None)?;

        let device: SharedDevice = Arc::new(Mutex::new(device));
        let mailbox = Mailbox::new(config.mailbox_capacity);
        let stats = Arc::new(StatsCells::default());

        let worker = worker::spawn(
            mailbox.clone(),
            config.staging_size,
            processor,
            Arc::clone(&stats),
        )?;

        let mut transport = SerialTransport {
            device: Some(device),
            mailbox,
            worker: Some(worker),
            reset_line: reset_line.map(Mutex::new),
            stats,
        };

        if let Err(err) = transport.install_indication() {
            transport.close();
            return Err(err);
        }

        log::info!("serial link up on {} ({} baud)", device_name, config.baud_rate);
        Ok(transport)
    }

    /// Arms the receive indication. The callback runs in the device's
    /// context: it never blocks, and a full mailbox means the
    /// notification is counted, logged and discarded.
    fn install_indication(&self) -> Result<()> {
        let Some(device) = self.device.as_ref() else {
            return Err(Error::DeviceUnavailable("link closed".into()));
        };

        let mailbox = self.mailbox.clone();
        let stats = Arc::clone(&self.stats);
        // Weak, or the device would keep itself alive through its own
        // callback.
        let weak_device = Arc::downgrade(device);

        let indicate: RxIndicate = Box::new(move |len| {
            if len == 0 {
                return;
            }
            let Some(device) = weak_device.upgrade() else {
                return;
            };
            stats.notified.fetch_add(1, Ordering::Relaxed);
            if !mailbox.try_put(RxNotification { device, len }) {
                stats.dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!("rx mailbox full, dropped notification for {len} bytes");
            }
        });

        device.lock().set_rx_indicate(Some(indicate))
    }

    /// Sends raw bytes to the module. Returns the number of bytes
    /// written; 0 when the link is closed or the write came up short.
    pub fn send(&self, data: &[u8]) -> usize {
        let Some(device) = self.device.as_ref() else {
            return 0;
        };
        if data.is_empty() {
            return 0;
        }
        match device.lock().write(data) {
            Ok(n) if n == data.len() => n,
            Ok(n) => {
                log::warn!("short write: {n} of {} bytes", data.len());
                0
            }
            Err(err) => {
                log::warn!("send failed: {err}");
                0
            }
        }
    }

    /// Drives the module's hardware reset line. False when no line is
    /// wired or the write failed.
    pub fn reset(&self, asserted: bool) -> bool {
        match self.reset_line.as_ref() {
            Some(line) => line.lock().set_level(asserted),
            None => false,
        }
    }

    /// Re-applies line speed on the open device.
    pub fn set_baud_rate(&self, baud: u32) -> Result<()> {
        let Some(device) = self.device.as_ref() else {
            return Err(Error::DeviceUnavailable("link closed".into()));
        };
        device.lock().set_baud_rate(baud)?;
        log::info!("baud rate changed to {baud}");
        Ok(())
    }

    pub fn stats(&self) -> LinkStats {
        LinkStats {
            notified: self.stats.notified.load(Ordering::Relaxed),
            dropped: self.stats.dropped.load(Ordering::Relaxed),
            bytes_ingested: self.stats.bytes_ingested.load(Ordering::Relaxed),
        }
    }

    /// Tears the pipeline down: silences the device, closes the mailbox
    /// (which stops the worker once it drains) and abandons the worker
    /// thread without waiting for it. Safe to call repeatedly.
    pub fn close(&mut self) {
        let Some(device) = self.device.take() else {
            return;
        };

        if let Err(err) = device.lock().set_rx_indicate(None) {
            log::debug!("failed to silence device on close: {err}");
        }
        self.mailbox.delete();
        if let Some(mut worker) = self.worker.take() {
            worker.terminate();
        }
        log::info!("serial link closed");
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }
}

impl LinkControl for SerialTransport {
    fn send(&self, data: &[u8]) -> usize {
        SerialTransport::send(self, data)
    }

    fn reset(&self, asserted: bool) -> bool {
        SerialTransport::reset(self, asserted)
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}
