//! Serial ingestion pipeline: a device abstraction, a bounded
//! notification mailbox and a worker thread that feeds received bytes
//! to a protocol engine.

pub mod config;
pub mod device;
pub mod error;
pub mod notify;
pub mod transport;
pub mod worker;

pub use config::LinkConfig;
pub use device::{
    MockResetLine, MockSerialDevice, ResetLine, RxIndicate, SerialDevice, SerialPortDevice,
};
pub use error::{Error, Result};
pub use notify::{RxNotification, SharedDevice};
pub use transport::{LinkControl, LinkStats, SerialTransport};
pub use worker::InputProcessor;
