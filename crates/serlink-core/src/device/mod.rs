//! Device control surface: the platform side of the serial link.

mod mock;
mod serial;

pub use mock::{MockResetLine, MockSerialDevice};
pub use serial::SerialPortDevice;

use crate::error::Result;

/// Callback a device fires when received bytes are ready, carrying the
/// pending byte count. Runs in the driver's context and must not block.
pub type RxIndicate = Box<dyn Fn(usize) + Send + Sync>;

/// Byte-level access to an open UART-style device.
pub trait SerialDevice: Send {
    /// Reads pending bytes into `buf`, returning how many arrived.
    /// Nothing pending is `Ok(0)`, not an error.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Writes `data`, returning how many bytes the driver accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Re-applies line speed without closing the device.
    fn set_baud_rate(&mut self, baud: u32) -> Result<()>;

    /// Installs or clears the receive indication. With `None` the
    /// device stays silent.
    fn set_rx_indicate(&mut self, indicate: Option<RxIndicate>) -> Result<()>;

    /// Device name for diagnostics.
    fn name(&self) -> &str;
}

/// Output line wired to the attached module's hardware reset pin.
pub trait ResetLine: Send {
    /// Drives the line to `high`, returning false if the write failed.
    fn set_level(&mut self, high: bool) -> bool;
}
