use std::sync::Arc;

use parking_lot::Mutex;

use crate::device::SerialDevice;

/// Shared handle to the open device. The lock serializes device access
/// between the worker and control-path callers.
pub type SharedDevice = Arc<Mutex<Box<dyn SerialDevice>>>;

/// "At least `len` bytes are waiting on `device`."
///
/// Created in the indication context, consumed exactly once by the
/// worker. It carries no payload; the bytes stay in the device until
/// the worker reads them.
pub struct RxNotification {
    pub device: SharedDevice,
    pub len: usize,
}
