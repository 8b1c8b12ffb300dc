//! Operating-system primitives for the serial link: mutexes, counting
//! semaphores, bounded mailboxes and threads, all with tick-quantized
//! bounded waits.
//!
//! Handles are cheap clones over shared state. A handle can be invalid
//! (freshly nulled or deleted); blocking operations on an invalid handle
//! report [`TimedOut`] rather than panicking, so callers treat "gone"
//! and "nothing arrived" the same way.

pub mod error;
pub mod mailbox;
pub mod mutex;
pub mod semaphore;
pub mod thread;
pub mod tick;
pub mod timeout;

pub use error::SysError;
pub use mailbox::Mailbox;
pub use mutex::{Mutex, MutexGuard};
pub use semaphore::Semaphore;
pub use thread::{Thread, ThreadSpec};
pub use timeout::{TimedOut, Timeout};
