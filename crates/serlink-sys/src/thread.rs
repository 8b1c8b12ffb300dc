//! Thread creation in the style of an RTOS port: named, stack-sized,
//! optionally prioritized, running as soon as it is created.

use std::thread::{self, JoinHandle};

use crate::SysError;

/// Default worker stack. Generous compared to the microcontroller ports
/// this layer imitates; hosted frames are larger.
pub const DEFAULT_STACK_SIZE: usize = 64 * 1024;
pub const DEFAULT_PRIORITY: u8 = 10;

/// Spawn parameters. `priority` is advisory on a hosted target.
#[derive(Debug, Clone)]
pub struct ThreadSpec {
    pub name: String,
    pub stack_size: usize,
    pub priority: u8,
}

impl ThreadSpec {
    pub fn new(name: impl Into<String>) -> Self {
        ThreadSpec {
            name: name.into(),
            stack_size: DEFAULT_STACK_SIZE,
            priority: DEFAULT_PRIORITY,
        }
    }

    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}

/// Handle to a spawned thread.
pub struct Thread {
    handle: Option<JoinHandle<()>>,
}

impl Thread {
    /// Spawns `entry` immediately. Creation is the only fallible step.
    pub fn spawn<F>(spec: ThreadSpec, entry: F) -> Result<Thread, SysError>
    where
        F: FnOnce() + Send + 'static,
    {
        if spec.priority != DEFAULT_PRIORITY {
            log::debug!(
                "thread {:?}: priority {} is advisory on this target",
                spec.name,
                spec.priority
            );
        }
        let handle = thread::Builder::new()
            .name(spec.name)
            .stack_size(spec.stack_size)
            .spawn(entry)
            .map_err(|source| SysError::ResourceExhausted {
                what: "thread",
                source,
            })?;
        Ok(Thread {
            handle: Some(handle),
        })
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// Abandons the thread without waiting for it, the hosted analog of
    /// forced termination. In-flight work is not drained.
    pub fn terminate(&mut self) {
        self.handle.take();
    }

    /// Waits for the thread to finish.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Gives up the rest of the caller's timeslice.
pub fn yield_now() {
    thread::yield_now();
}
