//! The ingestion worker: one thread draining the notification mailbox.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use serlink_sys::{Mailbox, SysError, Thread, ThreadSpec, Timeout};

use crate::notify::RxNotification;
use crate::transport::StatsCells;

/// Protocol engine entry point for received bytes. Calls are strictly
/// sequential; a span is fully consumed before the next one arrives.
pub trait InputProcessor: Send {
    fn process(&mut self, data: &[u8]);
}

pub(crate) fn spawn(
    mailbox: Mailbox<RxNotification>,
    staging_size: usize,
    mut processor: Box<dyn InputProcessor>,
    stats: Arc<StatsCells>,
) -> Result<Thread, SysError> {
    Thread::spawn(ThreadSpec::new("serlink-rx"), move || {
        let mut staging = vec![0u8; staging_size];
        run(&mailbox, &mut staging, processor.as_mut(), &stats);
    })
}

/// Waits for a notification, reads the device, hands the span onward.
/// Runs until the mailbox is deleted; a timeout on an unbounded wait
/// has no other cause.
fn run(
    mailbox: &Mailbox<RxNotification>,
    staging: &mut [u8],
    processor: &mut dyn InputProcessor,
    stats: &StatsCells,
) {
    log::debug!("ingestion worker running");
    loop {
        let Ok((note, _)) = mailbox.get(Timeout::Forever) else {
            break;
        };

        let want = note.len.min(staging.len());
        let read = match note.device.lock().read(&mut staging[..want]) {
            Ok(n) => n,
            Err(err) => {
                log::warn!("device read failed: {err}");
                0
            }
        };

        if read > 0 {
            stats.bytes_ingested.fetch_add(read as u64, Ordering::Relaxed);
            processor.process(&staging[..read]);
        }
    }
    log::debug!("ingestion worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{MockSerialDevice, SerialDevice};
    use parking_lot::Mutex;

    struct Recorder {
        spans: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl InputProcessor for Recorder {
        fn process(&mut self, data: &[u8]) {
            self.spans.lock().push(data.to_vec());
        }
    }

    fn shared(device: MockSerialDevice) -> crate::notify::SharedDevice {
        Arc::new(Mutex::new(Box::new(device) as Box<dyn SerialDevice>))
    }

    #[test]
    fn drains_queued_notifications_then_stops() {
        let control = MockSerialDevice::new("mock0");
        control.inject_rx(b"abcd");
        control.inject_rx(b"ef");
        let device = shared(control.clone());

        let mut mailbox = Mailbox::new(4);
        assert!(mailbox.try_put(RxNotification {
            device: Arc::clone(&device),
            len: 4,
        }));
        assert!(mailbox.try_put(RxNotification { device, len: 2 }));

        let spans = Arc::new(Mutex::new(Vec::new()));
        let mut recorder = Recorder {
            spans: Arc::clone(&spans),
        };
        let consumer = mailbox.clone();
        mailbox.delete();

        let mut staging = vec![0u8; 4096];
        let stats = StatsCells::default();
        run(&consumer, &mut staging, &mut recorder, &stats);

        assert_eq!(*spans.lock(), vec![b"abcd".to_vec(), b"ef".to_vec()]);
        assert_eq!(stats.bytes_ingested.load(Ordering::Relaxed), 6);
    }

    #[test]
    fn empty_reads_dispatch_nothing() {
        let control = MockSerialDevice::new("mock0");
        let device = shared(control);

        let mut mailbox = Mailbox::new(4);
        // Claims bytes that never arrived.
        assert!(mailbox.try_put(RxNotification { device, len: 16 }));

        let spans = Arc::new(Mutex::new(Vec::new()));
        let mut recorder = Recorder {
            spans: Arc::clone(&spans),
        };
        let consumer = mailbox.clone();
        mailbox.delete();

        let mut staging = vec![0u8; 64];
        let stats = StatsCells::default();
        run(&consumer, &mut staging, &mut recorder, &stats);

        assert!(spans.lock().is_empty());
        assert_eq!(stats.bytes_ingested.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn oversized_claims_are_capped_by_the_staging_buffer() {
        let control = MockSerialDevice::new("mock0");
        control.inject_rx(&[0x55; 100]);
        let device = shared(control.clone());

        let mut mailbox = Mailbox::new(4);
        assert!(mailbox.try_put(RxNotification {
            device: Arc::clone(&device),
            len: 100,
        }));
        // Remainder shows up as a second notification.
        assert!(mailbox.try_put(RxNotification { device, len: 36 }));

        let spans = Arc::new(Mutex::new(Vec::new()));
        let mut recorder = Recorder {
            spans: Arc::clone(&spans),
        };
        let consumer = mailbox.clone();
        mailbox.delete();

        let mut staging = vec![0u8; 64];
        let stats = StatsCells::default();
        run(&consumer, &mut staging, &mut recorder, &stats);

        let spans = spans.lock();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].len(), 64);
        assert_eq!(spans[1].len(), 36);
        assert_eq!(stats.bytes_ingested.load(Ordering::Relaxed), 100);
    }
}
