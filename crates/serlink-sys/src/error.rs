use std::io;

use thiserror::Error;

/// Failure to create an OS-backed primitive.
///
/// Creation failures are fatal to whatever initialization requested the
/// primitive; callers propagate them instead of retrying.
#[derive(Debug, Error)]
pub enum SysError {
    #[error("out of resources creating {what}: {source}")]
    ResourceExhausted {
        what: &'static str,
        #[source]
        source: io::Error,
    },
}
