use serlink_sys::SysError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The named device is missing, failed to open, or the link is
    /// closed.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// An OS primitive could not be created during initialization.
    #[error(transparent)]
    Sys(#[from] SysError),

    /// Serial driver error.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error talking to the device.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_device_names_itself() {
        let err = Error::DeviceUnavailable("uart4".into());
        assert_eq!(err.to_string(), "device unavailable: uart4");
    }

    #[test]
    fn sys_errors_convert_transparently() {
        let sys = SysError::ResourceExhausted {
            what: "thread",
            source: std::io::Error::new(std::io::ErrorKind::Other, "no more threads"),
        };
        let err = Error::from(sys);
        assert!(err.to_string().contains("thread"));
    }
}
