use serialport::{DataBits, FlowControl, Parity, StopBits};

/// Configuration for a serial link and its ingestion pipeline.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub device: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Receive notifications queued before the producer starts
    /// dropping.
    pub mailbox_capacity: usize,
    /// Worker staging buffer; a single device read never exceeds this.
    pub staging_size: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            device: String::new(),
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            mailbox_capacity: 256,
            staging_size: 4096,
        }
    }
}

impl LinkConfig {
    pub fn new(device: impl Into<String>, baud_rate: u32) -> Self {
        LinkConfig {
            device: device.into(),
            baud_rate,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_8n1_at_115200() {
        let config = LinkConfig::default();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.mailbox_capacity, 256);
        assert_eq!(config.staging_size, 4096);
    }

    #[test]
    fn new_overrides_device_and_baud_only() {
        let config = LinkConfig::new("/dev/ttyUSB0", 921_600);
        assert_eq!(config.device, "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 921_600);
        assert_eq!(config.parity, Parity::None);
    }
}
