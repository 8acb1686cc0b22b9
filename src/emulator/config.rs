/// Engine configuration

use crate::protocol::constants::{DEFAULT_HOST, DEFAULT_PORT};
use std::time::Duration;

/// Connection and pacing settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorConfig {
    /// Device host name or address
    pub host: String,
    /// Primary port; the identity table is served on `port + 1`
    pub port: u16,
    /// Longest wait for a message before sending a keep-alive while idle
    pub keepalive_interval: Duration,
    /// Zero bytes sent after the NOP frame while a track is being received
    pub busy_filler_len: usize,
    /// Size of each socket read
    pub read_buffer_len: usize,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            keepalive_interval: Duration::from_millis(250),
            busy_filler_len: 4096 - 2,
            read_buffer_len: 4096,
        }
    }
}

impl EmulatorConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the device host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    /// Set the primary port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the idle keep-alive interval
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Set the filler length used while receiving
    pub fn busy_filler_len(mut self, len: usize) -> Self {
        self.busy_filler_len = len;
        self
    }

    /// Set the socket read size
    pub fn read_buffer_len(mut self, len: usize) -> Self {
        self.read_buffer_len = len.max(1);
        self
    }

    /// Primary link address
    pub fn primary_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Identity table port
    pub fn identity_port(&self) -> u16 {
        self.port.wrapping_add(1)
    }

    /// Identity table address
    pub fn identity_addr(&self) -> String {
        format!("{}:{}", self.host, self.identity_port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EmulatorConfig::default();
        assert_eq!(config.primary_addr(), "192.168.4.1:4500");
        assert_eq!(config.identity_addr(), "192.168.4.1:4501");
        assert_eq!(config.keepalive_interval, Duration::from_millis(250));
        assert_eq!(config.busy_filler_len, 4094);
    }

    #[test]
    fn test_builder() {
        let config = EmulatorConfig::new()
            .host("phloppy.local")
            .port(6000)
            .read_buffer_len(0)
            .keepalive_interval(Duration::from_millis(10));
        assert_eq!(config.identity_addr(), "phloppy.local:6001");
        assert_eq!(config.read_buffer_len, 1);
        assert_eq!(config.keepalive_interval, Duration::from_millis(10));
    }
}
