//! Registry configuration

use std::time::Duration;

/// Configuration options for the connection registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Capacity of each connection's outbound payload queue
    ///
    /// A connection whose queue is full at broadcast time is treated as a
    /// slow consumer and disconnected rather than buffered further.
    pub queue_capacity: usize,

    /// Deadline for writing a single frame to a connection's socket
    ///
    /// Enforced by the connection's write task; overrunning it closes the
    /// connection.
    pub send_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            send_timeout: Duration::from_secs(5),
        }
    }
}

impl RegistryConfig {
    /// Set the per-connection outbound queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the per-frame socket write deadline
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();

        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.send_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default()
            .queue_capacity(8)
            .send_timeout(Duration::from_millis(250));

        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.send_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_queue_capacity_floor() {
        // A zero-capacity queue could never accept a payload
        let config = RegistryConfig::default().queue_capacity(0);

        assert_eq!(config.queue_capacity, 1);
    }
}
