//! Timeout configuration for apilink transport operations.
//!
//! Timeouts are process-wide transport configuration: they are applied once
//! when the shared HTTP client is built and bound every dispatched call.
//! There is no per-call timeout override.

use std::time::Duration;

/// Timeout configuration for the underlying transport.
///
/// All values default to 10 seconds.
///
/// # Examples
///
/// ```rust
/// use apilink::ApiLinkTimeouts;
/// use std::time::Duration;
///
/// // Use defaults (recommended for most cases)
/// let timeouts = ApiLinkTimeouts::default();
///
/// // Custom timeouts for high-latency environments
/// let timeouts = ApiLinkTimeouts::builder()
///     .connection_timeout(Duration::from_secs(30))
///     .receive_timeout(Duration::from_secs(60))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ApiLinkTimeouts {
    /// Timeout for establishing connections (TCP + TLS handshake).
    /// Default: 10 seconds
    pub connection_timeout: Duration,

    /// Overall timeout for a request, from send to fully-received response.
    /// Default: 10 seconds
    pub receive_timeout: Duration,

    /// Timeout for writing data to the server. The HTTP transport has no
    /// distinct write timeout, so this is folded into the overall request
    /// deadline.
    /// Default: 10 seconds
    pub send_timeout: Duration,
}

impl Default for ApiLinkTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            receive_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(10),
        }
    }
}

impl ApiLinkTimeouts {
    /// Create a new builder for custom timeout configuration.
    pub fn builder() -> ApiLinkTimeoutsBuilder {
        ApiLinkTimeoutsBuilder::new()
    }

    /// Create timeouts optimized for fast local development.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(2),
            receive_timeout: Duration::from_secs(5),
            send_timeout: Duration::from_secs(2),
        }
    }
}

/// Builder for creating custom [`ApiLinkTimeouts`] configurations.
#[derive(Debug, Clone)]
pub struct ApiLinkTimeoutsBuilder {
    timeouts: ApiLinkTimeouts,
}

impl ApiLinkTimeoutsBuilder {
    fn new() -> Self {
        Self {
            timeouts: ApiLinkTimeouts::default(),
        }
    }

    /// Set the connection timeout (TCP + TLS handshake).
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connection_timeout = timeout;
        self
    }

    /// Set the overall receive timeout.
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.receive_timeout = timeout;
        self
    }

    /// Set the send timeout.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.send_timeout = timeout;
        self
    }

    /// Build the timeout configuration.
    pub fn build(self) -> ApiLinkTimeouts {
        self.timeouts
    }
}
