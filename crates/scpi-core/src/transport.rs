use crate::error::TransportError;

/// Request/response channel to one instrument.
///
/// Implementations block until the instrument answers or the channel times
/// out. A transport is owned by exactly one session and is never shared.
pub trait Transport: Send {
    /// Send a command that produces no response.
    fn write(&mut self, command: &str) -> Result<(), TransportError>;

    /// Send a query and return its single-line response without the
    /// terminator.
    fn query(&mut self, command: &str) -> Result<String, TransportError>;

    /// Release the channel. Further calls return [`TransportError::Closed`].
    fn close(&mut self) -> Result<(), TransportError>;

    /// Human-readable resource name, used in logs.
    fn resource(&self) -> &str;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, command: &str) -> Result<(), TransportError> {
        (**self).write(command)
    }

    fn query(&mut self, command: &str) -> Result<String, TransportError> {
        (**self).query(command)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }

    fn resource(&self) -> &str {
        (**self).resource()
    }
}
