use scpi_core::{SimulatedInstrument, Transport, TransportError};
use scpi_io::{InstrumentedTransport, TcpTransport};

/// Transport chosen per run: real socket or in-memory simulator.
pub enum Link {
    Tcp(InstrumentedTransport<TcpTransport>),
    Simulated(InstrumentedTransport<SimulatedInstrument>),
}

impl Transport for Link {
    fn write(&mut self, command: &str) -> Result<(), TransportError> {
        match self {
            Self::Tcp(t) => t.write(command),
            Self::Simulated(t) => t.write(command),
        }
    }

    fn query(&mut self, command: &str) -> Result<String, TransportError> {
        match self {
            Self::Tcp(t) => t.query(command),
            Self::Simulated(t) => t.query(command),
        }
    }

    fn close(&mut self) -> Result<(), TransportError> {
        match self {
            Self::Tcp(t) => t.close(),
            Self::Simulated(t) => t.close(),
        }
    }

    fn resource(&self) -> &str {
        match self {
            Self::Tcp(t) => t.resource(),
            Self::Simulated(t) => t.resource(),
        }
    }
}
