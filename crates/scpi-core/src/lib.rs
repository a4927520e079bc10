pub mod command;
pub mod descriptor;
pub mod devices;
pub mod error;
pub mod instrument;
pub mod list;
pub mod profile;
pub mod profiles;
pub mod response;
#[cfg(all(test, feature = "simulation"))]
mod setpoint_proptest;
#[cfg(feature = "simulation")]
pub mod sim;
pub mod state;
pub mod transport;

pub use command::Command;
pub use descriptor::{Bounds, ParameterDescriptor, Range, Sentinel, SetpointDecision, ValueKind};
pub use devices::TimeUnit;
pub use error::{Expected, InstrumentError, InvalidInput, ParseError, Result, TransportError};
pub use instrument::Instrument;
pub use list::ListProgram;
pub use profile::{DeviceProfile, InitialSetpoint, OutputCommands, SetpointValue};
#[cfg(feature = "simulation")]
pub use sim::{SimHandle, SimulatedInstrument};
pub use state::{CachedState, Reading};
pub use transport::Transport;
