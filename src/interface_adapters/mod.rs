// Interface adapters: wire protocol, network session, HTTP clients and the
// terminal surface.

pub mod clients;
pub mod console;
pub mod input;
pub mod net;
pub mod protocol;

pub use net::{SessionConfig, SimSession};
