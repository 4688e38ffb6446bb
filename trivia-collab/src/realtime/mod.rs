mod channels;
mod connection;
mod registry;

pub use channels::*;
pub use connection::*;
pub use registry::*;
