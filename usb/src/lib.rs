pub use rusb;
pub mod commands;
pub mod device;
pub mod endpoint;
pub mod error;
pub mod session;
pub mod settings;
pub mod transport;
