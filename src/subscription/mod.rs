// WebSocket delivery sessions

pub mod manager;
pub mod protocol;

pub use manager::ConnectionManager;
pub use protocol::{ClientMessage, ErrorMessage, PositionUpdateMessage};

#[cfg(test)]
mod tests;
