pub mod carrier;
pub mod gateway;

pub use carrier::GhnCarrier;
pub use gateway::QrGateway;
