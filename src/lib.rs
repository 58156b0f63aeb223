pub mod config;
pub mod notify;
pub mod panel;
pub mod relay;
pub mod transport;
