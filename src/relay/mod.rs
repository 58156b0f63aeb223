pub mod cache;
pub mod channel;
pub mod codec;
pub mod error;
pub mod model;
pub mod observer;
pub mod router;
pub mod service;

#[cfg(test)]
pub mod testing;
