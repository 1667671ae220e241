//! # signalk-protocol
//!
//! SignalK WebSocket stream message types and codec.
//!
//! This crate covers the client side of `/signalk/v1/stream`: the hello and
//! delta messages a server sends, and the subscribe request a client sends.

pub mod codec;
pub mod messages;

pub use codec::*;
pub use messages::*;
