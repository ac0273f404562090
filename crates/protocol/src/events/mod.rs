//! Wire event definitions for the browser protocol.
//!
//! Every websocket text frame carries one JSON envelope of the form
//! `{"event": <name>, "data": <payload>}`, the event/payload pairs the
//! browser client exchanges with the relay.

mod client;
mod server;

pub use client::*;
pub use server::*;
