//! The initial frames exchanged to establish a session.
//!
//! The client sends [Client] with its supported versions and role.
//! The server responds with [Server], selecting a single version.
mod client;
mod role;
mod server;
mod version;

pub use client::*;
pub use role::*;
pub use server::*;
pub use version::*;
