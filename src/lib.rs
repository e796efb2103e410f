//! An implementation of the Media over QUIC Transport (MoQT) protocol.
//!
//! MoQT is a pub/sub protocol over QUIC, designed for live media but generic
//! enough for any live data. This crate provides the wire codec for every
//! control and data frame plus the per-connection [session::Session] engine,
//! running on any WebTransport-like [transport::Session].
//!
//! The specification is a work in progress and will change.
//! See the [IETF draft](https://datatracker.ietf.org/doc/draft-ietf-moq-transport/) for updates.
mod coding;
mod error;
mod util;

pub mod data;
pub mod dejitter;
pub mod message;
pub mod serve;
pub mod session;
pub mod setup;
pub mod transport;

pub use coding::{Decode, DecodeError, Encode, EncodeError, Params, VarInt};
pub use error::MoqError;
