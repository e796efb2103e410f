//! The delivery model between the session and the application.
//!
//! The session's subscriber half writes received objects into a [Track];
//! the application reads them back out, object by object and chunk by chunk.
mod error;
mod object;
mod track;

pub use error::*;
pub use object::*;
pub use track::*;
