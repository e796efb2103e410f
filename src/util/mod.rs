mod queue;
mod watch;

pub use queue::*;
pub use watch::*;
