mod channel;
mod event;
mod pipe;

pub use channel::*;
pub use event::*;
pub use pipe::*;
