mod answers;
mod choice;
mod error;
mod plugin;
mod question;
mod question_args;
mod question_kind;
mod renderer;

pub use answers::*;
pub use choice::*;
pub use error::*;
pub use plugin::*;
pub use question::*;
pub use question_args::*;
pub use question_kind::*;
pub use renderer::*;
