mod batcher;
mod config;
mod connection;
#[cfg(feature = "server")]
mod console;
mod coordinator;
mod event;
mod message;
mod parse;
mod participant;
mod prompt;
mod session;
mod status;
mod timer;
mod trace;

pub use batcher::*;
pub use config::*;
pub use connection::*;
#[cfg(feature = "server")]
pub use console::*;
pub use coordinator::*;
pub use event::*;
pub use message::*;
pub use parse::*;
pub use participant::*;
pub use prompt::*;
pub use session::*;
pub use status::*;
pub use timer::*;
pub use trace::*;

#[cfg(test)]
mod tests;
