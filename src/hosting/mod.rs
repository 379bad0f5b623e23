mod casino;
mod dto;
mod server;
mod settings;
mod socket;

pub use casino::*;
pub use dto::*;
pub use server::*;
pub use settings::*;
pub use socket::*;
