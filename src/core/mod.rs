pub mod broadcast;
pub mod client;
pub mod orchestrator;
pub mod retry;

pub use crate::domain::ports::{Lookup, StreamSource};
pub use crate::utils::error::{ErrorKind, RemoteError};
