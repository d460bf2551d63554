//! Strategy text backends

mod command;

pub use command::{CommandBackendError, CommandStrategyBackend};
