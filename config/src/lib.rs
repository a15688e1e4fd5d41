//! Configuration objects shared by the handoff workspace.
//!
//! Every component receives its configuration explicitly at construction time. Nothing in this
//! crate caches values in process-wide state: callers load a configuration once with
//! [`load_config`] and pass the resulting values down.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{Config, LoadConfigError, load_config, load_config_from};
