//! Core functionalities.
mod agent;
mod buffer;
mod env;
mod policy;
mod step;
pub use agent::MetaAgent;
pub use buffer::MultiTaskBuffer;
pub use env::Env;
pub use policy::{ContextualPolicy, Policy};
pub use step::{Step, Trajectory, Transition};
