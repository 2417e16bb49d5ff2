pub mod common;
pub mod container;
pub mod context;
pub mod layout_engine;
pub mod model;
pub mod sys;

pub use container::{Collaborators, WindowNodeContainer, WmError, WmResult};
pub use context::ServerContext;
