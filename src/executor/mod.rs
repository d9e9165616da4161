mod dispatch;
mod targets;

pub use dispatch::execute;
pub use targets::{QueryTarget, StatementKind};
