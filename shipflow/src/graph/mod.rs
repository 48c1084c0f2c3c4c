//! The stage graph: declarative pipeline shape plus its executor.

mod builder;
mod executor;
mod guard;
mod node;
mod report;

pub use builder::StageGraph;
pub use executor::GraphExecutor;
pub use guard::Guard;
pub use node::{LeafSpec, NodeBody, StageNode};
pub use report::{RunReport, StageReport};
