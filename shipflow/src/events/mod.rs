//! Event emission for observability.

mod sink;

pub use sink::{CollectingSink, EventSink, LoggingSink, NoOpSink, RunEvent};
