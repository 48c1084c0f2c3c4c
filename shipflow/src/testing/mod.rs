//! Test doubles for the engine: scripted actions, counting guards and
//! context fixtures.

mod mocks;

pub use mocks::{
    counting_guard, test_context, test_context_on_branch, FailNTimesAction, RecordingAction,
};
