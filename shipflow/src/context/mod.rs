//! Run context: build identity, image coordinates, branch and credentials.

mod identity;
mod run;
mod secret;

pub use identity::RunIdentity;
pub use run::{BuildIdentity, CredentialBundle, ImageCoordinates, RunContext};
pub use secret::Secret;
