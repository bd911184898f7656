//! Account identifiers, credentials, and cached bearer-token models.

pub mod credential;
pub mod id;
pub mod token;

pub use credential::*;
pub use id::*;
pub use token::{record::*, secret::*};
