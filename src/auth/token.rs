//! Bearer-token records and the redacting secret wrapper shared with credentials.

pub mod record;
pub mod secret;
