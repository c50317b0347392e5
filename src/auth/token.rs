//! Token lifecycle types.

pub mod access;
pub mod family;
pub mod record;
pub mod secret;
