//! Identity, scope, and token models shared by the client, broker, and endpoint.

pub mod id;
pub mod scope;
pub mod token;

pub use id::*;
pub use scope::*;
pub use token::{access::*, family::*, record::*, secret::*};
