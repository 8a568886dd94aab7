//! Domain identifiers, scope sets, and the five credential entity kinds from the
//! authorization server's data model: client registrations, pending federated
//! authorizations, authorization codes, access tokens, and refresh tokens.

pub mod client;
pub mod code;
pub mod id;
pub mod identity;
pub mod pending;
pub mod scope;
pub mod token;

pub use client::*;
pub use code::*;
pub use id::*;
pub use identity::*;
pub use pending::*;
pub use scope::*;
pub use token::*;
