//! Embedded OAuth 2.1 authorization server core for an MCP tool-brokering service —
//! dynamic client registration, the authorization code + PKCE grant, token lifecycle,
//! durable credential storage, and optional federation to an external identity
//! provider (Google, Azure) before this server issues its own tokens.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod federation;
pub mod http;
pub mod obs;
pub mod provider;
pub mod server;
pub mod store;
pub mod token;

#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;

	pub use crate::error::{Error, Result};
}

pub use url;
