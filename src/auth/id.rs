//! Strongly typed identifiers and opaque token strings enforced across the domain.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

/// Minimum entropy (in bytes) required of a minted token string (invariant 5: tokens
/// are cryptographically random, >= 256 bits).
pub const TOKEN_ENTROPY_BYTES: usize = 32;

macro_rules! def_id {
	($name:ident, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		pub struct $name(String);
		impl $name {
			/// Wraps an existing identifier string without validation (e.g. loaded
			/// from storage, where it was already validated once).
			pub fn from_raw(value: impl Into<String>) -> Self {
				Self(value.into())
			}

			/// Generates a new random identifier with the crate's standard token
			/// entropy and encoding.
			pub fn generate() -> Self {
				Self(generate_opaque_string())
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl From<String> for $name {
			fn from(value: String) -> Self {
				Self(value)
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

def_id! { ClientId, "Unique identifier for a registered OAuth client." }
def_id! { TokenString, "Opaque bearer-safe secret string backing a code or token record." }

impl Debug for TokenString {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenString").field(&"<redacted>").finish()
	}
}

/// Draws [`TOKEN_ENTROPY_BYTES`] bytes from a cryptographic RNG and base64url-encodes
/// them without padding (§4.B).
pub fn generate_opaque_string() -> String {
	let mut bytes = [0_u8; TOKEN_ENTROPY_BYTES];

	rand::rng().fill(&mut bytes);

	URL_SAFE_NO_PAD.encode(bytes)
}

/// Generates a human-scale random string (alphanumeric) for correlation tokens and
/// PKCE verifiers that need a specific character length rather than raw entropy.
pub fn random_alphanumeric(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn generated_client_id_round_trips_through_serde() {
		let id = ClientId::generate();
		let json = serde_json::to_string(&id).expect("client id should serialize");
		let back: ClientId = serde_json::from_str(&json).expect("client id should deserialize");

		assert_eq!(id, back);
	}

	#[test]
	fn generated_token_has_required_entropy() {
		let token = generate_opaque_string();
		let decoded = URL_SAFE_NO_PAD.decode(&token).expect("token must be valid base64url");

		assert!(decoded.len() >= TOKEN_ENTROPY_BYTES);
	}

	#[test]
	fn token_string_debug_redacts() {
		let token = TokenString::from_raw("super-secret-value");

		assert_eq!(format!("{token:?}"), "TokenString(\"<redacted>\")");
	}
}
