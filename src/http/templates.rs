//! Server-rendered HTML: the consent page and the plain-HTML error page (§4.E
//! "Consent pages render via `askama` templates"; §7 "All error pages are plain
//! HTML with the error code and a short description").

// crates.io
use askama::Template;
// self
use crate::{
	_prelude::*,
	auth::{IdentityClaims, ScopeSet},
	provider::ConsentView,
};

/// One requested scope, rendered with a human-readable description.
pub struct ScopeRow {
	/// The raw scope string.
	pub name: String,
	/// A short description shown next to the scope on the consent page.
	pub description: &'static str,
}

/// Consent page rendered by `GET`-resulting `AuthorizeOutcome::Consent` and by
/// the post-federation consent step.
#[derive(Template)]
#[template(path = "consent.html")]
pub struct ConsentTemplate {
	/// The client's display name.
	pub client_name: String,
	/// The signed-in identity's label, present only on federated flows.
	pub identity: Option<String>,
	/// Requested scopes with descriptions.
	pub scopes: Vec<ScopeRow>,
	/// Route the approval form posts to.
	pub action: &'static str,
	/// Correlation ticket carried as a hidden field.
	pub ticket: String,
}
impl From<ConsentView> for ConsentTemplate {
	fn from(view: ConsentView) -> Self {
		Self {
			client_name: view.client_name,
			identity: view.identity.as_ref().map(describe_identity),
			scopes: scope_rows(&view.scope),
			action: view.approve_action,
			ticket: view.ticket,
		}
	}
}

/// Plain-HTML error page for failures that cannot safely redirect to a client
/// `redirect_uri` (§7).
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
	/// RFC 6749 §5.2 error code.
	pub error: &'static str,
	/// Optional human-readable detail.
	pub description: Option<String>,
}

/// Renders an identity as the short label shown on the consent page: prefers
/// email, falls back to display name, then the bare subject.
fn describe_identity(identity: &IdentityClaims) -> String {
	identity
		.email
		.clone()
		.or_else(|| identity.display_name.clone())
		.unwrap_or_else(|| identity.subject.clone())
}

/// Maps each requested scope to a human description, falling back to the raw
/// scope string for deployment-specific scopes this crate doesn't know about.
fn scope_rows(scope: &ScopeSet) -> Vec<ScopeRow> {
	scope.iter().map(|name| ScopeRow { name: name.to_owned(), description: describe_scope(name) }).collect()
}

/// Human description for a handful of conventional MCP tool-access scopes;
/// unrecognized scopes render with a generic description rather than failing.
fn describe_scope(scope: &str) -> &'static str {
	match scope {
		"read" => "Read data from your connected tools",
		"write" => "Modify data in your connected tools",
		"admin" => "Manage configuration for your connected tools",
		_ => "Use this capability on your behalf",
	}
}
