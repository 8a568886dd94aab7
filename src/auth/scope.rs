//! Scope modeling shared by client registrations, codes, and tokens.

// std
use std::{cmp::Ordering, collections::BTreeSet, slice::Iter, str::FromStr};
// crates.io
use serde::{Deserializer, Serializer};
// self
use crate::_prelude::*;

/// Errors emitted while validating or reconciling scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeError {
	/// A requested scope is not present in the server's configured valid set, and was
	/// not part of the originally granted scopes.
	#[error("Scope `{scope}` is not permitted.")]
	NotPermitted {
		/// The offending scope string.
		scope: String,
	},
}

/// Normalized set of OAuth scopes: deduplicated, sorted, and comparable independent of
/// input order (so `"read write"` and `"write read"` refer to the same grant).
///
/// Serializes as the space-delimited wire string (`clients.json`'s `scope` field, §6),
/// matching what the authorization/token endpoints accept. Call sites that must match
/// `refresh_tokens.json`'s `scopes: [...]` array layout use the [`array`] serde module
/// instead.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ScopeSet {
	scopes: Arc<[String]>,
}
impl ScopeSet {
	/// Builds a normalized scope set from any iterator of scope strings. Unlike client
	/// input validation, this constructor never rejects malformed entries; it is used
	/// for server-trusted sources (valid-scope configuration, stored records).
	pub fn new<I, S>(scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let set: BTreeSet<String> =
			scopes.into_iter().map(Into::into).filter(|s| !s.is_empty()).collect();

		Self { scopes: Arc::from(set.into_iter().collect::<Vec<_>>()) }
	}

	/// Returns true if no scopes are present.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Returns true if the set contains the given scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.scopes.binary_search_by(|candidate| candidate.as_str().cmp(scope)).is_ok()
	}

	/// Returns true if every scope in `self` is also present in `other`.
	pub fn is_subset_of(&self, other: &ScopeSet) -> bool {
		self.iter().all(|scope| other.contains(scope))
	}

	/// Intersection of two scope sets.
	pub fn intersection(&self, other: &ScopeSet) -> ScopeSet {
		ScopeSet::new(self.iter().filter(|scope| other.contains(scope)))
	}

	/// Iterator over normalized scope strings.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.scopes.iter().map(String::as_str)
	}

	/// Space-delimited wire representation (§6).
	pub fn normalized(&self) -> String {
		self.scopes.join(" ")
	}

	/// Underlying sorted slice.
	pub fn as_slice(&self) -> &[String] {
		&self.scopes
	}
}
impl PartialOrd for ScopeSet {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
impl Ord for ScopeSet {
	fn cmp(&self, other: &Self) -> Ordering {
		self.scopes.cmp(&other.scopes)
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.scopes).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl FromStr for ScopeSet {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(Self::new(s.split_whitespace()))
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.normalized())
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		Ok(Self::new(raw.split_whitespace()))
	}
}

/// Serde helpers for the array-of-strings layout (`refresh_tokens.json`'s `scopes`
/// field, §6) instead of [`ScopeSet`]'s default space-delimited string form.
pub mod array {
	// self
	use super::*;

	/// Serializes a [`ScopeSet`] as a JSON array of strings.
	pub fn serialize<S>(scopes: &ScopeSet, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serde::Serialize::serialize(scopes.as_slice(), serializer)
	}

	/// Deserializes a [`ScopeSet`] from a JSON array of strings.
	pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<ScopeSet, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		Ok(ScopeSet::new(values))
	}
}
impl<'a> IntoIterator for &'a ScopeSet {
	type IntoIter = ScopeIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		ScopeIter { inner: self.scopes.iter() }
	}
}

/// Iterator over scope strings, mirroring [`ScopeSet::iter`].
pub struct ScopeIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for ScopeIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(String::as_str)
	}
}

/// Reconciles a client's requested scope against the scopes originally granted and
/// the server's configured valid set (§4.B "Scope policy on exchange/refresh").
///
/// An empty `requested` inherits `granted` verbatim. A non-empty `requested` is
/// rejected wholesale if it names a scope outside both `granted` and `valid`;
/// otherwise the result is `requested ∩ granted` (invariant 4: never wider than what
/// was originally granted).
pub fn reconcile_scope(
	requested: &ScopeSet,
	granted: &ScopeSet,
	valid: &ScopeSet,
) -> Result<ScopeSet, ScopeError> {
	if requested.is_empty() {
		return Ok(granted.clone());
	}

	for scope in requested.iter() {
		if !granted.contains(scope) && !valid.contains(scope) {
			return Err(ScopeError::NotPermitted { scope: scope.to_owned() });
		}
	}

	Ok(requested.intersection(granted))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_normalize_independent_of_order() {
		let lhs = ScopeSet::new(["read", "write", "write"]);
		let rhs = ScopeSet::new(["write", "read"]);

		assert_eq!(lhs, rhs);
		assert_eq!(lhs.normalized(), "read write");
	}

	#[test]
	fn empty_request_inherits_granted_scopes() {
		let granted = ScopeSet::new(["read"]);
		let valid = ScopeSet::new(["read", "write"]);
		let requested = ScopeSet::default();

		let result = reconcile_scope(&requested, &granted, &valid).expect("should inherit");

		assert_eq!(result, granted);
	}

	#[test]
	fn narrower_request_is_intersected() {
		let granted = ScopeSet::new(["read", "write"]);
		let valid = ScopeSet::new(["read", "write", "admin"]);
		let requested = ScopeSet::new(["read"]);

		let result = reconcile_scope(&requested, &granted, &valid).expect("should narrow");

		assert_eq!(result, ScopeSet::new(["read"]));
	}

	#[test]
	fn widening_beyond_granted_and_valid_is_rejected() {
		let granted = ScopeSet::new(["read"]);
		let valid = ScopeSet::new(["read"]);
		let requested = ScopeSet::new(["read", "write"]);

		let err = reconcile_scope(&requested, &granted, &valid).expect_err("should reject");

		assert!(matches!(err, ScopeError::NotPermitted { scope } if scope == "write"));
	}

	#[test]
	fn widening_within_valid_set_is_allowed_but_capped_by_granted() {
		// S6: requesting a scope that's in the valid set but wasn't originally granted
		// is still capped to the intersection with what was granted, per invariant 4.
		let granted = ScopeSet::new(["read"]);
		let valid = ScopeSet::new(["read", "write"]);
		let requested = ScopeSet::new(["read", "write"]);

		let result = reconcile_scope(&requested, &granted, &valid).expect("write is in valid set");

		assert_eq!(result, ScopeSet::new(["read"]));
	}
}
