/// Tenant identity for one request, built once from verified claims. The
/// engine trusts it completely and applies it uniformly; no component ever
/// re-checks identity at query time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawUserContext")]
pub struct UserContext {
	pub user_id: String,
	pub org_id: String,
	pub yacht_id: Option<String>,
	pub role: String,
	pub locale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextReject {
	MissingUserId,
	MissingOrgId,
}
impl std::fmt::Display for ContextReject {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::MissingUserId => write!(f, "user_id must be non-empty."),
			Self::MissingOrgId => write!(f, "org_id must be non-empty."),
		}
	}
}

#[derive(serde::Deserialize)]
struct RawUserContext {
	user_id: String,
	org_id: String,
	#[serde(default)]
	yacht_id: Option<String>,
	#[serde(default = "default_role")]
	role: String,
	#[serde(default = "default_locale")]
	locale: String,
}

fn default_role() -> String {
	"crew".to_string()
}

fn default_locale() -> String {
	"en".to_string()
}

impl UserContext {
	pub fn new(
		user_id: &str,
		org_id: &str,
		yacht_id: Option<&str>,
		role: &str,
		locale: &str,
	) -> Result<Self, ContextReject> {
		let user_id = user_id.trim();
		let org_id = org_id.trim();

		if user_id.is_empty() {
			return Err(ContextReject::MissingUserId);
		}
		if org_id.is_empty() {
			return Err(ContextReject::MissingOrgId);
		}

		let yacht_id = yacht_id.map(str::trim).filter(|id| !id.is_empty()).map(str::to_string);
		let role = if role.trim().is_empty() { default_role() } else { role.trim().to_string() };
		let locale =
			if locale.trim().is_empty() { default_locale() } else { locale.trim().to_string() };

		Ok(Self { user_id: user_id.to_string(), org_id: org_id.to_string(), yacht_id, role, locale })
	}
}

impl TryFrom<RawUserContext> for UserContext {
	type Error = ContextReject;

	fn try_from(raw: RawUserContext) -> Result<Self, Self::Error> {
		Self::new(&raw.user_id, &raw.org_id, raw.yacht_id.as_deref(), &raw.role, &raw.locale)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_empty_org_id() {
		assert_eq!(
			UserContext::new("u-1", "  ", None, "crew", "en"),
			Err(ContextReject::MissingOrgId)
		);
	}

	#[test]
	fn rejects_empty_user_id() {
		assert_eq!(
			UserContext::new("", "org-7", None, "crew", "en"),
			Err(ContextReject::MissingUserId)
		);
	}

	#[test]
	fn normalizes_blank_yacht_id_to_none() {
		let ctx = UserContext::new("u-1", "org-7", Some("   "), "captain", "en")
			.expect("Context must build.");

		assert_eq!(ctx.yacht_id, None);
	}

	#[test]
	fn deserialization_enforces_construction_rules() {
		let err = serde_json::from_str::<UserContext>(
			r#"{ "user_id": "u-1", "org_id": "" }"#,
		);

		assert!(err.is_err());

		let ctx: UserContext = serde_json::from_str(
			r#"{ "user_id": "u-1", "org_id": "org-7", "yacht_id": "y-2" }"#,
		)
		.expect("Context must deserialize.");

		assert_eq!(ctx.yacht_id.as_deref(), Some("y-2"));
		assert_eq!(ctx.role, "crew");
	}
}
