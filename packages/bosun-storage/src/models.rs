/// One record surfaced by a capability. `(object_type, object_id)` is the
/// stable identity the merge dedupes on.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SearchRow {
	pub object_type: String,
	pub object_id: String,
	pub score: f32,
	pub snippet: String,
	pub payload: serde_json::Value,
}
impl SearchRow {
	pub fn identity(&self) -> (&str, &str) {
		(&self.object_type, &self.object_id)
	}
}
