use serde_json::Value;

/// Fixed vocabulary of entity tags produced by the upstream extraction
/// pipeline. Unknown tags never reach the router; they are dropped at the
/// boundary by [`parse_entities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
	FaultCode,
	PartNumber,
	Equipment,
	Symptom,
	DocumentTopic,
	Person,
	Date,
}
impl EntityType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::FaultCode => "fault_code",
			Self::PartNumber => "part_number",
			Self::Equipment => "equipment",
			Self::Symptom => "symptom",
			Self::DocumentTopic => "document_topic",
			Self::Person => "person",
			Self::Date => "date",
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Entity {
	#[serde(rename = "type")]
	pub entity_type: EntityType,
	pub value: String,
	pub confidence: f32,
}

/// Extraction-boundary validation. Entries that are not objects, carry an
/// unknown or missing `type`, or have an empty `value` are skipped, never
/// raised.
pub fn parse_entities(raw: &Value) -> Vec<Entity> {
	let Some(items) = raw.as_array() else {
		return Vec::new();
	};

	let mut entities = Vec::with_capacity(items.len());

	for item in items {
		let Ok(entity) = serde_json::from_value::<Entity>(item.clone()) else {
			continue;
		};

		if entity.value.trim().is_empty() {
			continue;
		}

		entities.push(entity);
	}

	entities
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn parses_well_formed_entities() {
		let raw = json!([
			{ "type": "fault_code", "value": "WARN-335", "confidence": 0.97 },
			{ "type": "equipment", "value": "main engine", "confidence": 0.81 },
		]);
		let entities = parse_entities(&raw);

		assert_eq!(entities.len(), 2);
		assert_eq!(entities[0].entity_type, EntityType::FaultCode);
		assert_eq!(entities[1].value, "main engine");
	}

	#[test]
	fn skips_malformed_entries() {
		let raw = json!([
			{ "value": "no type", "confidence": 0.9 },
			{ "type": "planet", "value": "neptune", "confidence": 0.9 },
			{ "type": "equipment", "value": "   ", "confidence": 0.9 },
			"not an object",
			{ "type": "part_number", "value": "IMP-020", "confidence": 0.88 },
		]);
		let entities = parse_entities(&raw);

		assert_eq!(entities.len(), 1);
		assert_eq!(entities[0].entity_type, EntityType::PartNumber);
	}

	#[test]
	fn parses_empty_input_to_no_entities() {
		assert!(parse_entities(&json!([])).is_empty());
		assert!(parse_entities(&json!({ "entities": [] })).is_empty());
	}
}
