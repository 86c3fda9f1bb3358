use std::sync::OnceLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::entity::{Entity, EntityType};

/// Four-way request outcome. Replaces a binary pass/fail: a search that found
/// nothing for a well-anchored query is a different result than a query the
/// engine never understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
	Found,
	Salvaged,
	Unknown,
	Empty,
}
impl Outcome {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Found => "FOUND",
			Self::Salvaged => "SALVAGED",
			Self::Unknown => "UNKNOWN",
			Self::Empty => "EMPTY",
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OutcomeResult {
	pub outcome: Outcome,
	pub anchor_strength: f32,
	pub coverage_ratio: f32,
	pub matched_tokens: Vec<String>,
	pub unmatched_tokens: Vec<String>,
	pub nonsense_tokens: Vec<String>,
	pub confidence: f32,
	pub reasoning: String,
}

pub struct OutcomeInput<'a> {
	pub raw_query: &'a str,
	pub entities: &'a [Entity],
	pub has_results: bool,
	pub result_count: u32,
}

const ANCHOR_FLOOR: f32 = 0.1;
const NONSENSE_CEILING: f32 = 0.7;
const COVERAGE_FLOOR: f32 = 0.6;
const MIN_MEANINGFUL_CHARS: usize = 5;

/// How specific a recognized entity tag is. A fault code pins the query to a
/// record family; a person barely narrows it.
pub fn anchor_weight(entity_type: EntityType) -> f32 {
	match entity_type {
		EntityType::FaultCode => 1.0,
		EntityType::PartNumber => 0.9,
		EntityType::Equipment => 0.75,
		EntityType::Symptom => 0.6,
		EntityType::DocumentTopic => 0.5,
		EntityType::Date => 0.3,
		EntityType::Person => 0.2,
	}
}

const STOP_WORDS: &[&str] = &[
	"a", "an", "and", "any", "are", "at", "be", "by", "can", "do", "does", "find", "for", "get",
	"has", "have", "how", "i", "in", "is", "it", "list", "me", "my", "of", "on", "or", "our",
	"please", "search", "show", "that", "the", "their", "there", "this", "to", "was", "we", "what",
	"when", "where", "which", "who", "why", "will", "with", "you",
];

/// Short maintenance vocabulary that stays meaningful below the generic
/// length threshold.
const DOMAIN_VOCABULARY: &[&str] = &[
	"alarm", "belt", "bilge", "buy", "crew", "davit", "deck", "engine", "error", "fault", "fuel",
	"fuse", "galley", "gps", "hose", "hull", "keel", "leak", "log", "mast", "oil", "order", "part",
	"prop", "pump", "radar", "relay", "sail", "seal", "trim", "valve", "vhf", "winch", "wiring",
];

fn code_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();

	PATTERN.get_or_init(|| {
		Regex::new(r"^(?:[a-z]{1,8}[-_]?\d{1,6}[a-z0-9-]*|\d{1,6}[a-z][a-z0-9-]*|\d{3,})$")
			.expect("Code pattern must compile.")
	})
}

/// Case-folded alphanumeric runs; hyphen-joined codes stay intact, so
/// `WARN-335` tokenizes as one token.
pub fn tokenize(text: &str) -> Vec<String> {
	let mut tokens = Vec::new();
	let mut current = String::new();

	for ch in text.chars() {
		if ch.is_alphanumeric() || ch == '-' || ch == '_' {
			current.extend(ch.to_lowercase());
		} else if !current.is_empty() {
			push_token(&mut tokens, &mut current);
		}
	}

	if !current.is_empty() {
		push_token(&mut tokens, &mut current);
	}

	tokens
}

fn push_token(tokens: &mut Vec<String>, current: &mut String) {
	let trimmed = current.trim_matches(['-', '_']);

	if !trimmed.is_empty() {
		tokens.push(trimmed.to_string());
	}

	current.clear();
}

/// Deterministic, zero-I/O classification of one composed search. Every
/// input, including an empty result set, maps to a defined outcome.
pub fn classify(input: OutcomeInput<'_>) -> OutcomeResult {
	let anchor_strength = input
		.entities
		.iter()
		.map(|entity| anchor_weight(entity.entity_type))
		.fold(0.0_f32, f32::max);

	let match_terms: Vec<String> = input
		.entities
		.iter()
		.flat_map(|entity| {
			let folded = entity.value.trim().to_lowercase();
			let mut terms: Vec<String> =
				folded.unicode_words().map(str::to_string).collect();

			terms.push(folded);

			terms
		})
		.collect();

	let mut matched_tokens = Vec::new();
	let mut unmatched_tokens = Vec::new();
	let mut nonsense_tokens = Vec::new();

	for token in tokenize(input.raw_query) {
		if STOP_WORDS.contains(&token.as_str()) {
			continue;
		}
		if matched_tokens.contains(&token)
			|| unmatched_tokens.contains(&token)
			|| nonsense_tokens.contains(&token)
		{
			continue;
		}

		if match_terms.iter().any(|term| term == &token) {
			matched_tokens.push(token);
		} else if is_meaningful(&token) {
			unmatched_tokens.push(token);
		} else {
			nonsense_tokens.push(token);
		}
	}

	let meaningful_total = matched_tokens.len() + unmatched_tokens.len();
	let coverage_ratio = if meaningful_total == 0 {
		0.0
	} else {
		matched_tokens.len() as f32 / meaningful_total as f32
	};
	let token_total = meaningful_total + nonsense_tokens.len();
	let nonsense_ratio = if token_total == 0 {
		0.0
	} else {
		nonsense_tokens.len() as f32 / token_total as f32
	};
	let confidence =
		(anchor_strength * coverage_ratio * (1.0 - nonsense_ratio)).clamp(0.0, 1.0);

	let (outcome, reasoning) = decide(DecideArgs {
		anchor_strength,
		nonsense_ratio,
		coverage_ratio,
		has_results: input.has_results,
		result_count: input.result_count,
		unmatched: &unmatched_tokens,
	});

	OutcomeResult {
		outcome,
		anchor_strength,
		coverage_ratio,
		matched_tokens,
		unmatched_tokens,
		nonsense_tokens,
		confidence,
		reasoning,
	}
}

struct DecideArgs<'a> {
	anchor_strength: f32,
	nonsense_ratio: f32,
	coverage_ratio: f32,
	has_results: bool,
	result_count: u32,
	unmatched: &'a [String],
}

fn decide(args: DecideArgs<'_>) -> (Outcome, String) {
	if args.anchor_strength < ANCHOR_FLOOR {
		return (Outcome::Unknown, "no strong domain anchors".to_string());
	}
	if args.nonsense_ratio > NONSENSE_CEILING {
		return (Outcome::Unknown, "too much nonsense".to_string());
	}
	if !args.has_results {
		return (Outcome::Empty, "anchors present, no matching records".to_string());
	}
	if args.coverage_ratio >= COVERAGE_FLOOR {
		return (
			Outcome::Found,
			format!("matched tokens cover the query, {} records", args.result_count),
		);
	}

	(
		Outcome::Salvaged,
		format!("partial coverage, unmatched tokens: {}", args.unmatched.join(", ")),
	)
}

fn is_meaningful(token: &str) -> bool {
	DOMAIN_VOCABULARY.contains(&token)
		|| code_pattern().is_match(token)
		|| token.chars().count() >= MIN_MEANINGFUL_CHARS
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keeps_hyphenated_codes_intact() {
		assert_eq!(tokenize("WARN-335 main engine!"), vec!["warn-335", "main", "engine"]);
	}

	#[test]
	fn strips_edge_hyphens() {
		assert_eq!(tokenize("-warn- --335--"), vec!["warn", "335"]);
	}

	#[test]
	fn recognizes_code_like_tokens() {
		assert!(is_meaningful("e047"));
		assert!(is_meaningful("warn-335"));
		assert!(is_meaningful("8675309"));
		assert!(!is_meaningful("qx"));
	}
}
