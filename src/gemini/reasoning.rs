//! Reasoning-effort mapping.
//!
//! The upstream API takes the effort three different ways depending on the
//! model family: a model-name suffix (Gemini 3 Pro), a categorical
//! `thinkingLevel` (Gemini 3 Flash), or a numeric token budget (Claude and
//! everything else).

use crate::Result;
use crate::chat::ReasoningEffort;
use crate::webc::HeaderStyle;
use serde_json::Value;
use value_ext::JsonValueExt;

/// Forced `maxOutputTokens` floor for Claude thinking requests, which reject
/// a budget >= the output cap.
const CLAUDE_MAX_OUTPUT_TOKENS: u32 = 64000;

const TIER_SUFFIXES: &[&str] = &["-low", "-medium", "-high", "-minimal"];

// region:    --- Model Tags

pub fn is_claude_model(model: &str) -> bool {
	let model = model.to_lowercase();
	model.contains("claude") || model.contains("opus")
}

pub fn is_thinking_model(model: &str) -> bool {
	let model = model.to_lowercase();
	model.contains("thinking") || model.contains("gemini-3") || model.contains("opus")
}

fn is_gemini3_pro(model: &str) -> bool {
	model.to_lowercase().contains("gemini-3-pro")
}

fn is_gemini3_flash(model: &str) -> bool {
	model.to_lowercase().contains("gemini-3-flash")
}

// endregion: --- Model Tags

// region:    --- Effort Projections

/// Gemini 3 Pro folds effort into the model-name suffix.
pub fn pro_thinking_level(effort: Option<ReasoningEffort>) -> &'static str {
	match effort {
		Some(ReasoningEffort::High) => "high",
		_ => "low",
	}
}

pub fn flash_thinking_level(effort: Option<ReasoningEffort>) -> &'static str {
	match effort {
		Some(ReasoningEffort::Minimal) => "minimal",
		Some(ReasoningEffort::Low) => "low",
		Some(ReasoningEffort::Medium) | None => "medium",
		Some(ReasoningEffort::High) => "high",
	}
}

/// Numeric budget; `default_budget` applies only when the effort is absent.
pub fn thinking_budget(effort: Option<ReasoningEffort>, default_budget: u32) -> u32 {
	match effort {
		Some(ReasoningEffort::Minimal) | Some(ReasoningEffort::Low) => 8192,
		Some(ReasoningEffort::Medium) => 16384,
		Some(ReasoningEffort::High) => 32768,
		None => default_budget,
	}
}

// endregion: --- Effort Projections

// region:    --- Model Normalization

/// Appends the effort suffix for Gemini 3 Pro models. An explicit suffix in
/// the client's model string wins over the `reasoning_effort` param.
pub fn normalize_model_for_antigravity(model: &str, effort: Option<ReasoningEffort>) -> String {
	let lower = model.to_lowercase();
	if lower.starts_with("gemini-3-pro") && !TIER_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
		format!("{model}-{}", pro_thinking_level(effort))
	} else {
		model.to_string()
	}
}

/// Restores the canonical model id for a given wire style. The gemini-cli
/// style wants tier suffixes stripped and a `-preview` marker on Gemini 3.
pub fn resolve_model_for_header_style(model: &str, style: HeaderStyle) -> String {
	match style {
		HeaderStyle::Antigravity => model.to_string(),
		HeaderStyle::GeminiCli => {
			let lower = model.to_lowercase();
			let stripped = TIER_SUFFIXES
				.iter()
				.find(|suffix| lower.ends_with(*suffix))
				.map(|suffix| &model[..model.len() - suffix.len()])
				.unwrap_or(model);
			if stripped.to_lowercase().contains("gemini-3") && !stripped.to_lowercase().ends_with("-preview") {
				format!("{stripped}-preview")
			} else {
				stripped.to_string()
			}
		}
	}
}

// endregion: --- Model Normalization

// region:    --- Thinking Config Injection

/// Injects the per-family `thinkingConfig` into a `generationConfig` value.
pub fn apply_thinking_config(
	gen_config: &mut Value,
	model: &str,
	effort: Option<ReasoningEffort>,
	default_budget: u32,
) -> Result<()> {
	if !is_thinking_model(model) {
		return Ok(());
	}

	if is_gemini3_pro(model) {
		gen_config.x_insert("/thinkingConfig/thinkingLevel", pro_thinking_level(effort))?;
		gen_config.x_insert("/thinkingConfig/includeThoughts", true)?;
	} else if is_gemini3_flash(model) {
		gen_config.x_insert("/thinkingConfig/thinkingLevel", flash_thinking_level(effort))?;
		gen_config.x_insert("/thinkingConfig/includeThoughts", true)?;
	} else if is_claude_model(model) {
		let budget = thinking_budget(effort, default_budget);
		gen_config.x_insert("/thinkingConfig/include_thoughts", true)?;
		gen_config.x_insert("/thinkingConfig/thinking_budget", budget)?;
		let max_output: Option<u32> = gen_config.x_get("maxOutputTokens").ok();
		if max_output.map(|max| max <= budget).unwrap_or(true) {
			gen_config.x_insert("maxOutputTokens", CLAUDE_MAX_OUTPUT_TOKENS)?;
		}
	} else {
		gen_config.x_insert("/thinkingConfig/thinkingBudget", thinking_budget(effort, default_budget))?;
		gen_config.x_insert("/thinkingConfig/includeThoughts", true)?;
	}

	Ok(())
}

// endregion: --- Thinking Config Injection

// region:    --- Tests

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_normalize_model_for_antigravity() {
		assert_eq!(
			normalize_model_for_antigravity("gemini-3-pro", Some(ReasoningEffort::High)),
			"gemini-3-pro-high"
		);
		assert_eq!(normalize_model_for_antigravity("gemini-3-pro", None), "gemini-3-pro-low");
		assert_eq!(
			normalize_model_for_antigravity("gemini-3-flash", Some(ReasoningEffort::High)),
			"gemini-3-flash"
		);
		assert_eq!(normalize_model_for_antigravity("gpt-4", Some(ReasoningEffort::High)), "gpt-4");
		// Idempotent once a tier suffix is present
		assert_eq!(
			normalize_model_for_antigravity("gemini-3-pro-high", Some(ReasoningEffort::Low)),
			"gemini-3-pro-high"
		);
	}

	#[test]
	fn test_resolve_model_for_header_style() {
		assert_eq!(
			resolve_model_for_header_style("gemini-3-pro-low", HeaderStyle::Antigravity),
			"gemini-3-pro-low"
		);
		assert_eq!(
			resolve_model_for_header_style("gemini-3-pro-low", HeaderStyle::GeminiCli),
			"gemini-3-pro-preview"
		);
		assert_eq!(
			resolve_model_for_header_style("gemini-3-flash", HeaderStyle::GeminiCli),
			"gemini-3-flash-preview"
		);
		assert_eq!(
			resolve_model_for_header_style("gemini-2.5-flash", HeaderStyle::GeminiCli),
			"gemini-2.5-flash"
		);
	}

	#[test]
	fn test_model_tags() {
		assert!(is_claude_model("claude-sonnet-4-5"));
		assert!(is_claude_model("gemini-opus-hybrid"));
		assert!(!is_claude_model("gemini-3-pro"));
		assert!(is_thinking_model("gemini-3-flash"));
		assert!(is_thinking_model("claude-sonnet-4-5-thinking"));
		assert!(!is_thinking_model("gpt-4"));
	}

	#[test]
	fn test_thinking_budget_map() {
		assert_eq!(thinking_budget(Some(ReasoningEffort::Minimal), 16000), 8192);
		assert_eq!(thinking_budget(Some(ReasoningEffort::Low), 16000), 8192);
		assert_eq!(thinking_budget(Some(ReasoningEffort::Medium), 16000), 16384);
		assert_eq!(thinking_budget(Some(ReasoningEffort::High), 16000), 32768);
		assert_eq!(thinking_budget(None, 16000), 16000);
	}

	#[test]
	fn test_apply_thinking_config_claude_forces_max_output() -> crate::Result<()> {
		let mut gen_config = json!({"maxOutputTokens": 1024});
		apply_thinking_config(
			&mut gen_config,
			"claude-sonnet-4-5-thinking",
			Some(ReasoningEffort::Medium),
			16000,
		)?;
		assert_eq!(gen_config.pointer("/thinkingConfig/thinking_budget").and_then(Value::as_u64), Some(16384));
		assert_eq!(gen_config.pointer("/thinkingConfig/include_thoughts").and_then(Value::as_bool), Some(true));
		assert_eq!(gen_config.pointer("/maxOutputTokens").and_then(Value::as_u64), Some(64000));
		Ok(())
	}

	#[test]
	fn test_apply_thinking_config_claude_keeps_large_max_output() -> crate::Result<()> {
		let mut gen_config = json!({"maxOutputTokens": 50000});
		apply_thinking_config(&mut gen_config, "claude-opus-4-5", Some(ReasoningEffort::Low), 16000)?;
		assert_eq!(gen_config.pointer("/maxOutputTokens").and_then(Value::as_u64), Some(50000));
		Ok(())
	}

	#[test]
	fn test_apply_thinking_config_families() -> crate::Result<()> {
		let mut pro = json!({});
		apply_thinking_config(&mut pro, "gemini-3-pro", Some(ReasoningEffort::High), 16000)?;
		assert_eq!(pro.pointer("/thinkingConfig/thinkingLevel").and_then(Value::as_str), Some("high"));

		let mut flash = json!({});
		apply_thinking_config(&mut flash, "gemini-3-flash", None, 16000)?;
		assert_eq!(flash.pointer("/thinkingConfig/thinkingLevel").and_then(Value::as_str), Some("medium"));

		let mut other = json!({});
		apply_thinking_config(&mut other, "some-thinking-model", None, 16000)?;
		assert_eq!(other.pointer("/thinkingConfig/thinkingBudget").and_then(Value::as_u64), Some(16000));

		let mut plain = json!({});
		apply_thinking_config(&mut plain, "gpt-4", Some(ReasoningEffort::High), 16000)?;
		assert_eq!(plain, json!({}));
		Ok(())
	}
}

// endregion: --- Tests
