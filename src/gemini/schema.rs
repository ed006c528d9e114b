//! JSON-Schema sanitizers for the upstream tool declarations.
//!
//! Two modes:
//! - `clean_light` for native Gemini models, which merely drops the keywords
//!   the Gemini schema dialect rejects.
//! - `clean_strict` for Claude models served through Antigravity's
//!   "VALIDATED" tool mode, which rejects most of draft JSON-Schema. The
//!   strict cleaner rewrites the unsupported constructs into description
//!   hints so the model still sees them.
//!
//! Both are pure: input trees are never mutated.

use serde_json::{Map, Value, json};

const LIGHT_STRIP_KEYS: &[&str] = &[
	"minLength",
	"maxLength",
	"pattern",
	"format",
	"examples",
	"default",
	"strict",
	"$schema",
	"additionalProperties",
];

/// Constraints rewritten into description hints before being stripped.
const CONSTRAINT_KEYS: &[&str] = &[
	"minLength",
	"maxLength",
	"exclusiveMinimum",
	"exclusiveMaximum",
	"pattern",
	"minItems",
	"maxItems",
	"format",
	"default",
	"examples",
];

const STRICT_STRIP_KEYS: &[&str] = &[
	// -- Constraints (already turned into hints)
	"minLength",
	"maxLength",
	"exclusiveMinimum",
	"exclusiveMaximum",
	"pattern",
	"minItems",
	"maxItems",
	"format",
	"default",
	"examples",
	// -- Structural keywords
	"$schema",
	"$defs",
	"definitions",
	"const",
	"$ref",
	"additionalProperties",
	"propertyNames",
	"title",
	"$id",
	"$comment",
];

// region:    --- Public API

/// Light cleanup for native Gemini models.
pub fn clean_light(schema: &Value) -> Value {
	let mut out = schema.clone();
	light_pass(&mut out);
	out
}

/// Aggressive cleanup for Claude models behind Antigravity's VALIDATED tool
/// mode. Ordered pipeline; hint passes must run before the keyword strip.
pub fn clean_strict(schema: &Value) -> Value {
	let mut out = schema.clone();
	refs_to_description(&mut out);
	const_to_enum(&mut out);
	enum_hints(&mut out);
	additional_properties_hints(&mut out);
	constraint_hints(&mut out);
	merge_all_of(&mut out);
	flatten_any_of(&mut out);
	flatten_type_arrays(&mut out);
	strip_keywords(&mut out);
	prune_required(&mut out);
	fill_empty_objects(&mut out);
	out
}

// endregion: --- Public API

// region:    --- Light Pass

fn light_pass(v: &mut Value) {
	let Some(obj) = v.as_object_mut() else { return };
	for key in LIGHT_STRIP_KEYS {
		obj.remove(*key);
	}
	if let Some(props) = obj.get_mut("properties").and_then(Value::as_object_mut) {
		for child in props.values_mut() {
			light_pass(child);
		}
	}
	if let Some(items) = obj.get_mut("items") {
		light_pass(items);
	}
}

// endregion: --- Light Pass

// region:    --- Strict Passes

/// Applies `f` to every child schema node: `properties` values, `items`,
/// composition branches, and definitions.
fn walk_children<F: FnMut(&mut Value)>(obj: &mut Map<String, Value>, f: &mut F) {
	for key in ["properties", "$defs", "definitions"] {
		if let Some(children) = obj.get_mut(key).and_then(Value::as_object_mut) {
			for child in children.values_mut() {
				f(child);
			}
		}
	}
	if let Some(items) = obj.get_mut("items") {
		f(items);
	}
	for key in ["allOf", "anyOf", "oneOf"] {
		if let Some(branches) = obj.get_mut(key).and_then(Value::as_array_mut) {
			for branch in branches {
				f(branch);
			}
		}
	}
}

/// Pass 1 - any subtree with a `$ref` becomes an object stub pointing at the
/// referenced name via a description hint.
fn refs_to_description(v: &mut Value) {
	let replacement = if let Some(obj) = v.as_object() {
		obj.get("$ref").and_then(Value::as_str).map(|target| {
			let name = target.rsplit('/').next().unwrap_or(target);
			let desc = with_hint(obj.get("description").and_then(Value::as_str), &format!("See: {name}"));
			json!({"type": "object", "description": desc})
		})
	} else {
		None
	};

	if let Some(replacement) = replacement {
		*v = replacement;
		return;
	}
	if let Some(obj) = v.as_object_mut() {
		walk_children(obj, &mut refs_to_description);
	}
}

/// Pass 2 - `const: V` becomes `enum: [V]`.
fn const_to_enum(v: &mut Value) {
	let Some(obj) = v.as_object_mut() else { return };
	if obj.contains_key("const")
		&& !obj.contains_key("enum")
		&& let Some(value) = obj.remove("const")
	{
		obj.insert("enum".to_string(), json!([value]));
	}
	walk_children(obj, &mut const_to_enum);
}

/// Pass 3 - small enums (2-10 variants) get an "Allowed: ..." hint.
fn enum_hints(v: &mut Value) {
	let Some(obj) = v.as_object_mut() else { return };
	let list = obj
		.get("enum")
		.and_then(Value::as_array)
		.filter(|variants| (2..=10).contains(&variants.len()))
		.map(|variants| variants.iter().map(scalar_text).collect::<Vec<_>>().join(", "));
	if let Some(list) = list {
		append_hint(obj, &format!("Allowed: {list}"));
	}
	walk_children(obj, &mut enum_hints);
}

/// Pass 4 - `additionalProperties: false` becomes a hint.
fn additional_properties_hints(v: &mut Value) {
	let Some(obj) = v.as_object_mut() else { return };
	if obj.get("additionalProperties") == Some(&Value::Bool(false)) {
		append_hint(obj, "No extra properties allowed");
	}
	walk_children(obj, &mut additional_properties_hints);
}

/// Pass 5 - numeric/string constraints become "<key>: <value>" hints.
fn constraint_hints(v: &mut Value) {
	let Some(obj) = v.as_object_mut() else { return };
	let hints: Vec<String> = CONSTRAINT_KEYS
		.iter()
		.filter_map(|key| obj.get(*key).map(|value| format!("{key}: {}", scalar_text(value))))
		.collect();
	for hint in hints {
		append_hint(obj, &hint);
	}
	walk_children(obj, &mut constraint_hints);
}

/// Pass 6 - shallow-merge `allOf` branches into the parent.
fn merge_all_of(v: &mut Value) {
	let Some(obj) = v.as_object_mut() else { return };
	while let Some(Value::Array(branches)) = obj.remove("allOf") {
		let mut properties = match obj.remove("properties") {
			Some(Value::Object(map)) => map,
			_ => Map::new(),
		};
		let mut required = match obj.remove("required") {
			Some(Value::Array(entries)) => entries,
			_ => Vec::new(),
		};

		for branch in branches {
			let Value::Object(branch_obj) = branch else { continue };
			for (key, value) in branch_obj {
				match key.as_str() {
					"properties" => {
						if let Value::Object(branch_props) = value {
							for (name, prop) in branch_props {
								properties.entry(name).or_insert(prop);
							}
						}
					}
					"required" => {
						if let Value::Array(entries) = value {
							for entry in entries {
								if !required.contains(&entry) {
									required.push(entry);
								}
							}
						}
					}
					_ => {
						obj.entry(key).or_insert(value);
					}
				}
			}
		}

		if !properties.is_empty() {
			obj.insert("properties".to_string(), Value::Object(properties));
		}
		if !required.is_empty() {
			obj.insert("required".to_string(), Value::Array(required));
		}
	}
	walk_children(obj, &mut merge_all_of);
}

/// Pass 7 - flatten `anyOf`/`oneOf`: pure value alternatives collapse into a
/// single string enum; otherwise the most complex option wins.
fn flatten_any_of(v: &mut Value) {
	loop {
		let key = match v.as_object() {
			Some(obj) if obj.contains_key("anyOf") => "anyOf",
			Some(obj) if obj.contains_key("oneOf") => "oneOf",
			_ => break,
		};

		let Some(obj) = v.as_object_mut() else { break };
		let options = match obj.remove(key) {
			Some(Value::Array(options)) if !options.is_empty() => options,
			_ => continue,
		};
		let parent_desc = obj.get("description").and_then(Value::as_str).map(str::to_string);

		let all_values = options.iter().all(|o| o.get("const").is_some() || o.get("enum").is_some());
		if all_values {
			let mut variants: Vec<Value> = Vec::new();
			for option in &options {
				if let Some(value) = option.get("const") {
					variants.push(value.clone());
				} else if let Some(entries) = option.get("enum").and_then(Value::as_array) {
					variants.extend(entries.iter().cloned());
				}
			}
			let mut replacement = json!({"type": "string", "enum": variants});
			if let Some(desc) = parent_desc
				&& let Some(robj) = replacement.as_object_mut()
			{
				robj.insert("description".to_string(), json!(desc));
			}
			*v = replacement;
			continue;
		}

		// -- Pick the most complex option (first wins on ties)
		let mut type_names: Vec<String> = Vec::new();
		for option in &options {
			let name = option_type_name(option);
			if !type_names.contains(&name) {
				type_names.push(name);
			}
		}
		let mut best_idx = 0;
		let mut best_score = -1i32;
		for (idx, option) in options.iter().enumerate() {
			let score = complexity_score(option);
			if score > best_score {
				best_score = score;
				best_idx = idx;
			}
		}
		let mut options = options;
		let mut replacement = options.swap_remove(best_idx);

		if let Some(robj) = replacement.as_object_mut() {
			if let Some(desc) = parent_desc {
				robj.insert("description".to_string(), json!(desc));
			}
			if type_names.len() > 1 {
				append_hint(robj, &format!("Accepts: {}", type_names.join(" | ")));
			}
		}
		*v = replacement;
	}

	if let Some(obj) = v.as_object_mut() {
		walk_children(obj, &mut flatten_any_of);
	}
}

fn option_type_name(option: &Value) -> String {
	if let Some(name) = option.get("type").and_then(Value::as_str) {
		return name.to_string();
	}
	if let Some(types) = option.get("type").and_then(Value::as_array)
		&& let Some(first) = types.iter().filter_map(Value::as_str).find(|t| *t != "null")
	{
		return first.to_string();
	}
	if option.get("properties").is_some() {
		"object".to_string()
	} else if option.get("items").is_some() {
		"array".to_string()
	} else if option.get("enum").is_some() || option.get("const").is_some() {
		"string".to_string()
	} else {
		"object".to_string()
	}
}

fn complexity_score(option: &Value) -> i32 {
	match option_type_name(option).as_str() {
		"object" => 3,
		"array" => 2,
		"null" => 0,
		_ => 1,
	}
}

/// Pass 8 - `type: [..]` arrays collapse to the first non-null type.
fn flatten_type_arrays(v: &mut Value) {
	let Some(obj) = v.as_object_mut() else { return };
	if let Some(types) = obj.get("type").and_then(Value::as_array).cloned() {
		let names: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
		let non_null: Vec<&str> = names.iter().copied().filter(|t| *t != "null").collect();
		let had_null = names.iter().any(|t| *t == "null");

		match non_null.first() {
			Some(first) => {
				obj.insert("type".to_string(), json!(first));
			}
			None => {
				obj.remove("type");
			}
		}
		if had_null {
			append_hint(obj, "nullable");
		}
		if non_null.len() > 1 {
			append_hint(obj, &format!("Accepts: {}", non_null.join(" | ")));
		}
	}
	walk_children(obj, &mut flatten_type_arrays);
}

/// Pass 9 - drop the remaining unsupported keywords. Keys inside a
/// `properties` map are user-chosen names, never stripped.
fn strip_keywords(v: &mut Value) {
	let Some(obj) = v.as_object_mut() else { return };
	for key in STRICT_STRIP_KEYS {
		obj.remove(*key);
	}
	if let Some(props) = obj.get_mut("properties").and_then(Value::as_object_mut) {
		for child in props.values_mut() {
			strip_keywords(child);
		}
	}
	if let Some(items) = obj.get_mut("items") {
		strip_keywords(items);
	}
}

/// Pass 10 - `required` entries must reference existing properties.
fn prune_required(v: &mut Value) {
	let Some(obj) = v.as_object_mut() else { return };
	let prop_names: Vec<String> = obj
		.get("properties")
		.and_then(Value::as_object)
		.map(|props| props.keys().cloned().collect())
		.unwrap_or_default();
	if let Some(Value::Array(mut entries)) = obj.remove("required") {
		entries.retain(|entry| {
			entry
				.as_str()
				.map(|name| prop_names.iter().any(|p| p == name))
				.unwrap_or(false)
		});
		if !entries.is_empty() {
			obj.insert("required".to_string(), Value::Array(entries));
		}
	}
	walk_children(obj, &mut prune_required);
}

/// Pass 11 - upstream rejects `{type: "object"}` with no properties, so give
/// those a placeholder.
fn fill_empty_objects(v: &mut Value) {
	let Some(obj) = v.as_object_mut() else { return };
	let is_object = obj.get("type").and_then(Value::as_str) == Some("object");
	let no_props = obj
		.get("properties")
		.and_then(Value::as_object)
		.map(Map::is_empty)
		.unwrap_or(true);
	if is_object && no_props {
		obj.insert(
			"properties".to_string(),
			json!({"_placeholder": {"type": "boolean", "description": "Placeholder for empty schema"}}),
		);
		obj.insert("required".to_string(), json!(["_placeholder"]));
	}
	walk_children(obj, &mut fill_empty_objects);
}

// endregion: --- Strict Passes

// region:    --- Support

fn scalar_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Hints appended to an existing description are parenthesized:
/// `"<old> (<hint>)"`; a missing description becomes just the hint.
fn with_hint(existing: Option<&str>, hint: &str) -> String {
	match existing {
		Some(desc) if !desc.is_empty() => format!("{desc} ({hint})"),
		_ => hint.to_string(),
	}
}

fn append_hint(obj: &mut Map<String, Value>, hint: &str) {
	let desc = with_hint(obj.get("description").and_then(Value::as_str), hint);
	obj.insert("description".to_string(), json!(desc));
}

// endregion: --- Support

// region:    --- Tests


// endregion: --- Tests
