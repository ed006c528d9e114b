use serde_json::{Value, json};

/// Static catalog behind `GET /v1/models`: the model ids this proxy fronts.
pub struct CatalogModel {
	pub id: &'static str,
	pub owned_by: &'static str,
}

pub const MODEL_CATALOG: &[CatalogModel] = &[
	CatalogModel {
		id: "gemini-3-pro",
		owned_by: "google",
	},
	CatalogModel {
		id: "gemini-3-pro-high",
		owned_by: "google",
	},
	CatalogModel {
		id: "gemini-3-pro-low",
		owned_by: "google",
	},
	CatalogModel {
		id: "gemini-3-flash",
		owned_by: "google",
	},
	CatalogModel {
		id: "gemini-2.5-flash",
		owned_by: "google",
	},
	CatalogModel {
		id: "claude-sonnet-4-5",
		owned_by: "anthropic",
	},
	CatalogModel {
		id: "claude-sonnet-4-5-thinking",
		owned_by: "anthropic",
	},
	CatalogModel {
		id: "claude-opus-4-5-thinking",
		owned_by: "anthropic",
	},
];

pub fn models_payload(created: u64) -> Value {
	let data: Vec<Value> = MODEL_CATALOG
		.iter()
		.map(|model| {
			json!({
				"id": model.id,
				"object": "model",
				"created": created,
				"owned_by": model.owned_by,
			})
		})
		.collect();

	json!({"object": "list", "data": data})
}

// region:    --- Tests


// endregion: --- Tests
