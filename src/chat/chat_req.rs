use serde::Deserialize;
use serde_json::Value;

// region:    --- ChatCompletionRequest

/// Body of `POST /v1/chat/completions` (OpenAI Chat Completions wire form).
///
/// Only the fields the proxy acts on are typed; everything else is ignored.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionRequest {
	pub model: Option<String>,
	#[serde(default)]
	pub messages: Vec<ChatMessage>,
	pub tools: Option<Vec<ToolDef>>,
	pub stream: Option<bool>,
	pub temperature: Option<f64>,
	pub max_tokens: Option<u32>,
	pub top_p: Option<f64>,
	/// Scalar or list of stop sequences.
	pub stop: Option<Value>,
	pub reasoning_effort: Option<ReasoningEffort>,
}

// endregion: --- ChatCompletionRequest

// region:    --- ChatMessage

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
	pub role: ChatRole,
	#[serde(default)]
	pub content: Option<MessageContent>,
	pub tool_calls: Option<Vec<ToolCallEntry>>,
	pub tool_call_id: Option<String>,
	pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
	System,
	User,
	Assistant,
	Tool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
	Text(String),
	Parts(Vec<ContentPart>),
}

impl MessageContent {
	/// The plain-string content, if this message carried one.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			MessageContent::Text(text) => Some(text),
			MessageContent::Parts(_) => None,
		}
	}

	/// All text parts joined (string content is returned as-is).
	pub fn joined_texts(&self) -> String {
		match self {
			MessageContent::Text(text) => text.clone(),
			MessageContent::Parts(parts) => {
				let texts: Vec<&str> = parts
					.iter()
					.filter_map(|p| match p {
						ContentPart::Text { text } => Some(text.as_str()),
						ContentPart::ImageUrl { .. } => None,
					})
					.collect();
				texts.join("\n")
			}
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
	Text { text: String },
	ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Deserialize)]
pub struct ImageUrl {
	pub url: String,
}

// endregion: --- ChatMessage

// region:    --- Tools

/// An assistant tool-call record (`message.tool_calls[]`).
#[derive(Debug, Deserialize)]
pub struct ToolCallEntry {
	pub id: Option<String>,
	pub function: FunctionCallEntry,
}

#[derive(Debug, Deserialize)]
pub struct FunctionCallEntry {
	pub name: String,
	/// Arguments as a JSON-encoded string, per the OpenAI wire form.
	#[serde(default)]
	pub arguments: String,
}

/// A tool declaration (`tools[]`).
#[derive(Debug, Deserialize)]
pub struct ToolDef {
	pub function: FunctionDecl,
}

#[derive(Debug, Deserialize)]
pub struct FunctionDecl {
	pub name: String,
	#[serde(default)]
	pub description: String,
	pub parameters: Option<Value>,
}

// endregion: --- Tools

// region:    --- ReasoningEffort

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
	Minimal,
	Low,
	Medium,
	High,
}

// endregion: --- ReasoningEffort
