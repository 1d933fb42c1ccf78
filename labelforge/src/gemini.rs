//! Direct REST client for the Gemini `generateContent` surface.
//!
//! One attempt per call, no retry or backoff; failures map onto the
//! session's error taxonomy. Unlike the busy-flag layer above it, the
//! client does carry a wall-clock request timeout so a hung remote call
//! cannot hold the session lock forever.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::StudioConfig;
use crate::design::ImageData;
use crate::error::GenerationError;
use crate::schema::ResponseSchema;
use crate::service::GenerationService;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// Wall-clock cap per request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// Error bodies are truncated to this many bytes before being surfaced.
const MAX_ERROR_BODY: usize = 300;

/// Generation backend talking to the Gemini API over HTTPS.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    image_model: String,
    text_model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            image_model: DEFAULT_IMAGE_MODEL.into(),
            text_model: DEFAULT_TEXT_MODEL.into(),
        }
    }

    /// Build a client from stored configuration.
    pub fn from_config(config: &StudioConfig) -> Self {
        let mut client = Self::new(config.api_key.clone());
        client.base_url = config.base_url.clone();
        client.image_model = config.image_model.clone();
        client.text_model = config.text_model.clone();
        client
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_models(
        mut self,
        image_model: impl Into<String>,
        text_model: impl Into<String>,
    ) -> Self {
        self.image_model = image_model.into();
        self.text_model = text_model.into();
        self
    }

    async fn call_model(
        &self,
        model: &str,
        body: &Value,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::Service(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            body.truncate(MAX_ERROR_BODY);
            return Err(GenerationError::Service(format!(
                "generation API error ({status}): {body}"
            )));
        }

        resp.json::<GenerateContentResponse>()
            .await
            .map_err(|e| GenerationError::Service(format!("unreadable response: {e}")))
    }
}

#[async_trait::async_trait]
impl GenerationService for GeminiClient {
    async fn generate_image(
        &self,
        prompt: &str,
        references: &[ImageData],
    ) -> Result<ImageData, GenerationError> {
        let body = image_request_body(prompt, references);
        let resp = self.call_model(&self.image_model, &body).await?;
        first_image(&resp).ok_or(GenerationError::NoImage)?
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &ResponseSchema,
    ) -> Result<Value, GenerationError> {
        let body = structured_request_body(prompt, schema);
        let resp = self.call_model(&self.text_model, &body).await?;
        let text = first_text(&resp).ok_or_else(|| {
            GenerationError::Validation("response contained no text part".into())
        })?;
        let value: Value = serde_json::from_str(text)
            .map_err(|e| GenerationError::Validation(format!("response is not JSON: {e}")))?;
        schema.validate(&value)?;
        Ok(value)
    }
}

fn image_request_body(prompt: &str, references: &[ImageData]) -> Value {
    let mut parts = vec![json!({ "text": prompt })];
    for reference in references {
        parts.push(json!({
            "inlineData": {
                "mimeType": reference.mime,
                "data": reference.to_base64(),
            }
        }));
    }
    json!({
        "contents": [{ "parts": parts }],
        "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
    })
}

fn structured_request_body(prompt: &str, schema: &ResponseSchema) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema.to_wire(),
        },
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

/// First inline image part across all candidates, decoded.
fn first_image(resp: &GenerateContentResponse) -> Option<Result<ImageData, GenerationError>> {
    let inline = resp
        .candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|c| c.parts.iter())
        .find_map(|p| p.inline_data.as_ref())?;
    Some(
        ImageData::from_base64(inline.mime_type.clone(), &inline.data)
            .map_err(|e| GenerationError::Service(format!("invalid image payload: {e}"))),
    )
}

/// First text part across all candidates.
fn first_text(resp: &GenerateContentResponse) -> Option<&str> {
    resp.candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|c| c.parts.iter())
        .find_map(|p| p.text.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, FieldSpec};

    fn parse(raw: Value) -> GenerateContentResponse {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn image_body_inlines_references() {
        let reference = ImageData::new("image/png", vec![1, 2, 3]);
        let body = image_request_body("draw", std::slice::from_ref(&reference));
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["text"], "draw");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], reference.to_base64());
    }

    #[test]
    fn structured_body_declares_schema() {
        const FIELDS: &[FieldSpec] = &[FieldSpec::new("preset", FieldKind::String)];
        let body = structured_request_body("pick", &ResponseSchema::Object(FIELDS));
        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn first_image_decodes_inline_part() {
        let encoded = ImageData::new("image/png", vec![9, 9]).to_base64();
        let resp = parse(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "here you go" },
                    { "inlineData": { "mimeType": "image/png", "data": encoded } },
                ]}
            }]
        }));
        let image = first_image(&resp).unwrap().unwrap();
        assert_eq!(image.mime, "image/png");
        assert_eq!(image.data, vec![9, 9]);
    }

    #[test]
    fn first_image_none_for_text_only_response() {
        let resp = parse(json!({
            "candidates": [{ "content": { "parts": [{ "text": "sorry" }] } }]
        }));
        assert!(first_image(&resp).is_none());
    }

    #[test]
    fn first_image_rejects_bad_payload() {
        let resp = parse(json!({
            "candidates": [{
                "content": { "parts": [
                    { "inlineData": { "mimeType": "image/png", "data": "!!!" } },
                ]}
            }]
        }));
        assert!(first_image(&resp).unwrap().is_err());
    }

    #[test]
    fn first_text_skips_empty_candidates() {
        let resp = parse(json!({
            "candidates": [
                { "content": null },
                { "content": { "parts": [{ "text": "[\"a\"]" }] } },
            ]
        }));
        assert_eq!(first_text(&resp), Some("[\"a\"]"));
    }

    #[test]
    fn empty_response_has_no_parts() {
        let resp = parse(json!({}));
        assert!(first_text(&resp).is_none());
        assert!(first_image(&resp).is_none());
    }
}
