//! Gemini API client for text generation.

use serde::{Deserialize, Serialize};
use tracing::debug;

const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

/// Fixed reply used when the model returns an empty completion.
pub const FALLBACK_REPLY: &str = "⚠️ Sorry, I couldn't understand that.";

pub struct GeminiClient {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    message: String,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug)]
pub enum GeminiError {
    Http(String),
    Api(String),
    Parse(String),
}

impl std::fmt::Display for GeminiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeminiError::Http(e) => write!(f, "HTTP error: {e}"),
            GeminiError::Api(e) => write!(f, "API error: {e}"),
            GeminiError::Parse(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for GeminiError {}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Generate a text completion for the given prompt.
    ///
    /// An empty completion yields [`FALLBACK_REPLY`] rather than an error.
    pub async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = format!("{}?key={}", GEMINI_API_URL, self.api_key);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeminiError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GeminiError::Http(format!("failed to read response: {e}")))?;

        debug!("Gemini response status: {status}");

        if !status.is_success() {
            return Err(GeminiError::Api(format!("{status}: {body}")));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| GeminiError::Parse(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(GeminiError::Api(error.message));
        }

        let text = collect_text(&parsed);
        if text.trim().is_empty() {
            return Ok(FALLBACK_REPLY.to_string());
        }
        Ok(text)
    }
}

/// Concatenate the text parts of the first candidate.
fn collect_text(response: &GenerateResponse) -> String {
    let mut text = String::new();
    if let Some(candidates) = &response.candidates {
        if let Some(content) = candidates.first().and_then(|c| c.content.as_ref()) {
            for part in &content.parts {
                if let Some(t) = &part.text {
                    text.push_str(t);
                }
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> GenerateResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_collect_text_single_part() {
        let response = parse(
            r#"{"candidates": [{"content": {"parts": [{"text": "hello"}]}}]}"#,
        );
        assert_eq!(collect_text(&response), "hello");
    }

    #[test]
    fn test_collect_text_joins_parts() {
        let response = parse(
            r#"{"candidates": [{"content": {"parts": [{"text": "a"}, {"text": "b"}]}}]}"#,
        );
        assert_eq!(collect_text(&response), "ab");
    }

    #[test]
    fn test_collect_text_empty_when_no_candidates() {
        let response = parse(r#"{}"#);
        assert_eq!(collect_text(&response), "");
    }

    #[test]
    fn test_collect_text_skips_partless_content() {
        let response = parse(r#"{"candidates": [{"content": {}}]}"#);
        assert_eq!(collect_text(&response), "");
    }

    #[test]
    fn test_api_error_deserializes() {
        let response = parse(r#"{"error": {"message": "quota exceeded"}}"#);
        assert_eq!(response.error.unwrap().message, "quota exceeded");
    }
}
