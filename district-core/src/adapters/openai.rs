//! Chat-completion region describer
//!
//! Asks an OpenAI-compatible `/chat/completions` endpoint for a one-line
//! description of a region. One attempt per call, bounded by the client
//! timeout. The API key is sent as a bearer token and never appears in
//! errors, logs or `Debug` output.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::{Config, EnrichmentConfig};
use crate::domain::result::{Error, Result};
use crate::ports::RegionDescriber;

const SYSTEM_PROMPT: &str = "지역 정보를 제공하는 전문가 역할입니다.";
const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 100;

fn user_prompt(region_name: &str) -> String {
    format!(
        "'{}' 지역의 특색 있는 정보를 간결하게 한 문장으로 작성해 주세요. 구체적이고 흥미로운 내용을 포함해주세요.",
        region_name
    )
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiDescriber {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl fmt::Debug for OpenAiDescriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiDescriber")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiDescriber {
    /// Build from configuration, reading the key from the environment
    ///
    /// Returns `Error::Config` when no key is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = Config::api_key().ok_or_else(|| {
            Error::Config(format!(
                "{} is not set; region descriptions are unavailable",
                crate::config::API_KEY_ENV
            ))
        })?;
        Self::new(&api_key, &config.enrichment)
    }

    pub fn new(api_key: &str, settings: &EnrichmentConfig) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Config("API key cannot be empty".to_string()));
        }

        let timeout = Duration::from_secs(settings.timeout_secs.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            timeout,
        })
    }

    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Enrichment(format!(
                "request timed out after {} seconds",
                self.timeout.as_secs()
            ))
        } else if error.is_connect() {
            Error::Enrichment("unable to connect to the text service".to_string())
        } else {
            // reqwest errors carry the URL only, never headers
            Error::Enrichment(format!("request failed: {}", error))
        }
    }

    fn check_status(status: u16) -> Result<()> {
        match status {
            200..=299 => Ok(()),
            401 | 403 => Err(Error::Enrichment(
                "authentication failed; check the API key".to_string(),
            )),
            429 => Err(Error::Enrichment("rate limit exceeded".to_string())),
            status => Err(Error::Enrichment(format!("text service error: HTTP {}", status))),
        }
    }
}

impl RegionDescriber for OpenAiDescriber {
    fn name(&self) -> &str {
        "openai"
    }

    fn describe(&self, region_name: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt(region_name)},
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, region = region_name, "requesting region description");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .map_err(|e| self.map_request_error(e))?;

        Self::check_status(response.status().as_u16())?;

        let parsed: CompletionResponse = response
            .json()
            .map_err(|e| Error::Enrichment(format!("malformed response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::Enrichment("response contained no text".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock_server::{MockResponse, MockServer};

    fn settings(base_url: &str) -> EnrichmentConfig {
        EnrichmentConfig {
            model: "gpt-4o".to_string(),
            base_url: base_url.to_string(),
            timeout_secs: 2,
        }
    }

    #[test]
    fn test_reject_empty_api_key() {
        let err = OpenAiDescriber::new("  ", &settings("http://localhost")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let describer = OpenAiDescriber::new("sk-secret-value", &settings("http://localhost/")).unwrap();
        let debug = format!("{:?}", describer);
        assert!(!debug.contains("sk-secret-value"));
        assert!(debug.contains("http://localhost\""));
    }

    #[test]
    fn test_describe_sends_prompt_and_trims_reply() {
        let server = MockServer::start(vec![(
            "/chat/completions",
            MockResponse::json(
                r#"{"choices":[{"message":{"role":"assistant","content":"  역삼동은 IT 기업이 밀집한 지역입니다. \n"}}]}"#,
            ),
        )])
        .unwrap();

        let describer = OpenAiDescriber::new("sk-test", &settings(&server.base_url())).unwrap();
        let text = describer.describe("역삼동").unwrap();
        assert_eq!(text, "역삼동은 IT 기업이 밀집한 지역입니다.");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("POST /chat/completions"));
        assert!(requests[0].contains("Bearer sk-test"));
        assert!(requests[0].contains("'역삼동' 지역의"));
        assert!(requests[0].contains("\"max_tokens\":100"));
    }

    #[test]
    fn test_failures_map_to_enrichment_errors() {
        let server = MockServer::start(vec![
            ("/bad/chat/completions", MockResponse::status(401)),
            ("/empty/chat/completions", MockResponse::json(r#"{"choices":[]}"#)),
            ("/junk/chat/completions", MockResponse::json("not json")),
        ])
        .unwrap();

        for prefix in ["bad", "empty", "junk"] {
            let base = format!("{}/{}", server.base_url(), prefix);
            let describer = OpenAiDescriber::new("sk-test", &settings(&base)).unwrap();
            let err = describer.describe("역삼동").unwrap_err();
            assert!(matches!(err, Error::Enrichment(_)), "{prefix}: {err:?}");
            assert!(!err.to_string().contains("sk-test"));
        }
    }

    #[test]
    fn test_timeout_is_bounded() {
        let server = MockServer::start(vec![(
            "/chat/completions",
            MockResponse::json(r#"{"choices":[]}"#).with_delay(3_000),
        )])
        .unwrap();

        let mut slow = settings(&server.base_url());
        slow.timeout_secs = 1;
        let describer = OpenAiDescriber::new("sk-test", &slow).unwrap();
        let err = describer.describe("역삼동").unwrap_err();
        assert!(matches!(err, Error::Enrichment(_)));
    }
}
