//! Model clients: a deterministic stub keyed by test-case id, and an HTTP
//! client for the Gemini `generateContent` endpoint.

use async_trait::async_trait;
use prompt_lab_core::{GenerationRequest, LabError, ModelClient, ModelSettings, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Build the client the settings ask for.
pub fn client_from_settings(settings: &ModelSettings) -> Result<Arc<dyn ModelClient>> {
    if settings.mock_mode {
        info!("Mock mode enabled, using canned responses");
        return Ok(Arc::new(StubModelClient::for_builtin_tasks()));
    }
    Ok(Arc::new(GeminiClient::new(settings.clone())?))
}

// ===== Stub Client =====

pub const STUB_FALLBACK_RESPONSE: &str = "Mock response - content not recognized";

const FRUIT_SOLUTION: &str = "Adım adım çözelim:

1. Elma fiyatına 'e', portakal fiyatına 'p' diyelim
2. Problemden: 5e + 3p = 42
3. Ayrıca: e = p + 2 (elma 2 TL daha pahalı)
4. İkinci denklemi birincide yerine koyalım: 5(p + 2) + 3p = 42
5. Açalım: 5p + 10 + 3p = 42
6. Birleştirelim: 8p + 10 = 42
7. 8p = 32
8. p = 4

Portakal fiyatı 4 TL, elma fiyatı: e = 4 + 2 = 6 TL

Yanıt: 1 kilo elma: 6 TL, 1 kilo portakal: 4 TL";

const CAFE_SOLUTION: &str = "Adım adım çözelim:

1. Kahve fiyatına 'k', çay fiyatına 'ç' diyelim
2. Problemden: 4k + 2ç = 26
3. Ayrıca: k = ç + 3 (kahve 3 TL daha pahalı)
4. İkinci denklemi birincide yerine koyalım: 4(ç + 3) + 2ç = 26
5. Açalım: 4ç + 12 + 2ç = 26
6. Birleştirelim: 6ç + 12 = 26
7. 6ç = 14
8. ç = 2.33... ≈ 2

Çay fiyatı 2 TL, kahve fiyatı: k = 2 + 3 = 5 TL

Yanıt: 1 kahve: 5 TL, 1 çay: 2 TL";

const TICKET_SOLUTION: &str = "Adım adım çözelim:

1. Çocuk biletine 'ç', yetişkin biletine 'y' diyelim
2. Problemden: 6ç + 4y = 84
3. Ayrıca: ç = y - 6 (çocuk bileti 6 TL daha ucuz)
4. İkinci denklemi birincide yerine koyalım: 6(y - 6) + 4y = 84
5. Açalım: 6y - 36 + 4y = 84
6. Birleştirelim: 10y - 36 = 84
7. 10y = 120
8. y = 12

Yetişkin bileti 12 TL, çocuk bileti: ç = 12 - 6 = 6 TL

Yanıt: Çocuk bileti: 6 TL, Yetişkin bileti: 12 TL";

/// Deterministic client answering by declared test-case id.
///
/// Lookup order: `(case_id, strategy)` override, then `case_id`, then the
/// fallback text. Every request is recorded.
#[derive(Debug, Default)]
pub struct StubModelClient {
    responses: HashMap<String, String>,
    strategy_responses: HashMap<(String, String), String>,
    failures: Vec<(String, Option<String>)>,
    fallback: Option<String>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl StubModelClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned answers for every test case of the built-in tasks.
    pub fn for_builtin_tasks() -> Self {
        Self::new()
            .with_response("equations-fruit", FRUIT_SOLUTION)
            .with_response("equations-cafe", CAFE_SOLUTION)
            .with_response("equations-tickets", TICKET_SOLUTION)
            .with_response("sentiment-weather", "Olumlu")
            .with_response("sentiment-traffic", "Olumsuz")
            .with_response("sentiment-meeting", "Nötr")
            .with_response("sentiment-book", "Olumlu")
            .with_response("sentiment-film", "Olumsuz")
    }

    pub fn with_response(mut self, case_id: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses.insert(case_id.into(), response.into());
        self
    }

    pub fn with_strategy_response(
        mut self,
        case_id: impl Into<String>,
        strategy: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.strategy_responses
            .insert((case_id.into(), strategy.into()), response.into());
        self
    }

    pub fn with_fallback(mut self, response: impl Into<String>) -> Self {
        self.fallback = Some(response.into());
        self
    }

    /// Fail every request for `case_id`, or only those using `strategy`.
    pub fn with_failure(mut self, case_id: impl Into<String>, strategy: Option<&str>) -> Self {
        self.failures
            .push((case_id.into(), strategy.map(str::to_string)));
        self
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    fn should_fail(&self, request: &GenerationRequest) -> bool {
        self.failures.iter().any(|(case_id, strategy)| {
            *case_id == request.case_id
                && strategy.as_deref().map_or(true, |s| s == request.strategy)
        })
    }
}

#[async_trait]
impl ModelClient for StubModelClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        if self.should_fail(request) {
            return Err(LabError::ModelGeneration(format!(
                "stub configured to fail for case '{}'",
                request.case_id
            )));
        }

        let key = (request.case_id.clone(), request.strategy.clone());
        let response = self
            .strategy_responses
            .get(&key)
            .or_else(|| self.responses.get(&request.case_id))
            .cloned()
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| STUB_FALLBACK_RESPONSE.to_string());

        Ok(response)
    }

    fn name(&self) -> &str {
        "stub"
    }
}

// ===== Gemini Client =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        Some(text)
    }
}

/// Client for Gemini's REST `generateContent` endpoint.
///
/// A 429 response is retried after `rate_limit_backoff_secs * attempt`
/// seconds while attempts remain; any other failure is returned at once.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    settings: ModelSettings,
    api_key: String,
}

impl GeminiClient {
    pub fn new(settings: ModelSettings) -> Result<Self> {
        let api_key = settings.api_key.clone().ok_or_else(|| {
            LabError::Configuration("an API key is required when mock mode is off".to_string())
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LabError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            settings,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.name
        )
    }

    async fn attempt(&self, prompt: &str) -> std::result::Result<String, AttemptError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
            },
        };

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AttemptError::Fatal(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AttemptError::RateLimited);
        }
        let text = response
            .text()
            .await
            .map_err(|e| AttemptError::Fatal(e.to_string()))?;
        if !status.is_success() {
            return Err(AttemptError::Fatal(format!("HTTP {status}: {text}")));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| AttemptError::Fatal(e.to_string()))?;
        parsed
            .text()
            .map(|t| t.trim().to_string())
            .ok_or_else(|| AttemptError::Fatal("response contained no candidates".to_string()))
    }
}

enum AttemptError {
    RateLimited,
    Fatal(String),
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let attempts = self.settings.max_retries.max(1);

        for attempt in 0..attempts {
            debug!(case_id = %request.case_id, attempt, "Sending generateContent request");
            match self.attempt(&request.prompt).await {
                Ok(text) => return Ok(text),
                Err(AttemptError::RateLimited) if attempt + 1 < attempts => {
                    let wait = self.settings.rate_limit_backoff_secs * u64::from(attempt + 1);
                    warn!("Rate limit hit. Waiting {} seconds...", wait);
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
                Err(AttemptError::RateLimited) => {
                    return Err(LabError::ModelGeneration(
                        "rate limited (HTTP 429), retries exhausted".to_string(),
                    ));
                }
                Err(AttemptError::Fatal(message)) => {
                    return Err(LabError::ModelGeneration(message));
                }
            }
        }

        Err(LabError::ModelGeneration("no attempts made".to_string()))
    }

    fn name(&self) -> &str {
        &self.settings.name
    }
}
