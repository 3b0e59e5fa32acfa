//! HTTP client for the conferencing provider.
//!
//! Wraps the provider's server-to-server flow:
//! 1. POST {auth}/oauth/token with the account-credentials grant
//! 2. POST /users/me/meetings to schedule a meeting
//! 3. DELETE /meetings/{id} to remove one
//! 4. GET /meetings/{id}/recordings for share/download URLs
//!
//! Token fetch and recording lookup are idempotent and retried with
//! exponential backoff; scheduling and deletion are not blindly retried.

use std::env;
use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};
use url::Url;

use super::error::ConferencingError;
use super::types::{MeetingRecording, MeetingSpec, RecordingFile, ScheduledMeeting};

/// Default API and auth hosts for the provider.
const DEFAULT_API_BASE: &str = "https://api.zoom.us/v2";
const DEFAULT_AUTH_BASE: &str = "https://zoom.us";

/// Seconds shaved off a token's lifetime so we refresh before expiry.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

/// Configuration for the conferencing client.
#[derive(Debug, Clone)]
pub struct ConferencingConfig {
    /// Base URL for the meetings API
    pub api_base: String,
    /// Base URL for the OAuth token endpoint
    pub auth_base: String,
    /// Provider account id for the account-credentials grant
    pub account_id: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Maximum attempts for idempotent calls
    pub max_attempts: u32,
    /// Base delay between retries (grows exponentially)
    pub retry_base_delay: Duration,
}

impl ConferencingConfig {
    /// Builds a config from `CONFERENCING_*` environment variables.
    pub fn from_env() -> Result<Self, ConferencingError> {
        let require = |key: &str| {
            env::var(key).map_err(|_| ConferencingError::Config {
                message: format!("{key} not set"),
            })
        };

        let api_base = env::var("CONFERENCING_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into());
        let auth_base =
            env::var("CONFERENCING_AUTH_BASE").unwrap_or_else(|_| DEFAULT_AUTH_BASE.into());
        Url::parse(&api_base)?;
        Url::parse(&auth_base)?;

        Ok(Self {
            api_base,
            auth_base,
            account_id: require("CONFERENCING_ACCOUNT_ID")?,
            client_id: require("CONFERENCING_CLIENT_ID")?,
            client_secret: require("CONFERENCING_CLIENT_SECRET")?,
            max_attempts: 3,
            retry_base_delay: Duration::from_millis(500),
        })
    }
}

/// A bearer token with its refresh deadline.
struct CachedToken {
    token: String,
    fetched_at: Instant,
    ttl: Duration,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }
}

/// Client for the conferencing provider's meeting API.
pub struct ConferencingClient {
    client: Client,
    config: ConferencingConfig,
    /// Tokens outlive many requests; cache until shortly before expiry.
    token: tokio::sync::Mutex<Option<CachedToken>>,
}

impl ConferencingClient {
    pub fn new(config: ConferencingConfig) -> Result<Self, ConferencingError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ConferencingError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            config,
            token: tokio::sync::Mutex::new(None),
        })
    }

    /// Returns a bearer token, fetching a fresh one if the cached token is
    /// missing or about to expire.
    pub async fn access_token(&self) -> Result<String, ConferencingError> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.is_fresh() {
                return Ok(cached.token.clone());
            }
        }

        let (token, ttl) = self
            .retry_idempotent("access_token", || self.fetch_token())
            .await?;
        *guard = Some(CachedToken {
            token: token.clone(),
            fetched_at: Instant::now(),
            ttl,
        });
        Ok(token)
    }

    async fn fetch_token(&self) -> Result<(String, Duration), ConferencingError> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            #[serde(default)]
            expires_in: Option<u64>,
        }

        let url = format!("{}/oauth/token", self.config.auth_base);
        debug!(url = %url, "Requesting provider access token");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .query(&[
                ("grant_type", "account_credentials"),
                ("account_id", self.config.account_id.as_str()),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let body = response.text().await.unwrap_or_default();
                Err(ConferencingError::Auth { message: body })
            }
            status if status.is_success() => {
                let parsed: TokenResponse =
                    response
                        .json()
                        .await
                        .map_err(|e| ConferencingError::UnexpectedResponse {
                            message: format!("Malformed token response: {}", e),
                        })?;
                let ttl = Duration::from_secs(
                    parsed
                        .expires_in
                        .unwrap_or(3600)
                        .saturating_sub(TOKEN_EXPIRY_MARGIN_SECS),
                );
                Ok((parsed.access_token, ttl))
            }
            status => Err(ConferencingError::UnexpectedResponse {
                message: format!("Token endpoint returned status {}", status),
            }),
        }
    }

    /// Schedules a meeting. Scheduling is not idempotent upstream, so a
    /// failed call is surfaced to the caller rather than retried.
    pub async fn create_meeting(
        &self,
        spec: &MeetingSpec,
    ) -> Result<ScheduledMeeting, ConferencingError> {
        #[derive(Deserialize)]
        struct CreateResponse {
            id: i64,
            join_url: String,
            #[serde(default)]
            password: String,
        }

        let token = self.access_token().await?;
        let url = format!("{}/users/me/meetings", self.config.api_base);
        info!(topic = %spec.topic, start = %spec.start_time, "Scheduling provider meeting");

        let body = json!({
            "topic": spec.topic,
            "type": 2,
            "start_time": spec.start_time.to_rfc3339(),
            "duration": spec.duration_minutes,
            "timezone": spec.timezone,
            "settings": {
                "host_video": true,
                "participant_video": true,
                "join_before_host": true,
                "waiting_room": false,
                "auto_recording": "cloud",
            },
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Meeting creation failed");
            return Err(ConferencingError::UnexpectedResponse {
                message: format!("Meeting creation returned status {}: {}", status, body),
            });
        }

        let parsed: CreateResponse =
            response
                .json()
                .await
                .map_err(|e| ConferencingError::UnexpectedResponse {
                    message: format!("Malformed meeting response: {}", e),
                })?;

        Ok(ScheduledMeeting {
            provider_id: parsed.id.to_string(),
            join_url: parsed.join_url,
            password: parsed.password,
        })
    }

    /// Deletes a provider-side meeting. Missing meetings surface as
    /// `NotFound` so callers can decide whether that is fatal.
    pub async fn delete_meeting(&self, provider_id: &str) -> Result<(), ConferencingError> {
        let token = self.access_token().await?;
        let url = format!("{}/meetings/{}", self.config.api_base, provider_id);
        info!(provider_id = %provider_id, "Deleting provider meeting");

        let response = self.client.delete(&url).bearer_auth(&token).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ConferencingError::NotFound {
                message: format!("meeting {} does not exist", provider_id),
            }),
            status if status.is_success() => Ok(()),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ConferencingError::UnexpectedResponse {
                    message: format!("Meeting deletion returned status {}: {}", status, body),
                })
            }
        }
    }

    /// Fetches recording URLs for a meeting. Recordings appear some time
    /// after a meeting ends; until then the provider answers 404, surfaced
    /// here as `NotFound`.
    pub async fn recording(&self, provider_id: &str) -> Result<MeetingRecording, ConferencingError> {
        let token = self.access_token().await?;
        self.retry_idempotent("recording", || self.fetch_recording(&token, provider_id))
            .await
    }

    async fn fetch_recording(
        &self,
        token: &str,
        provider_id: &str,
    ) -> Result<MeetingRecording, ConferencingError> {
        #[derive(Deserialize)]
        struct RecordingResponse {
            #[serde(default)]
            share_url: String,
            #[serde(default)]
            recording_files: Vec<RecordingFileRaw>,
        }

        #[derive(Deserialize)]
        struct RecordingFileRaw {
            download_url: String,
            #[serde(default)]
            file_type: String,
        }

        let url = format!("{}/meetings/{}/recordings", self.config.api_base, provider_id);
        debug!(provider_id = %provider_id, "Fetching recording URLs");

        let response = self.client.get(&url).bearer_auth(&token).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ConferencingError::NotFound {
                message: format!("no recording available for meeting {}", provider_id),
            }),
            status if status.is_success() => {
                let parsed: RecordingResponse =
                    response
                        .json()
                        .await
                        .map_err(|e| ConferencingError::UnexpectedResponse {
                            message: format!("Malformed recording response: {}", e),
                        })?;
                Ok(MeetingRecording {
                    share_url: parsed.share_url,
                    files: parsed
                        .recording_files
                        .into_iter()
                        .map(|f| RecordingFile {
                            download_url: f.download_url,
                            file_type: f.file_type,
                        })
                        .collect(),
                })
            }
            status => Err(ConferencingError::UnexpectedResponse {
                message: format!("Recording lookup returned status {}", status),
            }),
        }
    }

    /// Runs an idempotent operation with up to `max_attempts` tries,
    /// backing off exponentially between attempts.
    async fn retry_idempotent<T, F, Fut>(
        &self,
        what: &str,
        mut op: F,
    ) -> Result<T, ConferencingError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ConferencingError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.config.max_attempts => {
                    let delay = self.retry_delay(attempt);
                    warn!(
                        operation = what,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after transient provider failure"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Calculates retry delay with exponential backoff and jitter.
    fn retry_delay(&self, attempt: u32) -> Duration {
        let base = self.config.retry_base_delay.as_millis() as u64;
        // Exponential backoff: base * 2^min(attempt-1, 5)
        let exponential = base * 2u64.pow(attempt.saturating_sub(1).min(5));
        // Cap at 10 seconds
        let capped = exponential.min(10_000);
        // Add jitter: 0-20% of the delay
        let jitter = rand::thread_rng().gen_range(0..=(capped / 5));
        Duration::from_millis(capped + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ConferencingConfig {
        ConferencingConfig {
            api_base: DEFAULT_API_BASE.to_string(),
            auth_base: DEFAULT_AUTH_BASE.to_string(),
            account_id: "acct".to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            max_attempts: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_retry_delay_backoff() {
        let client = ConferencingClient::new(test_config()).unwrap();

        let d1 = client.retry_delay(1);
        let d2 = client.retry_delay(2);
        let d3 = client.retry_delay(3);

        // Each should be roughly double (with jitter)
        assert!(d2 > d1);
        assert!(d3 > d2);
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let client = ConferencingClient::new(test_config()).unwrap();
        // Far past the exponent clamp; jitter adds at most 20%.
        assert!(client.retry_delay(30) <= Duration::from_millis(12_000));
    }

    #[test]
    fn test_cached_token_freshness() {
        let cached = CachedToken {
            token: "t".to_string(),
            fetched_at: Instant::now(),
            ttl: Duration::from_secs(3600),
        };
        assert!(cached.is_fresh());

        let expired = CachedToken {
            token: "t".to_string(),
            fetched_at: Instant::now(),
            ttl: Duration::ZERO,
        };
        assert!(!expired.is_fresh());
    }
}
