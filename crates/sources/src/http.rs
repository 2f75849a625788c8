//! Shared blocking HTTP client for source adapters.
//!
//! Handles retry with exponential backoff, Retry-After on 429, and maps
//! status classes onto [`SourceError`]s: auth and client errors fail
//! immediately, 429/5xx and transport errors retry up to [`MAX_RETRIES`]
//! times. Every request carries the client's fixed timeout, so a hung
//! source surfaces as an ordinary recorded failure.

use std::thread;
use std::time::Duration;

use gmselect_pipeline::SourceError;

pub(crate) const MAX_RETRIES: u32 = 3;
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 30;
pub(crate) const USER_AGENT: &str = concat!("gmselect/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub(crate) struct SourceClient {
    http: reqwest::blocking::Client,
    source_name: String,
}

enum Attempt<T> {
    Done(Result<T, SourceError>),
    Retry(String, u64),
}

impl SourceClient {
    pub(crate) fn new(source_name: &str) -> Result<Self, SourceError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SourceError::new(source_name, format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            source_name: source_name.to_string(),
        })
    }

    /// Make a request with retry + exponential backoff, parsing the
    /// response as JSON. `build_request` is called once per attempt and
    /// must return a fully configured builder (URL, headers, body).
    pub(crate) fn request_json_with_retry(
        &self,
        build_request: impl Fn(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<serde_json::Value, SourceError> {
        self.request_with_retry(build_request, |resp, source| {
            let text = resp.text().map_err(|e| {
                SourceError::new(source, format!("failed to read response body: {e}"))
            })?;
            // tolerate BOM-prefixed responses
            let trimmed = text.trim_start_matches('\u{feff}');
            serde_json::from_str(trimmed).map_err(|e| {
                SourceError::new(
                    source,
                    format!(
                        "failed to parse JSON response: {e} (body: {})",
                        &trimmed[..trimmed.len().min(200)]
                    ),
                )
            })
        })
    }

    /// Like [`Self::request_json_with_retry`] but returns the raw body
    /// bytes. Used for artifact (zip) downloads.
    pub(crate) fn request_bytes_with_retry(
        &self,
        build_request: impl Fn(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<Vec<u8>, SourceError> {
        self.request_with_retry(build_request, |resp, source| {
            resp.bytes()
                .map(|b| b.to_vec())
                .map_err(|e| SourceError::new(source, format!("failed to read response body: {e}")))
        })
    }

    fn request_with_retry<T>(
        &self,
        build_request: impl Fn(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
        read_body: impl Fn(reqwest::blocking::Response, &str) -> Result<T, SourceError>,
    ) -> Result<T, SourceError> {
        let mut backoff_secs = 1u64;

        for attempt in 0..=MAX_RETRIES {
            let outcome = match build_request(&self.http).send() {
                Ok(resp) => self.classify(resp, attempt, backoff_secs, &read_body),
                Err(e) => {
                    if attempt == MAX_RETRIES {
                        Attempt::Done(Err(SourceError::new(
                            &self.source_name,
                            format!("upstream error after {MAX_RETRIES} attempts: {e}"),
                        )))
                    } else {
                        Attempt::Retry(e.to_string(), backoff_secs)
                    }
                }
            };

            match outcome {
                Attempt::Done(result) => return result,
                Attempt::Retry(reason, wait) => {
                    eprintln!(
                        "warning: {} retry {}/{} in {}s ({})",
                        self.source_name,
                        attempt + 1,
                        MAX_RETRIES,
                        wait,
                        reason,
                    );
                    thread::sleep(Duration::from_secs(wait));
                    backoff_secs *= 2;
                }
            }
        }

        unreachable!()
    }

    fn classify<T>(
        &self,
        resp: reqwest::blocking::Response,
        attempt: u32,
        backoff_secs: u64,
        read_body: &impl Fn(reqwest::blocking::Response, &str) -> Result<T, SourceError>,
    ) -> Attempt<T> {
        let status = resp.status().as_u16();

        // Auth errors: fail immediately
        if status == 401 || status == 403 {
            return Attempt::Done(Err(SourceError::new(
                &self.source_name,
                format!("auth failed (HTTP {status})"),
            )));
        }

        // Other non-retryable 4xx: fail immediately
        if (400..500).contains(&status) && status != 429 {
            let body = resp.text().unwrap_or_default();
            return Attempt::Done(Err(SourceError::new(
                &self.source_name,
                format!("request rejected (HTTP {status}): {}", &body[..body.len().min(200)]),
            )));
        }

        // Retryable: 429, 5xx
        if status == 429 || status >= 500 {
            if attempt == MAX_RETRIES {
                return Attempt::Done(Err(SourceError::new(
                    &self.source_name,
                    format!("HTTP {status} after {MAX_RETRIES} attempts"),
                )));
            }
            let wait = if status == 429 {
                resp.headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(backoff_secs)
            } else {
                backoff_secs
            };
            return Attempt::Retry(format!("HTTP {status}"), wait);
        }

        Attempt::Done(read_body(resp, &self.source_name))
    }
}
