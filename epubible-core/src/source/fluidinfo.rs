//! Fluidinfo record service client

use super::{RecordSource, SourceResult, HAS_READ_TAG};
use crate::error::SourceError;
use crate::types::{RecordSet, ValuesEnvelope};
use chrono::NaiveDate;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

/// Blocking client for the Fluidinfo `/values` and `/tags` endpoints
pub struct FluidinfoSource {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

#[derive(Serialize)]
struct NewTag<'a> {
    name: &'a str,
    description: &'a str,
    indexed: bool,
}

impl FluidinfoSource {
    /// Build a client authenticating as `username`
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> SourceResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| SourceError::Transport {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            base_url,
            username: username.into(),
            password: password.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }

    fn send(&self, url: &str, request: RequestBuilder) -> SourceResult<Response> {
        let response = self
            .authed(request)
            .send()
            .map_err(|source| SourceError::Transport {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        tracing::debug!(url, %status, "Record service responded");
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl RecordSource for FluidinfoSource {
    fn fetch_values(&self, tags: &[String], query: &str) -> SourceResult<RecordSet> {
        let url = format!("{}/values", self.base_url);
        let mut params: Vec<(&str, &str)> = tags.iter().map(|t| ("tag", t.as_str())).collect();
        params.push(("query", query));

        let response = self.send(&url, self.client.get(&url).query(&params))?;
        let envelope: ValuesEnvelope = response
            .json()
            .map_err(|e| SourceError::Decode(format!("{}: {}", url, e)))?;
        Ok(envelope.results)
    }

    fn mark_as_read(&self, username: &str, query: &str, date: NaiveDate) -> SourceResult<()> {
        let url = format!("{}/values", self.base_url);
        let mut payload = serde_json::Map::new();
        payload.insert(
            format!("{}/{}", username, HAS_READ_TAG),
            json!({ "value": date.to_string() }),
        );
        let payload = serde_json::Value::Object(payload);
        tracing::info!(query, %payload, "Updating objects");
        self.send(
            &url,
            self.client.put(&url).query(&[("query", query)]).json(&payload),
        )?;
        Ok(())
    }

    fn create_read_tag(&self, username: &str) -> SourceResult<()> {
        let url = format!("{}/tags/{}", self.base_url, username);
        let tag = NewTag {
            name: HAS_READ_TAG,
            description: "Indicates the referenced object has been read by the user on a \
                          particular date (stored as a string representation of ISO date).",
            indexed: false,
        };
        self.send(&url, self.client.post(&url).json(&tag))?;
        tracing::info!(username, "Created {} tag", HAS_READ_TAG);
        Ok(())
    }
}
