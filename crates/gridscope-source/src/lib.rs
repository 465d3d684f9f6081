// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use gridscope_app::{DetailPayload, Row, RowKey};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

const GRID_PATH: &str = "grid";

/// Grid rows and per-row details served as JSON over HTTP.
///
/// `GET {base_url}/grid` returns an array of row objects and
/// `GET {base_url}/grid/{key}` returns one detail object.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: Url,
    http: HttpClient,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("source.base_url must not be empty");
        }
        let base_url = Url::parse(trimmed)
            .with_context(|| format!("source.base_url {trimmed:?} is not a valid URL"))?;
        if base_url.cannot_be_a_base() {
            bail!("source.base_url {trimmed:?} must be an http(s) URL");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn fetch_grid_data(&self) -> Result<Vec<Row>> {
        let url = self.endpoint(&[GRID_PATH])?;
        debug!(%url, "fetching grid rows");
        let response = self.send(&url)?;
        decode(response, &url, "grid rows")
    }

    pub fn fetch_item_details(&self, key: &RowKey) -> Result<DetailPayload> {
        let url = self.endpoint(&[GRID_PATH, key.as_str()])?;
        debug!(%url, key = %key, "fetching item details");
        let response = self.send(&url)?;
        decode(response, &url, &format!("details for {key}"))
    }

    pub fn ping(&self) -> Result<()> {
        let url = self.endpoint(&[GRID_PATH])?;
        self.send(&url).map(|_| ())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("source.base_url {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send(&self, url: &Url) -> Result<Response> {
        let response = self.http.get(url.clone()).send().with_context(|| {
            format!(
                "cannot reach {}; check that the grid service is running and source.base_url is correct",
                self.base_url
            )
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(status_error(status, url, &body))
    }
}

fn decode<T: DeserializeOwned>(response: Response, url: &Url, what: &str) -> Result<T> {
    let body = response
        .text()
        .with_context(|| format!("read {what} from {url}"))?;
    serde_json::from_str(&body).with_context(|| {
        format!(
            "decode {what} from {url}; body was: {}",
            truncate(body.trim(), 200)
        )
    })
}

fn status_error(status: StatusCode, url: &Url, body: &str) -> anyhow::Error {
    let detail = body.trim();
    let detail = if detail.is_empty() {
        String::new()
    } else {
        format!(": {}", truncate(detail, 200))
    };
    match status {
        StatusCode::NOT_FOUND => anyhow!("{url} returned 404 not found{detail}"),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            anyhow!("{url} timed out ({status}){detail}; raise source.timeout or retry")
        }
        _ => anyhow!("{url} returned {status}{detail}"),
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_owned();
    }
    let mut out = value.chars().take(max_chars).collect::<String>();
    out.push('…');
    out
}
