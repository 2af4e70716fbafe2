mod client;
mod basic;
pub mod auth;

pub use client::HttpClient;
pub use basic::BasicClient;

use anyhow::{Context, Result, anyhow};

/// Issues a GET to `url` with the given query pairs and returns the decoded
/// JSON body. Non-2xx responses are errors carrying the status and body.
pub async fn fetch_json<C: HttpClient>(
    client: &C,
    url: &str,
    query: &[(&str, &str)],
) -> Result<serde_json::Value> {
    let mut url: reqwest::Url = url.parse().with_context(|| format!("invalid url '{url}'"))?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in query {
            pairs.append_pair(k, v);
        }
    }

    let req = reqwest::Request::new(reqwest::Method::GET, url.clone());

    let resp = client
        .execute(req)
        .await
        .with_context(|| format!("request to {url} failed"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow!("{url} returned status {status}: {body}"));
    }

    resp.json()
        .await
        .with_context(|| format!("failed to parse JSON from {url}"))
}
