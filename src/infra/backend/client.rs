use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::ConsoleConfig;
use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, HttpClient, fetch_json};
use crate::period::Window;
use crate::sources::records::{
    BookingRecord, CourtRecord, CourtUsageRecord, RevenueSnapshot, UserRecord,
};
use crate::sources::{Credential, DashboardApi, coerce};

const USERS_PATH: &str = "/users";
const BOOKINGS_PATH: &str = "/bookings";
const COURTS_PATH: &str = "/courts";
const COURT_USAGE_PATH: &str = "/courts/usage-stats";
const REVENUE_PATH: &str = "/dashboard/revenue";
const EQUIPMENT_ISSUES_PATH: &str = "/equipment/issues";
const VENUE_MAINTENANCE_PATH: &str = "/venues/maintenance";

/// REST implementation of [`DashboardApi`].
pub struct BackendClient<C = BasicClient> {
    base_url: String,
    http: C,
}

impl BackendClient<BasicClient> {
    pub fn from_config(config: &ConsoleConfig) -> Result<Self> {
        let http = BasicClient::with_timeouts(config.request_timeout, config.connect_timeout)?;
        Ok(Self::new(&config.api_base_url, http))
    }
}

impl<C: HttpClient> BackendClient<C> {
    pub fn new(base_url: &str, http: C) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(
        &self,
        credential: &Credential,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Value> {
        let authed = ApiKey::bearer(&self.http, credential.token())?;
        let url = self.endpoint(path);
        debug!(url = %url, ?query, "GET");
        fetch_json(&authed, &url, query).await
    }
}

#[async_trait]
impl<C: HttpClient> DashboardApi for BackendClient<C> {
    async fn users(&self, credential: &Credential) -> Result<Vec<UserRecord>> {
        let payload = self.get(credential, USERS_PATH, &[]).await?;
        coerce::collect(&payload, &["users"], coerce::user)
    }

    async fn bookings(&self, credential: &Credential) -> Result<Vec<BookingRecord>> {
        let payload = self.get(credential, BOOKINGS_PATH, &[]).await?;
        coerce::collect(&payload, &["bookings"], coerce::booking)
    }

    async fn courts(&self, credential: &Credential) -> Result<Vec<CourtRecord>> {
        let payload = self.get(credential, COURTS_PATH, &[]).await?;
        coerce::collect(&payload, &["courts"], coerce::court)
    }

    async fn court_usage(
        &self,
        credential: &Credential,
        period: &str,
    ) -> Result<Vec<CourtUsageRecord>> {
        let payload = self
            .get(credential, COURT_USAGE_PATH, &[("period", period)])
            .await?;
        coerce::collect(&payload, &["stats", "courts", "usage"], coerce::court_usage)
    }

    async fn dashboard_revenue(
        &self,
        credential: &Credential,
        window: Window,
    ) -> Result<RevenueSnapshot> {
        let start = window.start_date().format("%Y-%m-%d").to_string();
        let end = window.end_date().format("%Y-%m-%d").to_string();
        let payload = self
            .get(
                credential,
                REVENUE_PATH,
                &[("startDate", start.as_str()), ("endDate", end.as_str())],
            )
            .await?;
        let total = coerce::revenue_total(&payload)?;
        Ok(RevenueSnapshot { window, total })
    }

    async fn equipment_issues(&self, credential: &Credential, status: &str) -> Result<usize> {
        let payload = self
            .get(credential, EQUIPMENT_ISSUES_PATH, &[("status", status)])
            .await?;
        coerce::count_items(&payload, &["issues"])
    }

    async fn venue_maintenance(&self, credential: &Credential, maintenance: &str) -> Result<usize> {
        let payload = self
            .get(
                credential,
                VENUE_MAINTENANCE_PATH,
                &[("maintenance", maintenance)],
            )
            .await?;
        coerce::count_items(&payload, &["requests", "venues"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records requests and fails them without touching the network.
    #[derive(Default)]
    struct RecordingClient {
        seen: Mutex<Vec<(String, Option<String>)>>,
    }

    #[async_trait]
    impl HttpClient for RecordingClient {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            let auth = req
                .headers()
                .get(reqwest::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            self.seen.lock().unwrap().push((req.url().to_string(), auth));
            // Any unroutable request yields a reqwest::Error to hand back.
            reqwest::Client::new()
                .get("http://127.0.0.1:0/")
                .send()
                .await
        }
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = BackendClient::new("http://api.local/api/", RecordingClient::default());
        assert_eq!(client.endpoint(USERS_PATH), "http://api.local/api/users");
    }

    #[tokio::test]
    async fn test_revenue_request_carries_bearer_and_dates() {
        let client = BackendClient::new("http://api.local/api", RecordingClient::default());
        let credential = Credential::new("tok").unwrap();
        let now = chrono::NaiveDate::from_ymd_opt(2024, 2, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let result = client
            .dashboard_revenue(&credential, crate::period::current_window(now))
            .await;
        assert!(result.is_err());

        let seen = client.http.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].0,
            "http://api.local/api/dashboard/revenue?startDate=2024-02-01&endDate=2024-02-29"
        );
        assert_eq!(seen[0].1.as_deref(), Some("Bearer tok"));
    }
}
