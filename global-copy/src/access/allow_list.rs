//! Allow-list sources
//!
//! The allow-list is a worksheet with an `email` column. `SheetAllowList`
//! reads it from Google Sheets as CSV; `CachedAllowList` keeps the last good
//! copy for a few seconds so repeated logins don't hammer the sheet.

use async_trait::async_trait;
use log::debug;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

use super::normalize_email;

const SHEETS_BASE_URL: &str = "https://docs.google.com";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllowListError {
    #[error("email is not on the allow-list")]
    NotFound,

    #[error("allow-list unavailable: {0}")]
    SourceUnavailable(String),
}

/// Read-only tabular source of allowed emails
#[async_trait]
pub trait AllowListSource: Send + Sync {
    /// Fetch every allowed email, already normalized
    async fn fetch(&self) -> Result<HashSet<String>, AllowListError>;

    /// `Ok` if the normalized email is listed, `NotFound` if it isn't
    async fn lookup(&self, email: &str) -> Result<(), AllowListError> {
        let emails = self.fetch().await?;
        if emails.contains(email) {
            Ok(())
        } else {
            Err(AllowListError::NotFound)
        }
    }
}

/// Fixed in-memory allow-list
#[derive(Debug, Clone, Default)]
pub struct StaticAllowList {
    emails: HashSet<String>,
}

impl StaticAllowList {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails.into_iter().map(|e| normalize_email(e.as_ref())).collect(),
        }
    }
}

#[async_trait]
impl AllowListSource for StaticAllowList {
    async fn fetch(&self) -> Result<HashSet<String>, AllowListError> {
        Ok(self.emails.clone())
    }
}

/// Google Sheets worksheet exported as CSV
pub struct SheetAllowList {
    client: reqwest::Client,
    base_url: String,
    sheet_id: Option<String>,
    worksheet: String,
    email_column: String,
}

impl SheetAllowList {
    /// `sheet_id` may be absent, in which case every fetch reports the source as unavailable.
    pub fn new(
        sheet_id: Option<String>,
        worksheet: &str,
        email_column: &str,
        timeout: Duration,
    ) -> Result<Self, AllowListError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AllowListError::SourceUnavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: SHEETS_BASE_URL.to_string(),
            sheet_id: sheet_id.filter(|id| !id.trim().is_empty()),
            worksheet: worksheet.to_string(),
            email_column: email_column.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl AllowListSource for SheetAllowList {
    async fn fetch(&self) -> Result<HashSet<String>, AllowListError> {
        let sheet_id = self
            .sheet_id
            .as_deref()
            .ok_or_else(|| AllowListError::SourceUnavailable("no sheet configured".into()))?;

        let url = format!("{}/spreadsheets/d/{}/gviz/tq", self.base_url, sheet_id);
        debug!("Fetching allow-list worksheet '{}' from {}", self.worksheet, url);

        let response = self
            .client
            .get(&url)
            .query(&[("tqx", "out:csv"), ("sheet", self.worksheet.as_str())])
            .send()
            .await
            .map_err(|e| AllowListError::SourceUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AllowListError::SourceUnavailable(format!(
                "sheet returned HTTP {}",
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AllowListError::SourceUnavailable(format!("read failed: {}", e)))?;

        parse_csv(&body, &self.email_column)
    }
}

/// Pull the normalized, non-empty values of `column` out of a CSV document.
fn parse_csv(body: &str, column: &str) -> Result<HashSet<String>, AllowListError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AllowListError::SourceUnavailable(format!("malformed sheet: {}", e)))?;
    let index = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(column))
        .ok_or_else(|| {
            AllowListError::SourceUnavailable(format!("sheet has no '{}' column", column))
        })?;

    let mut emails = HashSet::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| AllowListError::SourceUnavailable(format!("malformed sheet: {}", e)))?;
        if let Some(cell) = record.get(index) {
            let email = normalize_email(cell);
            if !email.is_empty() {
                emails.insert(email);
            }
        }
    }

    Ok(emails)
}

/// Keeps the last successful fetch for `ttl`. Failures are never cached.
pub struct CachedAllowList<S> {
    inner: S,
    ttl: Duration,
    cached: Mutex<Option<(Instant, HashSet<String>)>>,
}

impl<S: AllowListSource> CachedAllowList<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<S: AllowListSource> AllowListSource for CachedAllowList<S> {
    async fn fetch(&self) -> Result<HashSet<String>, AllowListError> {
        let mut cached = self.cached.lock().await;

        if let Some((fetched_at, emails)) = cached.as_ref() {
            if fetched_at.elapsed() < self.ttl {
                debug!("Allow-list cache hit (age {:?})", fetched_at.elapsed());
                return Ok(emails.clone());
            }
        }

        let emails = self.inner.fetch().await?;
        *cached = Some((Instant::now(), emails.clone()));
        Ok(emails)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Counts fetches and fails on demand
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl AllowListSource for CountingSource {
        async fn fetch(&self) -> Result<HashSet<String>, AllowListError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AllowListError::SourceUnavailable("offline".into()));
            }
            Ok(HashSet::from(["vip@example.com".to_string()]))
        }
    }

    #[tokio::test]
    async fn test_static_lookup() {
        let list = StaticAllowList::new([" VIP@Example.com "]);
        assert_eq!(list.lookup("vip@example.com").await, Ok(()));
        assert_eq!(
            list.lookup("other@example.com").await,
            Err(AllowListError::NotFound)
        );
    }

    #[test]
    fn test_parse_csv() {
        let body = "\"name\",\" Email \"\n\"Ana\",\"Ana@Example.com \"\n\"Bo\",\"\"\n\"Cy\",\"cy@example.com\"\n";
        let emails = parse_csv(body, "email").unwrap();
        assert_eq!(emails.len(), 2);
        assert!(emails.contains("ana@example.com"));
        assert!(emails.contains("cy@example.com"));
    }

    #[test]
    fn test_parse_csv_without_email_column() {
        let err = parse_csv("name,phone\nAna,123\n", "email").unwrap_err();
        assert!(matches!(err, AllowListError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_cache_reuses_recent_fetch() {
        let cached = CachedAllowList::new(
            CountingSource {
                calls: AtomicUsize::new(0),
                fail: false,
            },
            Duration::from_secs(60),
        );

        assert_eq!(cached.lookup("vip@example.com").await, Ok(()));
        assert_eq!(cached.lookup("nope@example.com").await, Err(AllowListError::NotFound));
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_expires() {
        let cached = CachedAllowList::new(
            CountingSource {
                calls: AtomicUsize::new(0),
                fail: false,
            },
            Duration::ZERO,
        );

        cached.fetch().await.unwrap();
        cached.fetch().await.unwrap();
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_does_not_keep_failures() {
        let cached = CachedAllowList::new(
            CountingSource {
                calls: AtomicUsize::new(0),
                fail: true,
            },
            Duration::from_secs(60),
        );

        assert!(cached.fetch().await.is_err());
        assert!(cached.fetch().await.is_err());
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sheet_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/spreadsheets/d/sheet-123/gviz/tq"))
            .and(query_param("tqx", "out:csv"))
            .and(query_param("sheet", "clientes_vip"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("\"email\"\n\"VIP@example.com\"\n"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let sheet = SheetAllowList::new(
            Some("sheet-123".to_string()),
            "clientes_vip",
            "email",
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(&server.uri());

        assert_eq!(sheet.lookup("vip@example.com").await, Ok(()));
    }

    #[tokio::test]
    async fn test_sheet_http_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let sheet = SheetAllowList::new(
            Some("missing".to_string()),
            "clientes_vip",
            "email",
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(&server.uri());

        assert_eq!(
            sheet.lookup("vip@example.com").await,
            Err(AllowListError::SourceUnavailable("sheet returned HTTP 404".into()))
        );
    }

    #[tokio::test]
    async fn test_private_sheet_login_page_degrades_open() {
        use crate::access::{AccessGate, DegradePolicy};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/spreadsheets/d/private-sheet/gviz/tq"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_string(
                        "<!DOCTYPE html><html><head><title>Sign in - Google Accounts</title></head>\n\
                         <body><form action=\"/signin\">email</form></body></html>\n",
                    ),
            )
            .mount(&server)
            .await;

        let sheet = SheetAllowList::new(
            Some("private-sheet".to_string()),
            "clientes_vip",
            "email",
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(&server.uri());
        assert!(matches!(
            sheet.fetch().await,
            Err(AllowListError::SourceUnavailable(_))
        ));

        let gate = AccessGate::new(Box::new(sheet), DegradePolicy::Open, Vec::new(), "");
        let admission = gate.admit("Someone@Example.com").await;
        assert!(admission.admitted);
        assert!(admission.degraded);
        assert_eq!(admission.email, "someone@example.com");
    }

    #[tokio::test]
    async fn test_unconfigured_sheet_is_unavailable() {
        let sheet =
            SheetAllowList::new(None, "clientes_vip", "email", Duration::from_secs(5)).unwrap();
        assert!(matches!(
            sheet.fetch().await,
            Err(AllowListError::SourceUnavailable(_))
        ));
    }
}
