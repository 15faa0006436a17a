//! HTML fetcher.
//!
//! Given a target URL, returns `(status, html, outbound internal links)`,
//! enforcing a per-host politeness delay and filtering non-HTML responses
//! out of the analyzed content. Built on plain `reqwest` + `scraper`:
//! nothing here calls for a browser-impersonating client, just a polite
//! HTTP GET and an HTML parse.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dashmap::DashMap;
use scraper::{Html, Selector};
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::config::FetcherConfig;

/// The status code to persist on the Page row for a fetch whose HTML body
/// ended up empty (transport failure, non-2xx response, or a 2xx response
/// whose content-type wasn't HTML / body was empty). Keeps the §3 Page
/// invariant ("either content is non-empty HTML or code is not in
/// [200,299]") satisfied — a 2xx status is never stored alongside empty
/// content.
pub fn recorded_status_code(status: i32, html_is_empty: bool) -> i32 {
    if status == 0 {
        599
    } else if (200..300).contains(&status) && html_is_empty {
        415
    } else {
        status
    }
}

/// Outcome of fetching a single URL. A non-2xx status or a non-HTML
/// content-type is not an error — it is recorded as a Page row, not
/// propagated as a `FetchError`.
pub struct FetchOutcome {
    pub status: i32,
    pub html: String,
    pub links: Vec<Url>,
}

/// Per-host last-request timestamps, global across the whole fetcher
/// rather than per worker, guarded by an async mutex per entry so
/// concurrent PageTasks hitting the same host serialize their delay
/// instead of racing it.
pub struct Fetcher {
    client: reqwest::Client,
    config: FetcherConfig,
    last_request: DashMap<String, Arc<Mutex<Instant>>>,
}

fn selector(sel: &str) -> Selector {
    Selector::parse(sel).expect("static selector must parse")
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(referrer) = &config.referrer {
            if let Ok(value) = reqwest::header::HeaderValue::from_str(referrer) {
                headers.insert(reqwest::header::REFERER, value);
            }
        }
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            config,
            last_request: DashMap::new(),
        })
    }

    /// Block until at least `politeness_delay_ms` has elapsed since the
    /// last request issued to `host`, then record this request's start.
    async fn wait_for_politeness(&self, host: &str) {
        let lock = self
            .last_request
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Instant::now() - Duration::from_secs(3600))))
            .clone();
        let mut last = lock.lock().await;
        let elapsed = last.elapsed();
        let delay = Duration::from_millis(self.config.politeness_delay_ms);
        if elapsed < delay {
            tokio::time::sleep(delay - elapsed).await;
        }
        *last = Instant::now();
    }

    /// Fetch `url`, returning the status code, HTML body (empty for
    /// non-HTML or failed fetches) and the same-origin links discovered in
    /// the body.
    pub async fn fetch(&self, url: &Url) -> Result<FetchOutcome> {
        let host = url.host_str().unwrap_or_default().to_string();
        self.wait_for_politeness(&host).await;

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(%url, error = %err, "fetch failed");
                return Ok(FetchOutcome {
                    status: 0,
                    html: String::new(),
                    links: Vec::new(),
                });
            }
        };

        let status = response.status().as_u16() as i32;
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("text/html"))
            .unwrap_or(true);

        if !is_html {
            return Ok(FetchOutcome {
                status,
                html: String::new(),
                links: Vec::new(),
            });
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(%url, error = %err, "failed to read response body");
                return Ok(FetchOutcome {
                    status,
                    html: String::new(),
                    links: Vec::new(),
                });
            }
        };

        let links = extract_internal_links(&body, url);
        Ok(FetchOutcome {
            status,
            html: body,
            links,
        })
    }
}

/// Same-origin `<a href>` targets on the page, deduplicated, fragments
/// stripped.
fn extract_internal_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let anchor = selector("a[href]");
    let mut seen = HashMap::new();
    let mut links = Vec::new();

    for element in document.select(&anchor) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(mut joined) = base.join(href) else {
            continue;
        };
        joined.set_fragment(None);
        if joined.host_str() != base.host_str() || joined.scheme() != base.scheme() {
            continue;
        }
        if joined.scheme() != "http" && joined.scheme() != "https" {
            continue;
        }
        let key = joined.to_string();
        if seen.insert(key, ()).is_none() {
            links.push(joined);
        }
    }
    links
}

/// Extract the visible text of a document for lemma analysis — every text
/// node, whitespace-joined, script/style content excluded.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let script_or_style = selector("script, style");
    let excluded: std::collections::HashSet<_> = document
        .select(&script_or_style)
        .flat_map(|el| el.descendants().map(|n| n.id()))
        .collect();

    let mut text = String::new();
    for node in document.tree.nodes() {
        if excluded.contains(&node.id()) {
            continue;
        }
        if let Some(t) = node.value().as_text() {
            text.push_str(t);
            text.push(' ');
        }
    }
    crate::analyzer::normalize_whitespace(&text)
}

/// Extract the `<title>` text of a document, used by SearchBuilder.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title = selector("title");
    document
        .select(&title)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_status_code_never_pairs_2xx_with_empty_content() {
        assert_eq!(recorded_status_code(0, true), 599);
        assert_eq!(recorded_status_code(404, true), 404);
        assert_eq!(recorded_status_code(200, true), 415);
        assert_eq!(recorded_status_code(200, false), 200);
    }

    #[test]
    fn extracts_same_origin_links_only() {
        let html = r#"
            <html><body>
                <a href="/a">A</a>
                <a href="https://example.test/b">B</a>
                <a href="https://other.test/c">C</a>
                <a href="mailto:x@example.test">mail</a>
            </body></html>
        "#;
        let base = Url::parse("https://example.test/").unwrap();
        let links = extract_internal_links(html, &base);
        let hrefs: Vec<String> = links.iter().map(|u| u.to_string()).collect();
        assert!(hrefs.contains(&"https://example.test/a".to_string()));
        assert!(hrefs.contains(&"https://example.test/b".to_string()));
        assert!(!hrefs.iter().any(|h| h.contains("other.test")));
        assert!(!hrefs.iter().any(|h| h.starts_with("mailto")));
    }

    #[test]
    fn extract_text_skips_script_and_style() {
        let html = "<html><body><script>var x=1;</script><style>.a{}</style><p>Hello world</p></body></html>";
        let text = extract_text(html);
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn extract_title_returns_none_when_missing() {
        assert_eq!(extract_title("<html><body>no title</body></html>"), None);
        assert_eq!(
            extract_title("<html><head><title>  Hi  </title></head></html>").as_deref(),
            Some("Hi")
        );
    }
}
