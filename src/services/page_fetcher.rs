//! Quiz page retrieval and question text extraction.
//!
//! Pages are fetched with a plain HTTP GET; no script is executed. Quiz pages
//! commonly hide their content in base64 payloads passed to `atob(...)`, so
//! those payloads are decoded and their text appended to the question.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::errors::{AppError, AppResult};
use crate::models::domain::QuestionData;

static BODY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>").expect("BODY_RE is a valid regex pattern")
});

static NON_CONTENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<noscript\b[^>]*>.*?</noscript\s*>|<!--.*?-->",
    )
    .expect("NON_CONTENT_RE is a valid regex pattern")
});

static BREAK_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*/?\s*(?:br|p|div|li|ul|ol|tr|table|pre|h[1-6]|section|article)\b[^>]*>")
        .expect("BREAK_TAG_RE is a valid regex pattern")
});

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("TAG_RE is a valid regex pattern"));

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);")
        .expect("ENTITY_RE is a valid regex pattern")
});

static ATOB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"atob\(\s*[`'"]([A-Za-z0-9+/=\s]+)[`'"]\s*\)"#)
        .expect("ATOB_RE is a valid regex pattern")
});

static SPACES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\u{a0}]+").expect("SPACES_RE is a valid regex pattern"));

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> AppResult<QuestionData>;
}

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    /// `client` should carry the page fetch timeout.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> AppResult<QuestionData> {
        log::info!("Fetching quiz page: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::FetchError(format!("GET {} failed: {}", url, e)))?;
        log::info!("Page loaded with status {}", response.status());

        let html = response
            .text()
            .await
            .map_err(|e| AppError::FetchError(format!("Reading {} failed: {}", url, e)))?;
        log::info!("Page content length: {} characters", html.len());

        let question_text = extract_question_text(&html);
        if question_text.is_empty() {
            log::warn!("Could not extract any text from {}", url);
        } else {
            log::info!(
                "Extracted question (first 500 chars):\n{}",
                question_text.chars().take(500).collect::<String>()
            );
        }

        Ok(QuestionData::new(question_text, html, url))
    }
}

/// Visible text of the page followed by the text of any decoded `atob`
/// payloads.
pub fn extract_question_text(html: &str) -> String {
    let mut sections = vec![html_to_text(html)];
    sections.extend(
        decode_embedded_payloads(html)
            .iter()
            .map(|payload| html_to_text(payload)),
    );
    sections.retain(|s| !s.is_empty());
    sections.join("\n\n")
}

/// Base64 strings passed to `atob(...)` that decode to UTF-8 text.
pub fn decode_embedded_payloads(html: &str) -> Vec<String> {
    ATOB_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let encoded: String = caps[1].chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = STANDARD.decode(encoded).ok()?;
            String::from_utf8(bytes).ok()
        })
        .collect()
}

/// Rough HTML to text conversion: drops scripts, styles and markup, keeps
/// block boundaries as line breaks.
pub fn html_to_text(html: &str) -> String {
    let body = BODY_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map_or(html, |m| m.as_str());

    let stripped = NON_CONTENT_RE.replace_all(body, "");
    let broken = BREAK_TAG_RE.replace_all(&stripped, "\n");
    let untagged = TAG_RE.replace_all(&broken, "");
    let decoded = decode_entities(&untagged);

    let mut lines: Vec<String> = Vec::new();
    for line in decoded.lines() {
        let line = SPACES_RE.replace_all(line.trim(), " ").into_owned();
        if line.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_visible_body_text() {
        let html = r#"<html><head><title>Quiz</title><style>p { color: red; }</style></head>
<body><h1>Question 1</h1><p>Sum the <b>value</b> column of
<a href="/data.csv">this file</a>.</p><script>console.log("hidden")</script></body></html>"#;

        assert_eq!(
            html_to_text(html),
            "Question 1\n\nSum the value column of\nthis file."
        );
    }

    #[test]
    fn decodes_entities() {
        let text = html_to_text("<p>a &lt; b &amp;&amp; c &#62; d &#x41;&nbsp;&bogus;</p>");
        assert_eq!(text, "a < b && c > d A &bogus;");
    }

    #[test]
    fn collapses_blank_runs() {
        let text = html_to_text("<div>one</div><div></div><div></div><div>two</div>");
        assert_eq!(text, "one\n\ntwo");
    }

    #[test]
    fn decodes_atob_payloads() {
        // "<p>Secret is 42</p>"
        let html = r##"<div id="result"></div><script>document.querySelector("#result").innerHTML = atob(`PHA+U2VjcmV0IGlzIDQyPC9wPg==`);</script>"##;

        assert_eq!(decode_embedded_payloads(html), vec!["<p>Secret is 42</p>"]);
        assert_eq!(extract_question_text(html), "Secret is 42");
    }

    #[test]
    fn ignores_undecodable_payloads() {
        let html = "<p>Visible</p><script>atob('!!notbase64')</script><script>atob('////')</script>";

        assert!(decode_embedded_payloads(html).is_empty());
        assert_eq!(extract_question_text(html), "Visible");
    }

    #[test]
    fn empty_page_yields_empty_text() {
        assert_eq!(extract_question_text("<html><body></body></html>"), "");
    }

    #[actix_rt::test]
    async fn unreachable_page_is_fetch_error() {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(2))
            .build()
            .expect("client builds");
        let fetcher = HttpPageFetcher::new(client);

        let result = fetcher.fetch("http://127.0.0.1:9/quiz").await;
        assert!(matches!(result, Err(AppError::FetchError(_))));
    }
}
