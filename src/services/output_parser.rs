//! Recovers a grading verdict from the stdout of generated code.
//!
//! Generated code is asked to print `REQUEST_STATUS: <code>` and
//! `SERVER_RESPONSE: <body>`, but the labels and the body syntax vary between
//! attempts. Extraction is layered: labelled status code, labelled response
//! body (strict JSON, then Python-literal syntax), and finally a scan for any
//! flat `{...}` blob that mentions a `correct` key. Parsing never fails; fields
//! that cannot be recovered stay `None`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::domain::SubmissionVerdict;
use crate::services::py_literal;

static STATUS_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:request_status|status)(?:\s+code)?:\s*(\d+)")
        .expect("STATUS_CODE_RE is a valid regex pattern")
});

static RESPONSE_BODY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)(?:server_response|response)(?:\s+body)?:\s*(\{.*?\})")
        .expect("RESPONSE_BODY_RE is a valid regex pattern")
});

static CORRECT_BLOB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{[^{}]*["']correct["'][^{}]*\}"#)
        .expect("CORRECT_BLOB_RE is a valid regex pattern")
});

/// Which parser accepted a body blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySyntax {
    Json,
    PythonLiteral,
}

/// Parses a brace blob, trying strict JSON before Python-literal syntax.
pub fn parse_body(blob: &str) -> Option<(Value, BodySyntax)> {
    if let Ok(value) = serde_json::from_str::<Value>(blob) {
        return Some((value, BodySyntax::Json));
    }
    py_literal::parse(blob)
        .ok()
        .map(|value| (value, BodySyntax::PythonLiteral))
}

/// Extracts the verdict from captured stdout. A status label whose number
/// does not fit in `u16` is treated as absent; HTTP codes always fit.
pub fn parse_submission(output: &str) -> SubmissionVerdict {
    let mut verdict = SubmissionVerdict::scanned();

    if let Some(code) = STATUS_CODE_RE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok())
    {
        log::debug!("Found status code in output: {}", code);
        verdict.status_code = Some(code);
    }

    if let Some(blob) = RESPONSE_BODY_RE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    {
        match parse_body(blob) {
            Some((Value::Object(body), syntax)) => {
                log::debug!("Parsed labelled response body as {:?}", syntax);
                apply_body(&mut verdict, &body);
            }
            Some(_) => log::warn!("Labelled response body is not an object, ignoring it"),
            None => log::warn!("Could not parse labelled response body as JSON or dict"),
        }
    }

    if verdict.correct.is_none() {
        for candidate in CORRECT_BLOB_RE.find_iter(output) {
            let Some((Value::Object(body), _)) = parse_body(candidate.as_str()) else {
                continue;
            };
            log::info!("Recovered submission result from unlabelled output");
            apply_body(&mut verdict, &body);
            break;
        }
    }

    verdict
}

fn apply_body(verdict: &mut SubmissionVerdict, body: &serde_json::Map<String, Value>) {
    verdict.correct = body.get("correct").and_then(Value::as_bool);
    verdict.next_url = ["url", "next_url"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .find(|url| !url.is_empty())
        .map(str::to_string);
    verdict.reason = body.get("reason").and_then(|reason| match reason {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labelled_json_response() {
        let output = "REQUEST_STATUS: 200\nSERVER_RESPONSE: {\"correct\": true, \"url\": \"https://x/q2\"}";
        let verdict = parse_submission(output);

        assert_eq!(verdict.status_code, Some(200));
        assert_eq!(verdict.correct, Some(true));
        assert_eq!(verdict.next_url.as_deref(), Some("https://x/q2"));
        assert_eq!(verdict.reason, None);
    }

    #[test]
    fn parses_python_dict_with_alternate_labels() {
        let output = "Status Code: 400\nResponse Body: {'correct': False, 'reason': 'off by one'}";
        let verdict = parse_submission(output);

        assert_eq!(verdict.status_code, Some(400));
        assert_eq!(verdict.correct, Some(false));
        assert_eq!(verdict.reason.as_deref(), Some("off by one"));
        assert_eq!(verdict.next_url, None);
    }

    #[test]
    fn first_status_label_wins() {
        let output = "status: 502\nREQUEST_STATUS: 200\n";
        assert_eq!(parse_submission(output).status_code, Some(502));
    }

    #[test]
    fn pretty_printed_body_spans_lines() {
        let output = "Fetching data...\nSERVER_RESPONSE: {\n  \"correct\": false,\n  \"reason\": \"Wrong sum\",\n  \"url\": \"https://x/q3\"\n}\nDone";
        let verdict = parse_submission(output);

        assert_eq!(verdict.correct, Some(false));
        assert_eq!(verdict.reason.as_deref(), Some("Wrong sum"));
        assert_eq!(verdict.next_url.as_deref(), Some("https://x/q3"));
    }

    #[test]
    fn url_key_takes_precedence_over_next_url() {
        let verdict = parse_submission(
            r#"SERVER_RESPONSE: {"correct": true, "next_url": "https://b", "url": "https://a"}"#,
        );
        assert_eq!(verdict.next_url.as_deref(), Some("https://a"));

        let verdict = parse_submission(
            r#"SERVER_RESPONSE: {"correct": true, "url": "", "next_url": "https://b"}"#,
        );
        assert_eq!(verdict.next_url.as_deref(), Some("https://b"));
    }

    #[test]
    fn scavenger_recovers_unlabelled_blob() {
        let output = "answer computed\n{'correct': True, 'url': 'https://x/q4', 'reason': None}\n";
        let verdict = parse_submission(output);

        assert_eq!(verdict.correct, Some(true));
        assert_eq!(verdict.next_url.as_deref(), Some("https://x/q4"));
        assert_eq!(verdict.reason, None);
        assert_eq!(verdict.status_code, None);
    }

    #[test]
    fn scavenger_skips_malformed_candidates() {
        let output = "{\"correct\": tru, broken}\n{\"correct\": false, \"reason\": \"second\"}";
        let verdict = parse_submission(output);

        assert_eq!(verdict.correct, Some(false));
        assert_eq!(verdict.reason.as_deref(), Some("second"));
    }

    #[test]
    fn scavenger_does_not_override_primary_false() {
        let output = "SERVER_RESPONSE: {\"correct\": false, \"reason\": \"nope\"}\nretry log: {'correct': True}";
        let verdict = parse_submission(output);

        assert_eq!(verdict.correct, Some(false));
        assert_eq!(verdict.reason.as_deref(), Some("nope"));
    }

    #[test]
    fn scavenger_runs_when_primary_lacks_correct() {
        let output = "SERVER_RESPONSE: {\"url\": \"https://first\"}\n{\"correct\": true}";
        let verdict = parse_submission(output);

        assert_eq!(verdict.correct, Some(true));
        // The recovered blob replaces the continuation fields wholesale.
        assert_eq!(verdict.next_url, None);
    }

    #[test]
    fn output_without_body_is_scanned_but_unknown() {
        let verdict = parse_submission("Traceback? no, just chatter\n");

        assert!(!verdict.is_empty());
        assert_eq!(verdict.correct, None);
        assert_eq!(verdict.next_url, None);
        assert_eq!(verdict.status_code, None);
    }

    #[test]
    fn non_boolean_correct_is_unknown() {
        let verdict = parse_submission(r#"SERVER_RESPONSE: {"correct": "yes"}"#);
        assert_eq!(verdict.correct, None);
    }

    #[test]
    fn nested_body_degrades_without_error() {
        let output = r#"SERVER_RESPONSE: {"correct": true, "meta": {"a": 1}, "url": "https://x"}"#;
        let verdict = parse_submission(output);

        // The non-greedy body match truncates at the first closing brace and
        // the flat-blob scan cannot see past the nested object either.
        assert_eq!(verdict.correct, None);
    }

    #[test]
    fn parse_body_reports_syntax() {
        assert_eq!(
            parse_body(r#"{"a": 1}"#).map(|(_, s)| s),
            Some(BodySyntax::Json)
        );
        assert_eq!(
            parse_body("{'a': 1}").map(|(_, s)| s),
            Some(BodySyntax::PythonLiteral)
        );
        assert!(parse_body("{not: valid").is_none());
    }

    #[test]
    fn deeply_nested_body_leaves_verdict_unknown() {
        let output = format!(
            "SERVER_RESPONSE: {{'correct': True, 'data': {}}}",
            "[".repeat(10_000)
        );
        let verdict = parse_submission(&output);

        assert_eq!(verdict.correct, None);
        assert!(!verdict.is_empty());
    }

    #[test]
    fn oversized_status_code_is_ignored() {
        let verdict = parse_submission("REQUEST_STATUS: 70000\nSERVER_RESPONSE: {\"correct\": true}");

        assert_eq!(verdict.status_code, None);
        assert_eq!(verdict.correct, Some(true));
    }
}
