use quiz_solver::{
    models::domain::SubmissionVerdict,
    services::{
        output_parser::{parse_body, parse_submission, BodySyntax},
        py_literal,
    },
};
use serde_json::json;

#[test]
fn labelled_json_output_yields_full_verdict() {
    let output = "REQUEST_STATUS: 200\nSERVER_RESPONSE: {\"correct\": true, \"url\": \"https://x/q2\"}";

    let verdict = parse_submission(output);

    assert_eq!(
        verdict,
        SubmissionVerdict::scanned()
            .with_correct(true)
            .with_next_url("https://x/q2")
            .with_status_code(200)
    );
}

#[test]
fn capitalised_labels_and_python_dict_are_understood() {
    let output = "Status Code: 400\nResponse Body: {'correct': False, 'reason': 'off by one'}";

    let verdict = parse_submission(output);

    assert_eq!(verdict.correct, Some(false));
    assert_eq!(verdict.reason.as_deref(), Some("off by one"));
    assert_eq!(verdict.status_code, Some(400));
    assert_eq!(verdict.next_url, None);
}

#[cfg(unix)]
#[test]
fn empty_output_is_an_empty_verdict_not_a_missing_one() {
    use quiz_solver::services::code_runner::classify_output;
    use std::os::unix::process::ExitStatusExt;

    let result = classify_output(String::new(), "", std::process::ExitStatus::from_raw(0));

    assert!(result.submission.is_empty());
    assert_eq!(result.submission.correct, None);
    assert_eq!(result.submission.next_url, None);
    assert_eq!(result.submission.reason, None);
    assert_eq!(result.submission.status_code, None);
}

#[test]
fn parsing_is_deterministic() {
    let outputs = [
        "REQUEST_STATUS: 200\nSERVER_RESPONSE: {\"correct\": true}",
        "noise {'correct': None} more noise {'correct': True, 'url': 'https://x/q9'}",
        "Response: {\"correct\": false, \"reason\": {\"detail\": 1}}",
        "",
        "{{{{",
    ];

    for output in outputs {
        assert_eq!(parse_submission(output), parse_submission(output), "{output:?}");
    }
}

#[test]
fn rendered_verdict_parses_back_to_itself() {
    let verdict = SubmissionVerdict::scanned()
        .with_correct(false)
        .with_next_url("https://x/q3")
        .with_reason("Wrong total")
        .with_status_code(200);

    assert_eq!(parse_submission(&verdict.to_string()), verdict);
}

#[test]
fn strict_and_permissive_parsers_agree_on_json() {
    let bodies = [
        r#"{"correct": true, "url": "https://x/q2", "reason": null}"#,
        r#"{"correct": false, "reason": "Expected \"42\"\n got 41", "score": -1.5e2}"#,
        r#"{"nested": {"list": [1, 2, {"a": []}]}, "unicode": "é😀"}"#,
        r#"{}"#,
    ];

    for body in bodies {
        let strict: serde_json::Value = serde_json::from_str(body).expect("valid JSON");
        let permissive = py_literal::parse(body).expect("permissive parser accepts JSON");
        assert_eq!(strict, permissive, "{body}");
    }
}

#[test]
fn permissive_parser_handles_python_only_syntax() {
    let (value, syntax) =
        parse_body("{'correct': True, 'reason': None, 'pair': (1, 2), 'tail': [3,],}")
            .expect("python literal parses");

    assert_eq!(syntax, BodySyntax::PythonLiteral);
    assert_eq!(
        value,
        json!({ "correct": true, "reason": null, "pair": [1, 2], "tail": [3] })
    );
}

#[test]
fn scavenger_only_runs_when_correct_is_unset() {
    let primary_false = "SERVER_RESPONSE: {\"correct\": false}\n{\"correct\": true, \"url\": \"https://x/late\"}";
    let verdict = parse_submission(primary_false);
    assert_eq!(verdict.correct, Some(false));
    assert_eq!(verdict.next_url, None);

    let primary_unknown = "SERVER_RESPONSE: {\"status\": \"ok\"}\n{\"correct\": true, \"url\": \"https://x/late\"}";
    let verdict = parse_submission(primary_unknown);
    assert_eq!(verdict.correct, Some(true));
    assert_eq!(verdict.next_url.as_deref(), Some("https://x/late"));
}

#[test]
fn correctness_is_tri_state() {
    assert_eq!(parse_submission("SERVER_RESPONSE: {\"correct\": true}").correct, Some(true));
    assert_eq!(parse_submission("SERVER_RESPONSE: {\"correct\": false}").correct, Some(false));
    assert_eq!(parse_submission("SERVER_RESPONSE: {\"correct\": null}").correct, None);
    assert_eq!(parse_submission("SERVER_RESPONSE: {\"correct\": 1}").correct, None);
    assert_eq!(parse_submission("all done").correct, None);
}

#[test]
fn out_of_range_status_code_is_ignored() {
    let verdict = parse_submission("REQUEST_STATUS: 99999999\nSERVER_RESPONSE: {\"correct\": true}");

    assert_eq!(verdict.status_code, None);
    assert_eq!(verdict.correct, Some(true));
}
