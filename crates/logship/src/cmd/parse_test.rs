//! Tests for the parse command

use super::*;

fn run_parse(input: impl AsRef<[u8]>, collect_errors: bool) -> (ParseSummary, String, String) {
    let mut out = Vec::new();
    let mut errors = Vec::new();
    let summary = parse_lines(
        input.as_ref(),
        &mut out,
        collect_errors.then_some(&mut errors as &mut dyn Write),
    )
    .unwrap();

    (
        summary,
        String::from_utf8(out).unwrap(),
        String::from_utf8(errors).unwrap(),
    )
}

#[test]
fn test_parse_writes_json_lines() {
    let (summary, out, _) = run_parse("[1623][web-1][app.log] started\n", false);

    assert_eq!(summary, ParseSummary { parsed: 1, malformed: 0 });
    let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
    assert_eq!(value["instance_id"], "web-1");
    assert_eq!(value["log_file_name"], "app.log");
    assert_eq!(value["body"], "started");
    assert_eq!(value["created"], 1623);
}

#[test]
fn test_parse_counts_malformed() {
    let input = "[1][a][x.log] ok\nno header here\n[2][a] truncated\n";
    let (summary, out, errors) = run_parse(input, true);

    assert_eq!(summary, ParseSummary { parsed: 1, malformed: 2 });
    assert_eq!(out.lines().count(), 1);
    assert!(errors.contains("line 2:"));
    assert!(errors.contains("line 3:"));
}

#[test]
fn test_parse_skips_blank_lines() {
    let (summary, _, _) = run_parse("\n   \n[1][a][x.log] ok\n\n", false);
    assert_eq!(summary, ParseSummary { parsed: 1, malformed: 0 });
}

#[test]
fn test_parse_without_error_sink() {
    let (summary, out, errors) = run_parse("garbage\n", false);
    assert_eq!(summary.malformed, 1);
    assert!(out.is_empty());
    assert!(errors.is_empty());
}

#[test]
fn test_parse_invalid_utf8_line_does_not_stop_input() {
    let input = b"[1][a][b] ok\n[2][a][b] bad \xff byte\n[3][a][b] after\n";
    let (summary, out, _) = run_parse(input, true);

    assert_eq!(summary, ParseSummary { parsed: 3, malformed: 0 });
    let bodies: Vec<String> = out
        .lines()
        .map(|l| {
            let value: serde_json::Value = serde_json::from_str(l).unwrap();
            value["body"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(bodies, vec!["ok", "bad \u{fffd} byte", "after"]);
}

#[test]
fn test_parse_crlf_line_endings() {
    let (summary, out, _) = run_parse("[1][a][x.log] one\r\n\r\n[2][a][x.log] two\r\n", false);

    assert_eq!(summary, ParseSummary { parsed: 2, malformed: 0 });
    assert!(!out.contains("\\r"));
}
