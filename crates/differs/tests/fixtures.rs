use std::path::Path;

use differs::{DiffConfig, DiffOutput, Payload, Strategy, run_strategy};
use html_test_support::diff_lines;
use html_test_support::fixtures::{FixtureCase, load_fixture_dir};

fn output_text(output: &DiffOutput) -> String {
    match output.as_html() {
        Some(html) => html.to_string(),
        None => serde_json::to_string(output).expect("serialize output"),
    }
}

fn lines(text: &str) -> Vec<String> {
    text.trim_end().lines().map(str::to_string).collect()
}

fn check(case: &FixtureCase, config: &DiffConfig) -> Result<(), String> {
    let strategy: Strategy = case.strategy.parse().map_err(|e| format!("{e}"))?;
    let output = run_strategy(strategy, Payload::Text(&case.a), Payload::Text(&case.b), config)
        .map_err(|e| format!("strategy failed: {e}"))?;
    let text = output_text(&output);

    if let Some(expected) = &case.expected {
        let (want, got) = (lines(expected), lines(&text));
        if want != got {
            return Err(diff_lines(&want, &got));
        }
    }
    for needle in &case.contains {
        if !text.contains(needle.as_str()) {
            return Err(format!("missing {needle:?} in output:\n{text}"));
        }
    }
    for needle in &case.absent {
        if text.contains(needle.as_str()) {
            return Err(format!("unexpected {needle:?} in output:\n{text}"));
        }
    }
    Ok(())
}

#[test]
fn fixture_corpus() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let cases = load_fixture_dir(&dir);
    assert!(!cases.is_empty(), "no fixtures under {dir:?}");

    let config = DiffConfig::default();
    let failures: Vec<String> = cases
        .iter()
        .filter_map(|case| {
            check(case, &config)
                .err()
                .map(|msg| format!("[{}] ({:?})\n{msg}", case.id, case.source))
        })
        .collect();
    assert!(
        failures.is_empty(),
        "{} of {} fixtures failed:\n\n{}",
        failures.len(),
        cases.len(),
        failures.join("\n\n")
    );
}
