#![no_main]

use differs::{DiffConfig, html_diff_render};
use libfuzzer_sys::fuzz_target;

// Input is split at the first NUL byte into the old and new page.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (a, b) = text.split_once('\0').unwrap_or((text, ""));
    let config = DiffConfig {
        pretty_output: false,
        ..DiffConfig::default()
    };
    let Ok(rendered) = html_diff_render(a, b, &config) else {
        return;
    };
    assert!(rendered.contains("<head"), "rendered diff lost its head: {rendered}");
    assert!(
        rendered.contains("<style type=\"text/css\">"),
        "rendered diff lost its stylesheet: {rendered}"
    );
});
