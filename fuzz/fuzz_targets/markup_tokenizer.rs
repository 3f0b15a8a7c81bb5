#![no_main]

use libfuzzer_sys::fuzz_target;
use markup_diff::tokenizer::tokenize;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let joined: String = tokenize(text).iter().map(|t| t.raw).collect();
    assert_eq!(joined, text, "tokens must cover the input exactly");
});
