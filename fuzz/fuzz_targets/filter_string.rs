#![no_main]

use libfuzzer_sys::fuzz_target;
use sysfwd_core::types::FilterMode;
use sysfwd_forwarder::{FilterEngine, parse_filter_list};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // 파싱 결과에는 빈 태그나 앞뒤 공백이 남지 않아야 한다
    let tags = parse_filter_list(text);
    for tag in &tags {
        assert!(!tag.is_empty());
        assert_eq!(tag.trim(), tag.as_str());
    }

    let engine = FilterEngine::new(FilterMode::Include, ["seed"]);
    engine.replace_from_string(text);
    assert_eq!(engine.len(), tags.len());

    // 정규화된 문자열을 다시 적용해도 집합은 바뀌지 않아야 한다
    let canonical = engine.filter_string();
    assert!(!engine.replace_from_string(&canonical));

    for tag in &tags {
        assert!(engine.passes(tag));
    }
});
