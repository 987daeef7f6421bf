//! 필터 엔진 -- 태그 기반 include/exclude 규칙
//!
//! 규칙 집합은 `Arc<HashSet<String>>` 스냅샷으로 게시됩니다.
//! 모든 변경은 현재 스냅샷을 복제해 새 집합을 완성한 뒤 포인터를 한 번에 교체하므로,
//! 동시에 평가 중인 호출자는 항상 완전한 이전 집합이나 완전한 새 집합 중 하나만 봅니다.
//!
//! # 매칭 규칙
//! - 태그는 대소문자를 구분하는 정확 일치로 비교합니다.
//! - `Include`: 집합에 있는 태그만 통과. 빈 집합이면 모두 거부.
//! - `Exclude`: 집합에 있는 태그만 거부. 빈 집합이면 모두 통과.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use sysfwd_core::metrics as m;
use sysfwd_core::types::FilterMode;

/// 쉼표로 구분된 태그 목록을 파싱합니다.
///
/// 각 토큰의 앞뒤 공백을 제거하고 빈 토큰은 버립니다.
pub fn parse_filter_list(text: &str) -> HashSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

/// 태그 집합을 정렬된 쉼표 구분 문자열로 만듭니다.
pub fn canonical_filter_string(tags: &HashSet<String>) -> String {
    let mut sorted: Vec<&str> = tags.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(",")
}

/// 태그 필터 엔진
pub struct FilterEngine {
    include: AtomicBool,
    rules: RwLock<Arc<HashSet<String>>>,
    /// 변경 작업 직렬화 (복제-수정-게시 사이에 다른 변경이 끼어들지 않도록)
    writer: Mutex<()>,
}

impl FilterEngine {
    /// 모드와 초기 태그로 엔진을 생성합니다.
    pub fn new<I, S>(mode: FilterMode, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules: HashSet<String> = tags
            .into_iter()
            .map(|tag| tag.as_ref().trim().to_owned())
            .filter(|tag| !tag.is_empty())
            .collect();
        metrics::gauge!(m::FILTER_RULES).set(rules.len() as f64);

        Self {
            include: AtomicBool::new(mode == FilterMode::Include),
            rules: RwLock::new(Arc::new(rules)),
            writer: Mutex::new(()),
        }
    }

    /// 태그가 현재 정책을 통과하는지 검사합니다.
    pub fn passes(&self, tag: &str) -> bool {
        let listed = self.snapshot().contains(tag);
        if self.include.load(Ordering::Acquire) {
            listed
        } else {
            !listed
        }
    }

    /// 현재 필터 모드
    pub fn mode(&self) -> FilterMode {
        FilterMode::from_include_flag(self.include.load(Ordering::Acquire))
    }

    /// 필터 모드를 바꾸고 이전 모드를 반환합니다. 규칙 집합은 그대로 둡니다.
    pub fn set_mode(&self, mode: FilterMode) -> FilterMode {
        let was_include = self
            .include
            .swap(mode == FilterMode::Include, Ordering::AcqRel);
        FilterMode::from_include_flag(was_include)
    }

    /// 태그를 추가합니다. 새로 추가되었으면 `true`.
    ///
    /// 앞뒤 공백은 제거되며, 빈 태그와 중복 태그는 무시합니다.
    pub fn add(&self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        self.update(|rules| {
            if rules.contains(tag) {
                return None;
            }
            let mut next = rules.clone();
            next.insert(tag.to_owned());
            Some(next)
        })
    }

    /// 태그를 제거합니다. 실제로 제거되었으면 `true`.
    pub fn remove(&self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        self.update(|rules| {
            if !rules.contains(tag) {
                return None;
            }
            let mut next = rules.clone();
            next.remove(tag);
            Some(next)
        })
    }

    /// 모든 태그를 제거합니다. 집합이 바뀌었으면 `true`.
    pub fn clear(&self) -> bool {
        self.update(|rules| (!rules.is_empty()).then(HashSet::new))
    }

    /// 쉼표 구분 문자열로 규칙 집합 전체를 교체합니다.
    ///
    /// 집합이 실제로 바뀌었으면 `true`. 빈 문자열은 빈 집합이 됩니다.
    pub fn replace_from_string(&self, text: &str) -> bool {
        self.replace(parse_filter_list(text))
    }

    /// 이미 파싱된 집합으로 규칙 집합 전체를 교체합니다. 집합이 바뀌었으면 `true`.
    pub fn replace(&self, tags: HashSet<String>) -> bool {
        let changed = self.update(move |rules| (*rules != tags).then_some(tags));
        if changed {
            metrics::counter!(m::FILTER_RELOADS_TOTAL).increment(1);
        }
        changed
    }

    /// 현재 규칙 집합 스냅샷
    ///
    /// 반환된 스냅샷은 이후의 변경에 영향을 받지 않습니다.
    pub fn snapshot(&self) -> Arc<HashSet<String>> {
        Arc::clone(&self.rules.read())
    }

    /// 태그 목록 (정렬됨)
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.snapshot().iter().cloned().collect();
        tags.sort();
        tags
    }

    /// 태그가 규칙 집합에 있는지 확인합니다.
    pub fn has_filter(&self, tag: &str) -> bool {
        self.snapshot().contains(tag)
    }

    /// 규칙 집합을 정렬된 쉼표 구분 문자열로 반환합니다.
    pub fn filter_string(&self) -> String {
        canonical_filter_string(&self.snapshot())
    }

    /// 규칙 수
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// 규칙 집합이 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// 복제-수정-게시
    ///
    /// `build`가 `None`을 반환하면 아무것도 게시하지 않습니다.
    /// 새 집합은 읽기 잠금 밖에서 완성되고, 쓰기 잠금은 포인터 교체 동안만 잡습니다.
    fn update<F>(&self, build: F) -> bool
    where
        F: FnOnce(&HashSet<String>) -> Option<HashSet<String>>,
    {
        let _writer = self.writer.lock();
        let current = self.snapshot();
        let Some(next) = build(&current) else {
            return false;
        };
        let len = next.len();
        *self.rules.write() = Arc::new(next);
        metrics::gauge!(m::FILTER_RULES).set(len as f64);
        true
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(FilterMode::Exclude, std::iter::empty::<&str>())
    }
}

impl std::fmt::Debug for FilterEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterEngine")
            .field("mode", &self.mode())
            .field("rules", &self.tags())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(mode: FilterMode, tags: &[&str]) -> FilterEngine {
        FilterEngine::new(mode, tags.iter())
    }

    #[test]
    fn include_single_tag() {
        let filter = engine(FilterMode::Include, &["sensor"]);
        assert!(filter.passes("sensor"));
        assert!(!filter.passes("wifi"));
    }

    #[test]
    fn exclude_single_tag() {
        let filter = engine(FilterMode::Exclude, &["sensor"]);
        assert!(!filter.passes("sensor"));
        assert!(filter.passes("wifi"));
    }

    #[test]
    fn empty_include_rejects_everything() {
        let filter = engine(FilterMode::Include, &[]);
        assert!(!filter.passes("sensor"));
        assert!(!filter.passes(""));
    }

    #[test]
    fn empty_exclude_accepts_everything() {
        let filter = engine(FilterMode::Exclude, &[]);
        assert!(filter.passes("sensor"));
        assert!(filter.passes(""));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let filter = engine(FilterMode::Include, &["Sensor"]);
        assert!(filter.passes("Sensor"));
        assert!(!filter.passes("sensor"));
    }

    #[test]
    fn matching_is_exact() {
        let filter = engine(FilterMode::Include, &["wifi"]);
        assert!(!filter.passes("wifi:scan"));
        assert!(!filter.passes("wif"));
    }

    #[test]
    fn add_is_idempotent() {
        let filter = FilterEngine::default();
        assert!(filter.add("sensor"));
        assert!(!filter.add("sensor"));
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn add_trims_and_ignores_empty() {
        let filter = FilterEngine::default();
        assert!(filter.add("  api "));
        assert!(!filter.add("   "));
        assert!(!filter.add(""));
        assert_eq!(filter.tags(), vec!["api"]);
    }

    #[test]
    fn remove_absent_is_noop() {
        let filter = engine(FilterMode::Exclude, &["a"]);
        assert!(!filter.remove("b"));
        assert!(filter.remove("a"));
        assert!(!filter.remove("a"));
        assert!(filter.is_empty());
    }

    #[test]
    fn clear_empties_rules() {
        let filter = engine(FilterMode::Include, &["a", "b"]);
        assert!(filter.clear());
        assert!(filter.is_empty());
        assert!(!filter.clear());
    }

    #[test]
    fn replace_from_string_trims_tokens() {
        let filter = engine(FilterMode::Include, &["old"]);
        assert!(filter.replace_from_string("a, b ,c"));
        assert_eq!(filter.tags(), vec!["a", "b", "c"]);
        assert!(!filter.has_filter("old"));
    }

    #[test]
    fn replace_from_empty_string_clears() {
        let filter = engine(FilterMode::Include, &["a"]);
        assert!(filter.replace_from_string(""));
        assert!(filter.is_empty());
    }

    #[test]
    fn replace_with_same_set_reports_unchanged() {
        let filter = engine(FilterMode::Include, &["a", "b"]);
        assert!(!filter.replace_from_string("b,a"));
    }

    #[test]
    fn replace_discards_empty_tokens() {
        let filter = FilterEngine::default();
        filter.replace_from_string(",, a ,,b,");
        assert_eq!(filter.filter_string(), "a,b");
    }

    #[test]
    fn set_mode_keeps_rules() {
        let filter = engine(FilterMode::Exclude, &["sensor"]);
        let old = filter.set_mode(FilterMode::Include);
        assert_eq!(old, FilterMode::Exclude);
        assert_eq!(filter.mode(), FilterMode::Include);
        assert!(filter.passes("sensor"));
        assert!(!filter.passes("wifi"));
    }

    #[test]
    fn snapshot_is_unaffected_by_later_changes() {
        let filter = engine(FilterMode::Include, &["a"]);
        let before = filter.snapshot();
        filter.replace_from_string("x,y");
        assert!(before.contains("a"));
        assert_eq!(before.len(), 1);
        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn canonical_string_matches_parsed_set() {
        let parsed = parse_filter_list(" ota ,api,, ota");
        assert_eq!(canonical_filter_string(&parsed), "api,ota");
        assert_eq!(canonical_filter_string(&HashSet::new()), "");

        let filter = engine(FilterMode::Include, &["api"]);
        assert!(filter.replace(parsed));
        assert_eq!(filter.filter_string(), "api,ota");
        assert!(!filter.replace(parse_filter_list("ota,api")));
    }

    #[test]
    fn filter_string_is_sorted() {
        let filter = engine(FilterMode::Include, &["zeta", "alpha", "mid"]);
        assert_eq!(filter.filter_string(), "alpha,mid,zeta");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn replace_from_joined_tags_yields_same_set(
                tags in prop::collection::hash_set("[a-z0-9_:.]{1,12}", 0..16)
            ) {
                let filter = FilterEngine::default();
                let joined = tags.iter().map(|t| format!("  {} ", t)).collect::<Vec<_>>().join(",");
                filter.replace_from_string(&joined);
                let snapshot = filter.snapshot();
                prop_assert_eq!(&*snapshot, &tags);
            }

            #[test]
            fn include_and_exclude_are_complementary(
                tags in prop::collection::vec("[a-z]{1,6}", 0..8),
                candidate in "[a-z]{1,6}"
            ) {
                let include = FilterEngine::new(FilterMode::Include, tags.iter());
                let exclude = FilterEngine::new(FilterMode::Exclude, tags.iter());
                prop_assert_ne!(include.passes(&candidate), exclude.passes(&candidate));
            }

            #[test]
            fn parse_never_yields_blank_tags(text in ".{0,200}") {
                let parsed = parse_filter_list(&text);
                for tag in &parsed {
                    prop_assert!(!tag.is_empty());
                    prop_assert_eq!(tag.trim(), tag.as_str());
                    prop_assert!(!tag.contains(','));
                }
            }
        }
    }
}
