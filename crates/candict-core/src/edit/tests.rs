use super::*;

fn map_with(code: &str, pairs: &[(&str, u64)]) -> DictMap {
    let mut e = Entry::new(code);
    for (w, c) in pairs {
        e.push(*w, *c);
    }
    let mut map = DictMap::new();
    map.put(code, &e);
    map
}

fn entry(map: &DictMap, code: &str) -> Entry {
    map.get(code).unwrap().unwrap()
}

#[test]
fn add_creates_entry() {
    let mut map = DictMap::new();
    let out = map.apply(&EditOp::add("ceshi", "测试")).unwrap();
    assert_eq!(out, EditOutcome::Created);
    let e = entry(&map, "ceshi");
    assert_eq!(e.words, vec!["测试"]);
    assert_eq!(e.counts, vec![1]);
}

#[test]
fn add_same_word_increments() {
    let mut map = DictMap::new();
    map.apply(&EditOp::add("ceshi", "测试")).unwrap();
    let out = map.apply(&EditOp::add("ceshi", "测试")).unwrap();
    assert_eq!(out, EditOutcome::Updated);
    assert_eq!(entry(&map, "ceshi").counts, vec![2]);
}

#[test]
fn add_new_word_appends_then_reorders() {
    let mut map = map_with("ai", &[("爱", 0), ("埃", 0)]);
    map.apply(&EditOp::add("ai", "哀")).unwrap();
    let e = entry(&map, "ai");
    // 1 vs 0 sits inside the tie band: appended word stays last.
    assert_eq!(e.words, vec!["爱", "埃", "哀"]);
    assert_eq!(e.counts, vec![0, 0, 1]);

    map.apply(&EditOp::add("ai", "哀")).unwrap();
    let e = entry(&map, "ai");
    assert_eq!(e.words, vec!["哀", "爱", "埃"]);
    assert_eq!(e.counts, vec![2, 0, 0]);
}

#[test]
fn add_empty_code_is_noop() {
    let mut map = DictMap::new();
    assert_eq!(
        map.apply(&EditOp::add("", "x")).unwrap(),
        EditOutcome::Unchanged
    );
    assert!(map.is_empty());
}

#[test]
fn remove_last_word_deletes_entry() {
    let mut map = DictMap::new();
    map.apply(&EditOp::add("ceshi", "测试")).unwrap();
    let out = map.apply(&EditOp::remove("ceshi", "测试")).unwrap();
    assert_eq!(out, EditOutcome::Deleted);
    assert!(map.get("ceshi").unwrap().is_none());
    assert!(map.is_empty());
}

#[test]
fn remove_keeps_remaining_order() {
    let mut map = map_with("ai", &[("爱", 1), ("埃", 9), ("哀", 5)]);
    map.apply(&EditOp::remove("ai", "埃")).unwrap();
    let e = entry(&map, "ai");
    assert_eq!(e.words, vec!["爱", "哀"]);
    assert_eq!(e.counts, vec![1, 5]);
}

#[test]
fn remove_missing_is_noop() {
    let mut map = map_with("ai", &[("爱", 1)]);
    let before = map.clone();
    assert_eq!(
        map.apply(&EditOp::remove("ai", "埃")).unwrap(),
        EditOutcome::Unchanged
    );
    assert_eq!(
        map.apply(&EditOp::remove("zz", "埃")).unwrap(),
        EditOutcome::Unchanged
    );
    assert_eq!(map, before);
}

#[test]
fn reorder_sets_half_of_total() {
    let mut map = map_with("ceshi", &[("a", 4), ("b", 3), ("c", 0)]);
    map.apply(&EditOp::reorder("ceshi", "c")).unwrap();
    let e = entry(&map, "ceshi");
    assert_eq!(e.words, vec!["a", "b", "c"]);
    assert_eq!(e.counts, vec![4, 3, 3]);
}

#[test]
fn reorder_ignores_prior_count() {
    let mut low = map_with("ceshi", &[("a", 4), ("b", 3), ("c", 0)]);
    let mut high = map_with("ceshi", &[("a", 4), ("b", 3), ("c", 50)]);
    low.apply(&EditOp::reorder("ceshi", "c")).unwrap();
    high.apply(&EditOp::reorder("ceshi", "c")).unwrap();
    let c_low = entry(&low, "ceshi");
    let c_high = entry(&high, "ceshi");
    assert_eq!(c_low.counts[c_low.position("c").unwrap()], 3);
    assert_eq!(c_high.counts[c_high.position("c").unwrap()], 3);
}

#[test]
fn reorder_promotes_past_clear_lead() {
    let mut map = map_with("ai", &[("a", 10), ("b", 10), ("c", 1)]);
    map.apply(&EditOp::reorder("ai", "c")).unwrap();
    let e = entry(&map, "ai");
    assert_eq!(e.words, vec!["a", "b", "c"]);
    assert_eq!(e.counts, vec![10, 10, 10]);

    let mut map = map_with("ai", &[("a", 20), ("b", 4), ("c", 0)]);
    map.apply(&EditOp::reorder("ai", "c")).unwrap();
    let e = entry(&map, "ai");
    assert_eq!(e.words, vec!["a", "c", "b"]);
    assert_eq!(e.counts, vec![20, 12, 4]);
}

#[test]
fn reorder_missing_is_noop() {
    let mut map = map_with("ai", &[("a", 1)]);
    let before = map.clone();
    assert_eq!(
        map.apply(&EditOp::reorder("ai", "zz")).unwrap(),
        EditOutcome::Unchanged
    );
    assert_eq!(
        map.apply(&EditOp::reorder("bb", "a")).unwrap(),
        EditOutcome::Unchanged
    );
    assert_eq!(map, before);
}

#[test]
fn malformed_token_leaves_map_unchanged() {
    let mut map = DictMap::new();
    map.put_encoded("ai", "ai#爱#x".to_string());
    for op in [
        EditOp::add("ai", "爱"),
        EditOp::remove("ai", "爱"),
        EditOp::reorder("ai", "爱"),
    ] {
        assert!(matches!(
            map.apply(&op),
            Err(CodecError::MalformedToken { .. })
        ));
        assert_eq!(map.get_encoded("ai"), Some("ai#爱#x"));
    }
}

#[test]
fn apply_all_reports_and_continues() {
    let mut map = DictMap::new();
    map.put_encoded("bad", "bad".to_string());
    let ops = vec![
        EditOp::add("ceshi", "测试"),
        EditOp::add("bad", "x"),
        EditOp::add("ceshi", "测试"),
        EditOp::add("ai", "爱"),
        EditOp::remove("ai", "爱"),
        EditOp::remove("ai", "爱"),
    ];
    let report = map.apply_all(&ops);
    assert_eq!(report.created, 2);
    assert_eq!(report.updated, 1);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.malformed, vec!["bad".to_string()]);
    assert_eq!(entry(&map, "ceshi").counts, vec![2]);
}
