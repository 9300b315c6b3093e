use super::*;

fn sample() -> DictMap {
    let mut map = DictMap::new();
    map.put("ai", &Entry::single("ai", "爱", 3));
    map.put("a", &Entry::single("a", "啊", 1));
    map.put("ceshi", &Entry::single("ceshi", "测试", 0));
    map.put("ce", &Entry::single("ce", "测", 2));
    map
}

#[test]
fn get_and_put() {
    let map = sample();
    let e = map.get("ai").unwrap().unwrap();
    assert_eq!(e.words, vec!["爱"]);
    assert_eq!(e.counts, vec![3]);
    assert_eq!(map.get_encoded("ceshi"), Some("ceshi#测试"));
    assert!(map.get("zz").unwrap().is_none());
    assert!(map.get("").unwrap().is_none());
}

#[test]
fn put_overwrites() {
    let mut map = sample();
    map.put("ai", &Entry::single("ai", "埃", 9));
    assert_eq!(map.get_encoded("ai"), Some("ai#埃#9"));
    assert_eq!(map.len(), 4);
}

#[test]
fn codes_sharing_a_first_char_stay_distinct() {
    let map = sample();
    assert_eq!(map.len(), 4);
    assert_eq!(map.get_encoded("ce"), Some("ce#测#2"));
    assert_eq!(map.get_encoded("ceshi"), Some("ceshi#测试"));
}

#[test]
fn delete_removes_only_its_code() {
    let mut map = sample();
    assert!(map.delete("ceshi").is_some());
    assert!(map.contains("ce"));
    assert!(map.delete("ce").is_some());
    assert_eq!(map.len(), 2);
    assert!(map.delete("ce").is_none());
    assert!(map.delete("").is_none());
}

#[test]
fn empty_code_is_ignored() {
    let mut map = DictMap::new();
    map.put("", &Entry::single("", "x", 1));
    assert!(map.is_empty());
}

#[test]
fn iter_sorted_by_code() {
    let map = sample();
    let codes: Vec<&str> = map.iter().map(|(code, _)| code).collect();
    assert_eq!(codes, vec!["a", "ai", "ce", "ceshi"]);
}

#[test]
fn iter_is_restartable() {
    let map = sample();
    let first: Vec<_> = map.iter().collect();
    let second: Vec<_> = map.iter().collect();
    assert_eq!(first, second);
}

#[test]
fn entries_surface_decode_errors() {
    let mut map = sample();
    map.put_encoded("bad", "bad".to_string());
    let bad: Vec<_> = map.entries().filter(|(_, r)| r.is_err()).collect();
    assert_eq!(bad.len(), 1);
    assert_eq!(bad[0].0, "bad");
    assert!(map.get("bad").is_err());
}

#[test]
fn prefix_search() {
    let map = sample();
    assert_eq!(map.with_prefix("ce"), vec!["ce", "ceshi"]);
    assert_eq!(map.with_prefix("a"), vec!["a", "ai"]);
    assert_eq!(map.with_prefix("ces"), vec!["ceshi"]);
    assert!(map.with_prefix("z").is_empty());
    assert_eq!(map.with_prefix("").len(), 4);
}

#[test]
fn snapshot_roundtrip() {
    let map = sample();
    let bytes = map.to_bytes().unwrap();
    assert_eq!(&bytes[..4], MAGIC);
    assert_eq!(bytes[4], VERSION);
    let restored = DictMap::from_bytes(&bytes).unwrap();
    assert_eq!(restored, map);
}

#[test]
fn snapshot_rejects_bad_header() {
    assert!(matches!(
        DictMap::from_bytes(b"CD"),
        Err(SnapshotError::InvalidHeader)
    ));
    assert!(matches!(
        DictMap::from_bytes(b"XXXX\x01"),
        Err(SnapshotError::InvalidMagic)
    ));
    assert!(matches!(
        DictMap::from_bytes(b"CDMP\x09"),
        Err(SnapshotError::UnsupportedVersion(9))
    ));
}

#[test]
fn snapshot_rejects_corrupt_token() {
    let mut map = DictMap::new();
    map.put_encoded("ai", "ai".to_string());
    let bytes = map.to_bytes().unwrap();
    assert!(matches!(
        DictMap::from_bytes(&bytes),
        Err(SnapshotError::Codec(_))
    ));
}

#[test]
fn snapshot_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("dict.cdmp");
    let map = sample();
    map.save(&path).unwrap();
    assert!(!path.with_extension("tmp").exists());
    assert_eq!(DictMap::open(&path).unwrap(), map);
}

#[test]
fn open_nonexistent_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let map = DictMap::open(&dir.path().join("missing.cdmp")).unwrap();
    assert!(map.is_empty());
}
