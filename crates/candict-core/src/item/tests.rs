use proptest::prelude::*;

use super::*;

fn entry(code: &str, pairs: &[(&str, u64)]) -> Entry {
    let mut e = Entry::new(code);
    for (w, c) in pairs {
        e.push(*w, *c);
    }
    e
}

#[test]
fn encode_basic() {
    let e = entry("ai", &[("爱", 3), ("埃", 2)]);
    assert_eq!(encode(&e), "ai#爱,埃#3,2");
}

#[test]
fn encode_omits_trailing_zero_counts() {
    let e = entry("ai", &[("爱", 3), ("埃", 0), ("哀", 0)]);
    assert_eq!(encode(&e), "ai#爱,埃,哀#3");
}

#[test]
fn encode_keeps_inner_zero_counts() {
    let e = entry("ai", &[("爱", 0), ("埃", 4)]);
    assert_eq!(encode(&e), "ai#爱,埃#0,4");
}

#[test]
fn encode_all_zero_drops_count_segment() {
    let e = entry("ceshi", &[("测试", 0)]);
    assert_eq!(encode(&e), "ceshi#测试");
}

#[test]
fn decode_missing_counts_default_to_zero() {
    let e = decode("ai#爱,埃,哀#5").unwrap();
    assert_eq!(e.code, "ai");
    assert_eq!(e.words, vec!["爱", "埃", "哀"]);
    assert_eq!(e.counts, vec![5, 0, 0]);
}

#[test]
fn decode_without_count_segment() {
    let e = decode("ceshi#测试").unwrap();
    assert_eq!(e.counts, vec![0]);
}

#[test]
fn decode_rejects_missing_word_segment() {
    assert!(matches!(
        decode("ceshi"),
        Err(CodecError::MalformedToken { .. })
    ));
}

#[test]
fn decode_rejects_empty_code() {
    assert!(decode("").is_err());
    assert!(decode("#测试").is_err());
}

#[test]
fn decode_rejects_bad_counts() {
    assert!(decode("ai#爱#x").is_err());
    assert!(decode("ai#爱#").is_err());
    assert!(decode("ai#爱#-1").is_err());
    assert!(decode("ai#爱#1,2").is_err());
    assert!(decode("ai#爱#1#2").is_err());
}

#[test]
fn separators_inside_words_are_escaped() {
    let e = entry("fh", &[("#", 1), (",", 2), ("a,b#c", 0)]);
    let token = encode(&e);
    assert_eq!(token, "fh#%23,%2C,a%2Cb%23c#1,2");
    assert_eq!(decode(&token).unwrap(), e);
}

#[test]
fn escape_introducer_round_trips() {
    // A word that already looks like an escape sequence must not collapse.
    let e = entry("bfh", &[("%23", 1), ("100%", 1), ("%", 1)]);
    let token = encode(&e);
    assert_eq!(token, "bfh#%2523,100%25,%25#1,1,1");
    assert_eq!(decode(&token).unwrap(), e);
}

#[test]
fn decode_rejects_unknown_escape() {
    assert!(decode("fh#%zz").is_err());
    assert!(decode("fh#abc%").is_err());
}

#[test]
fn empty_word_round_trips() {
    let e = entry("a", &[("", 5)]);
    assert_eq!(encode(&e), "a##5");
    assert_eq!(decode("a##5").unwrap(), e);

    let e = entry("a", &[("", 0)]);
    assert_eq!(encode(&e), "a#");
    assert_eq!(decode("a#").unwrap(), e);
}

#[test]
fn empty_word_among_others() {
    let e = entry("a", &[("啊", 2), ("", 1), ("阿", 0)]);
    let token = encode(&e);
    assert_eq!(token, "a#啊,,阿#2,1");
    assert_eq!(decode(&token).unwrap(), e);
}

#[test]
fn trailing_zero_normalization_is_idempotent() {
    let e = entry("ai", &[("爱", 2), ("埃", 1), ("哀", 0)]);
    let token = encode(&e);
    let decoded = decode(&token).unwrap();
    assert_eq!(decoded.counts, vec![2, 1, 0]);
    assert_eq!(encode(&decoded), token);
}

#[test]
fn entry_helpers() {
    let mut e = entry("ai", &[("爱", 2), ("埃", 0), ("哀", 5), ("矮", 0)]);
    assert_eq!(e.total(), 7);
    assert_eq!(e.position("哀"), Some(2));
    assert_eq!(e.significant_counts(), 3);
    assert_eq!(e.remove_at(0), ("爱".to_string(), 2));
    assert_eq!(e.words, vec!["埃", "哀", "矮"]);
    assert_eq!(e.counts, vec![0, 5, 0]);
}

fn arb_entry() -> impl Strategy<Value = Entry> {
    let word = prop_oneof![
        Just(String::new()),
        "[a-z测试爱]{1,6}",
        "[#,% a-z]{1,6}",
        "\\PC{1,4}",
    ];
    (
        "[a-z][a-z0-9]{0,19}",
        prop::collection::vec((word, 0u64..1000), 1..12),
    )
        .prop_map(|(code, pairs)| {
            let mut e = Entry::new(code);
            for (w, c) in pairs {
                if !e.contains(&w) {
                    e.push(w, c);
                }
            }
            e
        })
}

proptest! {
    #[test]
    fn round_trip(e in arb_entry()) {
        let token = encode(&e);
        prop_assert_eq!(decode(&token).unwrap(), e);
    }

    #[test]
    fn reencode_is_stable(e in arb_entry()) {
        let token = encode(&e);
        prop_assert_eq!(encode(&decode(&token).unwrap()), token);
    }
}
