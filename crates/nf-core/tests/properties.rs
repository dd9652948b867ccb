//! Property tests for extraction and list reconciliation.

use nf_core::cpuinfo::CpuFeatureExtractor;
use nf_core::features::{is_owned, job_xlate, render, xlate};
use proptest::prelude::*;

fn cpuinfo_text() -> impl Strategy<Value = String> {
    let line = prop_oneof![
        "vendor_id\t: [A-Za-z]{1,16}",
        "model name\t: [ -~]{0,180}",
        "cache size\t: [0-9]{1,6} ?[KMG]?B?",
        "flags\t\t: ((sse|sse2|ssse3|sse4_1|avx|avx2|avx512f|fpu|vme) ){0,40}",
        "[a-z ]{1,12}\t: [ -~]{0,200}",
        "[ -~]{0,150}",
    ];
    prop::collection::vec(line, 0..24).prop_map(|lines| lines.join("\n"))
}

fn token() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9]{0,6}",
        "(VENDOR|MODEL|CACHE|ISA)::[A-Za-z0-9_]{0,8}",
    ]
}

fn list() -> impl Strategy<Value = String> {
    prop::collection::vec(token(), 1..8).prop_map(|tokens| tokens.join(","))
}

proptest! {
    #[test]
    fn prop_chunk_size_invariant(text in cpuinfo_text(), extra in 0usize..512) {
        let small = CpuFeatureExtractor::new()
            .with_chunk_size(128)
            .extract_reader(text.as_bytes())
            .unwrap();
        let large = CpuFeatureExtractor::new()
            .with_chunk_size(128 + extra)
            .extract_reader(text.as_bytes())
            .unwrap();
        prop_assert_eq!(small, large);
    }

    #[test]
    fn prop_rendered_tokens_are_owned(text in cpuinfo_text()) {
        let features = CpuFeatureExtractor::new()
            .extract_reader(text.as_bytes())
            .unwrap();
        if let Some(list) = render(&features, None) {
            for token in list.split(',') {
                prop_assert!(is_owned(token), "{} not owned", token);
            }
        }
    }

    #[test]
    fn prop_lowercase_words_are_foreign(word in "[a-z][a-z0-9_:]{0,12}") {
        prop_assert!(!is_owned(&word));
        let isa = format!("ISA::{}", word);
        prop_assert!(is_owned(&isa));
    }

    #[test]
    fn prop_xlate_keeps_foreign_drops_owned(new in list(), orig in list()) {
        let merged = xlate(Some(&new), Some(&orig), None).unwrap();
        prop_assert!(merged.starts_with(new.as_str()));

        let tail = &merged[new.len()..];
        let new_tokens: Vec<&str> = new.split(',').collect();
        for token in orig.split(',') {
            if is_owned(token) {
                prop_assert!(!tail.split(',').any(|t| t == token));
            } else {
                prop_assert!(merged.split(',').any(|t| t == token));
            }
        }
        // Nothing foreign is added twice.
        let appended: Vec<&str> = tail.split(',').filter(|t| !t.is_empty()).collect();
        for (idx, token) in appended.iter().enumerate() {
            prop_assert!(!appended[..idx].contains(token));
            prop_assert!(!new_tokens.contains(token));
        }
    }

    #[test]
    fn prop_xlate_idempotent(new in list(), orig in list()) {
        let once = xlate(Some(&new), Some(&orig), None);
        let twice = xlate(Some(&new), once.as_deref(), None);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_xlate_self_reconcile_is_stable(
        new in list(),
        orig in list(),
        avail in prop::option::of(list()),
    ) {
        let merged = xlate(Some(&new), Some(&orig), avail.as_deref());
        let again = xlate(merged.as_deref(), merged.as_deref(), avail.as_deref());
        prop_assert_eq!(again, merged);
    }

    #[test]
    fn prop_render_extract_idempotent(text in cpuinfo_text()) {
        let extractor = CpuFeatureExtractor::new();
        let first = extractor.extract_reader(text.as_bytes()).unwrap();
        let second = extractor.extract_reader(text.as_bytes()).unwrap();
        prop_assert_eq!(render(&first, None), render(&second, None));
    }

    #[test]
    fn prop_job_xlate_keeps_owned_in_order(tokens in prop::collection::vec(token(), 1..8)) {
        let expr = tokens.join("&");
        let result = job_xlate(Some(&expr)).unwrap();
        let owned: Vec<&str> = tokens
            .iter()
            .map(String::as_str)
            .filter(|t| is_owned(t))
            .collect();

        if owned.is_empty() {
            prop_assert_eq!(result, expr);
        } else {
            prop_assert_eq!(result, owned.join("&"));
        }
    }
}
