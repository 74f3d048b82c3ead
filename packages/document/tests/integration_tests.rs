//! Integration tests for the document crate

use rulepad_document::{
    parse, reformat, serialize, Document, ExcludeRule, MetadataRule, MutationError, QueryKind,
    TextFormat, DEFAULT_DOCUMENT_TEXT,
};

fn sample_documents() -> Vec<Document> {
    let mut empty = Document::default();

    let mut full = Document::default();
    full.insert_exclude(ExcludeRule::new(QueryKind::Css, "div.ad")).unwrap();
    full.insert_exclude(ExcludeRule::new(QueryKind::XPath, "//aside[@class=\"promo\"]"))
        .unwrap();
    full.set_metadata("title", "title", MetadataRule::new(QueryKind::XPath, "//h1"))
        .unwrap();
    full.set_metadata("price", "price", MetadataRule::new(QueryKind::Css, "span.price \\d"))
        .unwrap();

    let unicode = parse(
        r#"[{"for":{"urls":["https://例え.jp/.*"]},"exclude":[{"type":"CSS","path":"p.注意"}],"metadata":{"見出し":{"type":"XPATH","path":"//h2"}}}]"#,
    )
    .unwrap();

    empty.set_metadata("only", "only", MetadataRule::default()).unwrap();
    empty.remove_metadata("only").unwrap();

    vec![empty, full, unicode]
}

#[test]
fn test_round_trip_both_formats() {
    for doc in sample_documents() {
        for format in [TextFormat::Pretty, TextFormat::Compact] {
            let text = serialize(&doc, format).unwrap();
            assert_eq!(parse(&text).unwrap(), doc, "round trip failed for {}", text);
        }
    }
}

#[test]
fn test_pretty_reformat_is_idempotent() {
    for doc in sample_documents() {
        let pretty = serialize(&doc, TextFormat::Pretty).unwrap();
        let again = serialize(&parse(&pretty).unwrap(), TextFormat::Pretty).unwrap();
        assert_eq!(again, pretty);
        assert_eq!(reformat(&pretty).unwrap(), pretty);
    }
}

#[test]
fn test_reformat_compact_user_text() {
    let text = r#"[{"for":{"urls":[".*"]},"exclude":[],"metadata":{}}]"#;
    assert_eq!(reformat(text).unwrap(), DEFAULT_DOCUMENT_TEXT);
}

#[test]
fn test_metadata_keys_stay_unique() {
    let mut doc = Document::default();
    let names = ["title", "author", "title", "date", "author", "date"];

    for (i, name) in names.iter().enumerate() {
        let previous = if i % 2 == 0 { "" } else { names[i - 1] };
        let _ = doc.set_metadata(name, previous, MetadataRule::new(QueryKind::Css, *name));
    }

    let mut keys: Vec<&String> = doc.metadata().keys().collect();
    let total = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), total);
}

#[test]
fn test_rejected_rename_leaves_text_unchanged() {
    let mut doc = Document::default();
    doc.set_metadata("title", "title", MetadataRule::new(QueryKind::XPath, "//h1"))
        .unwrap();
    doc.set_metadata("author", "author", MetadataRule::new(QueryKind::Css, ".by"))
        .unwrap();
    let before = serialize(&doc, TextFormat::Pretty).unwrap();

    let result = doc.set_metadata("title", "author", MetadataRule::new(QueryKind::Css, ".by"));

    assert_eq!(result, Err(MutationError::DuplicateField("title".to_string())));
    assert_eq!(serialize(&doc, TextFormat::Pretty).unwrap(), before);
}

#[test]
fn test_exclude_order_after_insert_and_remove() {
    let mut doc = Document::default();
    for query in ["a", "b", "c", "d"] {
        doc.insert_exclude(ExcludeRule::new(QueryKind::Css, query)).unwrap();
    }
    let original: Vec<ExcludeRule> = doc.excludes().to_vec();

    doc.insert_exclude(ExcludeRule::new(QueryKind::XPath, "e")).unwrap();
    doc.remove_exclude(1).unwrap();

    let mut expected = original.clone();
    expected.push(ExcludeRule::new(QueryKind::XPath, "e"));
    expected.remove(1);
    assert_eq!(doc.excludes(), expected.as_slice());
}

#[test]
fn test_add_css_exclude_to_default_document() {
    let mut doc = parse(r#"[{"for":{"urls":[".*"]},"exclude":[],"metadata":{}}]"#).unwrap();

    doc.insert_exclude(ExcludeRule::new(QueryKind::Css, "div.ad")).unwrap();

    let text = serialize(&doc, TextFormat::Pretty).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        value[0]["exclude"][0],
        serde_json::json!({"type": "CSS", "path": "div.ad"})
    );
    assert_eq!(parse(&text).unwrap(), doc);
}
