use super::*;

fn trained_model() -> Model {
    let mut model = Model::new();
    model.train(&["buy", "cheap", "pills"], "spam").expect("spam");
    model
        .train(&["meeting", "agenda", "project"], "ham")
        .expect("ham");
    model.train(&["cheap", "agenda"], "spam").expect("spam again");
    model
}

#[test]
fn blank_input_loads_empty_model() {
    for text in ["", "   ", "\n\t\n"] {
        let model = load(text).expect("blank input");
        assert!(model.is_empty());
    }
}

#[test]
fn dump_starts_with_header_and_reloads_equal() {
    let model = trained_model();
    let text = dump(&model).expect("dump");
    assert!(text.starts_with("---\n"));

    let restored = load(&text).expect("load");
    assert_eq!(restored, model);
}

#[test]
fn dump_is_deterministic() {
    let model = trained_model();
    assert_eq!(dump(&model).expect("first"), dump(&model).expect("second"));
}

#[test]
fn reload_preserves_category_order_for_ties() {
    let mut model = Model::new();
    model.train(&["x"], "zeta").expect("zeta");
    model.train(&["y"], "alpha").expect("alpha");

    let restored = load(&dump(&model).expect("dump")).expect("load");
    assert_eq!(restored.classify(&["unseen"]).max_class(), Some("zeta"));
}

#[test]
fn round_trip_keeps_zeroed_entries_and_untouched_vocabulary() {
    let mut model = trained_model();
    model.untrain(&["buy"], "spam").expect("untrain");
    model.delete_category("ham");

    let restored = load(&dump(&model).expect("dump")).expect("load");
    assert_eq!(restored.store().count("spam", "buy"), 0);
    assert!(restored.store().totals("spam").expect("spam").tokens().contains_key("buy"));
    assert!(restored.store().vocabulary().contains("meeting"));
}

#[test]
fn accepts_hand_authored_snapshot_with_loose_whitespace() {
    let text = "

    ---
version: 1
categories:
  spam:
    documents: 2
    tokens:
      buy: 3
      'true': 1
  ham:
    documents: 1
    tokens: {}

";
    let model = load(text).expect("hand authored");
    let spam = model.store().totals("spam").expect("spam");
    assert_eq!(spam.total_tokens(), 4);
    assert_eq!(spam.count("true"), 1);
    assert_eq!(model.store().vocabulary().len(), 2);
    assert_eq!(model.options(), ModelOptions::default());
}

#[test]
fn recomputes_mismatched_totals() {
    let text = "---
version: 1
categories:
  spam:
    documents: 1
    total_tokens: 99
    tokens:
      buy: 2
";
    let model = load(text).expect("load");
    assert_eq!(model.store().totals("spam").expect("spam").total_tokens(), 2);
}

#[test]
fn declared_vocabulary_is_merged_with_tables() {
    let text = "---
version: 1
vocabulary: [orphan]
categories:
  spam:
    documents: 1
    tokens:
      buy: 1
";
    let model = load(text).expect("load");
    let vocabulary: Vec<&str> = model.store().vocabulary().iter().map(String::as_str).collect();
    assert_eq!(vocabulary, vec!["buy", "orphan"]);
}

#[test]
fn carries_model_options() {
    let mut model = Model::with_options(ModelOptions {
        smoothing: 0.5,
        assume_uniform: true,
    });
    model.train(&["buy"], "spam").expect("train");

    let restored = load(&dump(&model).expect("dump")).expect("load");
    assert_eq!(restored.options().smoothing, 0.5);
    assert!(restored.options().assume_uniform);
}

#[test]
fn rejects_missing_required_keys() {
    let missing_documents = "---
version: 1
categories:
  spam:
    tokens:
      buy: 1
";
    assert!(matches!(load(missing_documents), Err(ParseError::Yaml(_))));

    let missing_categories = "---\nversion: 1\n";
    assert!(matches!(load(missing_categories), Err(ParseError::Yaml(_))));
}

#[test]
fn rejects_unknown_keys() {
    let text = "---
version: 1
categories: {}
weights: [1, 2]
";
    assert!(matches!(load(text), Err(ParseError::Yaml(_))));
}

#[test]
fn rejects_other_versions() {
    let text = "---\nversion: 2\ncategories: {}\n";
    assert!(matches!(
        load(text),
        Err(ParseError::UnsupportedVersion {
            found: 2,
            expected: 1
        })
    ));
}

#[test]
fn rejects_non_positive_smoothing() {
    let text = "---\nversion: 1\nsmoothing: 0\ncategories: {}\n";
    assert!(matches!(load(text), Err(ParseError::InvalidSmoothing(_))));
}

#[test]
fn rejects_reserved_category_names() {
    let text = "---
version: 1
categories:
  '=delCat':
    documents: 1
    tokens: {}
";
    assert!(matches!(
        load(text),
        Err(ParseError::InvalidCategory { .. })
    ));
}

#[test]
fn loads_flat_table_without_header() {
    let model = load(r#"{"spam": {"buy": 2, "cheap": 1}, "ham": {"agenda": 1}}"#).expect("flat");

    assert_eq!(model.store().count("spam", "buy"), 2);
    assert_eq!(model.store().totals("ham").expect("ham").documents(), 1);
    assert_eq!(model.store().vocabulary().len(), 3);
    assert_eq!(model.classify(&["buy"]).max_class(), Some("spam"));
}

#[test]
fn loads_flat_yaml_table() {
    let text = "spam:\n  buy: 1\nham:\n  agenda: 4\n";
    let model = load(text).expect("flat yaml");
    let order: Vec<&str> = model.store().categories().map(|(name, _)| name).collect();
    assert_eq!(order, vec!["spam", "ham"]);
}

#[test]
fn rejects_input_matching_neither_form() {
    assert!(matches!(
        load("just some words"),
        Err(ParseError::UnrecognizedFormat)
    ));
    assert!(matches!(load("[1, 2, 3]"), Err(ParseError::UnrecognizedFormat)));
    assert!(matches!(load("{spam: {buy: -1}}"), Err(ParseError::Yaml(_))));
    assert!(matches!(load("{spam: [buy]}"), Err(ParseError::Yaml(_))));
}

#[test]
fn rejects_token_counts_that_overflow_the_total() {
    let text = "---
version: 1
categories:
  spam:
    documents: 1
    tokens:
      a: 18446744073709551615
      b: 1
";
    assert!(matches!(
        load(text),
        Err(ParseError::CountOverflow(category)) if category == "spam"
    ));

    let flat = "spam: {a: 18446744073709551615, b: 1}";
    assert!(matches!(load(flat), Err(ParseError::CountOverflow(_))));
}

#[test]
fn accepts_a_single_maximal_count() {
    let text = "---
version: 1
categories:
  spam:
    documents: 1
    tokens:
      a: 18446744073709551615
";
    let model = load(text).expect("fits in total");
    assert_eq!(model.store().totals("spam").expect("spam").total_tokens(), u64::MAX);
}

#[test]
fn rejects_repeated_category_keys() {
    let text = "---
version: 1
categories:
  spam:
    documents: 1
    tokens: {a: 1}
  spam:
    documents: 5
    tokens: {b: 2}
";
    assert!(matches!(
        load(text),
        Err(ParseError::DuplicateCategory(category)) if category == "spam"
    ));

    let flat = "spam: {a: 1}\nham: {b: 1}\nspam: {c: 1}\n";
    assert!(matches!(load(flat), Err(ParseError::DuplicateCategory(_))));
}

#[test]
fn rejects_repeated_token_keys() {
    let text = "---
version: 1
categories:
  spam:
    documents: 1
    tokens:
      a: 1
      a: 4
";
    assert!(matches!(
        load(text),
        Err(ParseError::DuplicateToken { category, token }) if category == "spam" && token == "a"
    ));
}
