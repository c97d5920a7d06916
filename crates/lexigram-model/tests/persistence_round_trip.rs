//! P5: persisting then loading a [`CountModel`] reproduces an equal model,
//! and the schema-invalidity predicate rejects every malformed document.

use lexigram_common::{Sequence, SequenceKind, SequenceSet, Token};
use lexigram_model::{CountModel, ModelError};

fn sample_sequence_set() -> SequenceSet {
    let mut set = SequenceSet::new();
    let mut seq = Sequence::new("pkg.mod", SequenceKind::Def);
    seq.push(Token::call("load()", 4));
    seq.push(Token::call("save()", 9));
    set.insert("pkg.mod", vec![seq]);
    set
}

#[test]
fn round_trip_reproduces_an_equal_model() {
    let sequences = sample_sequence_set();
    let original = CountModel::build("roundtrip-proj", &sequences, true, None);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    original.save(&path).unwrap();
    let loaded = CountModel::load(&path).unwrap();

    assert_eq!(loaded.project(), original.project());
    assert_eq!(loaded.shortest_sequence_length(), original.shortest_sequence_length());
    assert_eq!(loaded.longest_sequence_length(), original.longest_sequence_length());
    assert_eq!(loaded.single_token_count("load()"), original.single_token_count("load()"));
    assert_eq!(loaded.subsequence_count("load()save()"), original.subsequence_count("load()save()"));
}

#[test]
fn every_malformed_document_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let not_json = dir.path().join("not_json.json");
    std::fs::write(&not_json, "not valid json at all").unwrap();
    assert!(matches!(CountModel::load(&not_json), Err(ModelError::Persistence(_))));

    let missing_fields = dir.path().join("missing_fields.json");
    std::fs::write(&missing_fields, r#"{"project": "p"}"#).unwrap();
    assert!(matches!(CountModel::load(&missing_fields), Err(ModelError::Persistence(_))));

    let no_line_numbers = dir.path().join("no_line_numbers.json");
    let sequences = sample_sequence_set();
    let model = CountModel::build("p", &sequences, false, None);
    model.save(&no_line_numbers).unwrap();
    assert!(matches!(CountModel::load(&no_line_numbers), Err(ModelError::Persistence(_))));
}
