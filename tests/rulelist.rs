//! Rule-list format, evaluation and fitted-model round trips.

use corels_rs::classifier::{Corels, Model};
use corels_rs::error::Error;
use corels_rs::predict::predict;
use corels_rs::rulelist::RuleList;
use corels_rs::types::Class;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use test_log::test;

fn quiet(max_card: usize, min_support: f64, c: f64) -> Corels {
    Corels {
        c,
        max_card,
        min_support,
        verbosity: vec![],
        ..Corels::default()
    }
}

// ─── Wire Format ───────────────────────────────────────────────────────────────

#[test]
fn text_round_trip() {
    let text = "rulelist 4 3\n2 1 -3 1\n1 -4 0\n3 2 3 4 1\ndefault 0\n";
    let rule_list: RuleList = text.parse().unwrap();
    assert_eq!(rule_list.len(), 3);
    assert_eq!(rule_list.rules()[0].antecedent_ids(), vec![1, -3]);
    assert_eq!(rule_list.rules()[1].prediction(), Class::Zero);
    assert_eq!(rule_list.default_class(), Class::Zero);
    assert_eq!(rule_list.to_string(), text);
}

#[test]
fn malformed_text_reports_line() {
    let err = "rulelist 2 2\n1 1 1\n1 1\ndefault 0\n".parse::<RuleList>().unwrap_err();
    match err {
        Error::Format { line, .. } => assert_eq!(line, 3),
        e => panic!("unexpected error: {}", e),
    }
}

// ─── Literal Overflow ──────────────────────────────────────────────────────────

#[test]
fn rules_over_missing_features_never_match() {
    // Learned on 5 features, evaluated on 3.
    let rule_list: RuleList = "rulelist 5 3\n1 4 1\n2 1 -5 1\n1 -2 1\ndefault 0\n".parse().unwrap();
    let x = [[1u8, 0, 0], [1, 1, 1], [0, 1, 0], [0, 0, 1]];
    let predictions: Vec<Class> = x.iter().map(|row| rule_list.predict_row(row)).collect();
    assert_eq!(predictions, vec![Class::One, Class::Zero, Class::Zero, Class::One]);

    // The validated entry point insists on matching widths.
    assert!(matches!(predict(&x, 3, &rule_list), Err(Error::Validation(_))));
}

// ─── Fitting Round Trip ────────────────────────────────────────────────────────

#[test]
fn single_literal_rules_reproduce_labels() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let x: Vec<Vec<u8>> = (0..40)
        .map(|_| (0..4).map(|_| rng.random_bool(0.5) as u8).collect())
        .collect();
    // Label is the third feature.
    let y: Vec<u8> = x.iter().map(|row| row[2]).collect();

    let model = quiet(1, 0.0, 0.001).fit(&x, &y, &[], "y").unwrap();
    assert!(model.rule_list().antecedent_rules().iter().all(|r| r.antecedent().len() == 1));
    let expected: Vec<Class> = y.iter().map(|&v| Class::from(v == 1)).collect();
    assert_eq!(model.predict(&x).unwrap(), expected);
    assert_eq!(model.score(&x, &y).unwrap(), 1.0);
}

#[test]
fn saved_model_predicts_the_same() {
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let x: Vec<Vec<u8>> = (0..80)
        .map(|_| (0..5).map(|_| rng.random_bool(0.5) as u8).collect())
        .collect();
    let y: Vec<u8> = x.iter().map(|row| (row[0] & !row[3] & 1) | (row[1] & row[4])).collect();
    let names: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();

    let model = quiet(2, 0.05, 0.01).fit(&x, &y, &names, "label").unwrap();
    let mut buf = Vec::new();
    model.write_to(&mut buf).unwrap();
    let loaded = Model::read_from(buf.as_slice()).unwrap();

    assert_eq!(loaded.rule_list(), model.rule_list());
    assert_eq!(loaded.features(), names.as_slice());
    assert_eq!(loaded.prediction_name(), "label");
    assert_eq!(loaded.predict(&x).unwrap(), model.predict(&x).unwrap());
    assert_eq!(loaded.to_string(), model.to_string());
}
