//! Rule-list evaluation.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::rulelist::RuleList;
use crate::types::Class;

/// Classifies every row of `samples` with `rule_list`.
///
/// `feature_count` is the width of the sample matrix and must equal the
/// feature count the list was learned on. Literals over features a row does
/// not have never hold, so the rules using them are skipped rather than
/// reported. Rows are evaluated in parallel.
///
/// To apply a list to rows with fewer features than it was learned on, use
/// [`RuleList::predict_row`], which skips the width check.
pub fn predict<R>(samples: &[R], feature_count: usize, rule_list: &RuleList) -> Result<Vec<Class>>
where
    R: AsRef<[u8]> + Sync,
{
    if feature_count != rule_list.feature_count() {
        return Err(Error::Validation(format!(
            "feature count {} does not match the rule list's {} (stored length {})",
            feature_count,
            rule_list.feature_count(),
            rule_list.feature_slots()
        )));
    }
    for (i, row) in samples.iter().enumerate() {
        let row = row.as_ref();
        if row.len() != feature_count {
            return Err(Error::Validation(format!(
                "sample {} has {} features, expected {}",
                i,
                row.len(),
                feature_count
            )));
        }
        if let Some((j, v)) = row.iter().enumerate().find(|&(_, &v)| v > 1) {
            return Err(Error::Validation(format!(
                "sample {}, feature {}: value {} is not binary",
                i, j, v
            )));
        }
    }

    Ok(samples
        .par_iter()
        .map(|row| rule_list.predict_row(row.as_ref()))
        .collect())
}

/// Fraction of `predictions` equal to `labels`.
pub fn accuracy(predictions: &[Class], labels: &[Class]) -> Result<f64> {
    if predictions.len() != labels.len() {
        return Err(Error::Validation(format!(
            "{} predictions but {} labels",
            predictions.len(),
            labels.len()
        )));
    }
    if labels.is_empty() {
        return Err(Error::Validation("cannot score an empty sample set".to_string()));
    }
    let hits = predictions.iter().zip(labels).filter(|(p, l)| p == l).count();
    Ok(hits as f64 / labels.len() as f64)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::rulelist::Rule;
    use crate::types::Literal;

    fn list(rules: &[(&[i32], Class)], default: Class, nfeatures: usize) -> RuleList {
        let rules = rules
            .iter()
            .map(|(ids, class)| {
                Rule::new(ids.iter().map(|&i| Literal::from_signed(i).unwrap()).collect(), *class)
            })
            .collect();
        RuleList::new(rules, default, nfeatures).unwrap()
    }

    #[test]
    fn test_predict() {
        let rl = list(&[(&[2], Class::One)], Class::Zero, 2);
        let x: Vec<Vec<u8>> = vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]];
        let p = predict(&x, 2, &rl).unwrap();
        assert_eq!(p, vec![Class::Zero, Class::One, Class::Zero, Class::One]);
        // Pure: a second call gives the same answer.
        assert_eq!(predict(&x, 2, &rl).unwrap(), p);
    }

    #[test]
    fn test_default_only() {
        let rl = RuleList::trivial(Class::One, 3);
        let x = vec![[0u8, 1, 0], [1, 1, 1]];
        assert_eq!(predict(&x, 3, &rl).unwrap(), vec![Class::One, Class::One]);
    }

    #[test]
    fn test_empty_samples() {
        let rl = RuleList::trivial(Class::One, 3);
        let x: Vec<Vec<u8>> = vec![];
        assert!(predict(&x, 3, &rl).unwrap().is_empty());
    }

    #[test]
    fn test_feature_count_mismatch() {
        let rl = list(&[(&[2], Class::One)], Class::Zero, 2);
        let x = vec![vec![0u8, 1, 1]];
        let err = predict(&x, 3, &rl).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("feature count 3"));
    }

    #[test]
    fn test_row_validation() {
        let rl = list(&[(&[2], Class::One)], Class::Zero, 2);
        let err = predict(&[vec![0u8, 1], vec![1]], 2, &rl).unwrap_err();
        assert!(err.to_string().contains("sample 1 has 1 features"));
        let err = predict(&[vec![0u8, 2]], 2, &rl).unwrap_err();
        assert!(err.to_string().contains("value 2 is not binary"));
    }

    #[test]
    fn test_literal_overflow_skips_rule() {
        // Rules over features 4 and 5 on 3-feature rows never fire.
        let rl = list(
            &[(&[4], Class::One), (&[-5, 1], Class::One), (&[2], Class::One)],
            Class::Zero,
            3,
        );
        let x = vec![[1u8, 0, 0], [0, 1, 0], [1, 1, 1]];
        assert_eq!(predict(&x, 3, &rl).unwrap(), vec![Class::Zero, Class::One, Class::One]);
    }

    #[test]
    fn test_accuracy() {
        let p = [Class::One, Class::Zero, Class::One, Class::One];
        let y = [Class::One, Class::One, Class::One, Class::Zero];
        assert_eq!(accuracy(&p, &y).unwrap(), 0.5);
        assert!(accuracy(&p, &y[..3]).is_err());
        assert!(accuracy(&[], &[]).is_err());
    }
}
