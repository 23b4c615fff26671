//! Sample and label encoding.
//!
//! Converts row-major 0/1 matrices into [`Record`]s. Sample rows become
//! feature-indexed records (one per sample); the one-hot label matrix becomes
//! one sample-indexed record per class.

use log::debug;

use crate::bitvec::BitVec;
use crate::error::{Error, Result};
use crate::record::Record;

/// Packs every row of `rows` into a record and returns the records together
/// with the discovered row width.
///
/// Fails if a row holds a value other than 0 or 1, or if rows differ in
/// width. Records built for earlier rows are dropped with the error.
pub fn encode_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<(Vec<Record>, usize)> {
    let width = rows.first().map_or(0, |r| r.as_ref().len());
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let row = row.as_ref();
        if row.len() != width {
            return Err(Error::Encoding(format!(
                "row {} has {} columns, expected {}",
                i,
                row.len(),
                width
            )));
        }
        let bits = row
            .iter()
            .enumerate()
            .map(|(j, &v)| match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(Error::Encoding(format!(
                    "row {}, column {}: value {} is not binary",
                    i, j, v
                ))),
            })
            .collect::<Result<Vec<bool>>>()?;
        records.push(Record::raw(BitVec::from_bools(bits)));
    }

    debug!("encoded {} rows of width {}", records.len(), width);
    Ok((records, width))
}

/// Encodes an `nsamples x nfeatures` sample matrix.
///
/// Returns one record per sample and the number of features.
pub fn encode_samples<R: AsRef<[u8]>>(samples: &[R]) -> Result<(Vec<Record>, usize)> {
    encode_rows(samples)
}

/// Encodes an `nsamples x 2` one-hot label matrix into one record per class.
///
/// Record `k` has bit `i` set iff sample `i` belongs to class `k`.
pub fn encode_labels<R: AsRef<[u8]>>(labels: &[R], nsamples: usize) -> Result<[Record; 2]> {
    if labels.len() != nsamples {
        return Err(Error::Encoding(format!(
            "label matrix has {} rows, sample matrix has {}",
            labels.len(),
            nsamples
        )));
    }

    let (rows, width) = encode_rows(labels)?;
    if nsamples > 0 && width != 2 {
        return Err(Error::Encoding(format!(
            "label matrix has {} columns, expected 2",
            width
        )));
    }

    let mut zeros = BitVec::zeros(nsamples);
    let mut ones = BitVec::zeros(nsamples);
    for (i, row) in rows.iter().enumerate() {
        let bits = row.truth();
        match (bits.get(0), bits.get(1)) {
            (true, false) => zeros.set(i, true),
            (false, true) => ones.set(i, true),
            (a, b) => {
                return Err(Error::Encoding(format!(
                    "label row {} is not one-hot: [{}, {}]",
                    i, a as u8, b as u8
                )))
            }
        }
    }

    Ok([Record::raw(zeros), Record::raw(ones)])
}

/// Builds the one-hot label matrix for a vector of binary targets.
pub fn one_hot(targets: &[u8]) -> Result<Vec<[u8; 2]>> {
    targets
        .iter()
        .enumerate()
        .map(|(i, &y)| match y {
            0 => Ok([1, 0]),
            1 => Ok([0, 1]),
            _ => Err(Error::Encoding(format!("target {}: value {} is not binary", i, y))),
        })
        .collect()
}

/// Transposes per-sample records into per-feature columns over samples.
///
/// Column `j` has bit `i` set iff sample `i` has feature `j` set.
pub fn columns(samples: &[Record], nfeatures: usize) -> Vec<BitVec> {
    let mut cols = vec![BitVec::zeros(samples.len()); nfeatures];
    for (i, sample) in samples.iter().enumerate() {
        assert_eq!(sample.len(), nfeatures, "Sample {} has wrong width", i);
        for j in sample.truth().iter_ones() {
            cols[j].set(i, true);
        }
    }
    cols
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_encode_rows() {
        let (records, width) = encode_rows(&[vec![0u8, 1, 1], vec![1u8, 0, 0]]).unwrap();
        assert_eq!(width, 3);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].truth(), &BitVec::from_bools([false, true, true]));
        assert_eq!(records[1].support(), 1);
    }

    #[test]
    fn test_encode_rows_non_binary() {
        let err = encode_rows(&[vec![0u8, 1], vec![1u8, 2]]).unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
        assert!(err.to_string().contains("row 1, column 1: value 2"));
    }

    #[test]
    fn test_encode_rows_ragged() {
        let err = encode_rows(&[vec![0u8, 1], vec![1u8]]).unwrap_err();
        assert!(err.to_string().contains("row 1 has 1 columns, expected 2"));
    }

    #[test]
    fn test_encode_labels() {
        let labels = one_hot(&[0, 1, 1]).unwrap();
        let [zeros, ones] = encode_labels(&labels, 3).unwrap();
        assert_eq!(zeros.truth(), &BitVec::from_bools([true, false, false]));
        assert_eq!(ones.truth(), &BitVec::from_bools([false, true, true]));
    }

    #[test]
    fn test_encode_labels_row_mismatch() {
        let labels = one_hot(&[0, 1]).unwrap();
        let err = encode_labels(&labels, 3).unwrap_err();
        assert!(err.to_string().contains("2 rows, sample matrix has 3"));
    }

    #[test]
    fn test_encode_labels_not_one_hot() {
        let err = encode_labels(&[[1u8, 1u8]], 1).unwrap_err();
        assert!(err.to_string().contains("not one-hot"));
    }

    #[test]
    fn test_encode_labels_wrong_width() {
        let err = encode_labels(&[vec![1u8, 0, 0]], 1).unwrap_err();
        assert!(err.to_string().contains("3 columns, expected 2"));
    }

    #[test]
    fn test_one_hot_rejects_non_binary() {
        assert!(one_hot(&[0, 3]).is_err());
    }

    #[test]
    fn test_columns() {
        let (records, width) = encode_rows(&[vec![0u8, 1], vec![1u8, 1], vec![0u8, 0]]).unwrap();
        let cols = columns(&records, width);
        assert_eq!(cols[0], BitVec::from_bools([false, true, false]));
        assert_eq!(cols[1], BitVec::from_bools([true, true, false]));
    }
}
