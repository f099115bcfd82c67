//! Observables for estimation jobs.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{OqtopusError, OqtopusResult};

/// One term of an observable as sent to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorItem {
    /// Pauli string label, e.g. `X0 Z1`.
    pub pauli: String,
    /// Real coefficient.
    pub coeff: f64,
}

/// A linear combination of Pauli strings.
///
/// Terms keep insertion order; adding a label twice sums its coefficients.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Operator {
    terms: Vec<(String, Complex64)>,
}

impl Operator {
    /// Create an empty operator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term with a real coefficient.
    pub fn with_term(mut self, pauli: impl Into<String>, coeff: f64) -> Self {
        self.add_term(pauli, Complex64::new(coeff, 0.0));
        self
    }

    /// Add a term with a complex coefficient.
    pub fn add_term(&mut self, pauli: impl Into<String>, coeff: Complex64) {
        let pauli = pauli.into();
        match self.terms.iter_mut().find(|(label, _)| *label == pauli) {
            Some((_, existing)) => *existing += coeff,
            None => self.terms.push((pauli, coeff)),
        }
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the operator has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate over `(label, coefficient)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Complex64)> {
        self.terms.iter().map(|(label, coeff)| (label.as_str(), *coeff))
    }

    /// Encode the terms for submission.
    ///
    /// Fails if any coefficient has a non-zero imaginary part.
    pub fn encode(&self) -> OqtopusResult<Vec<OperatorItem>> {
        self.terms
            .iter()
            .map(|(pauli, coeff)| {
                if coeff.im != 0.0 {
                    return Err(OqtopusError::Validation(format!(
                        "Complex numbers are not supported in coefficient: {coeff}"
                    )));
                }
                Ok(OperatorItem {
                    pauli: pauli.clone(),
                    coeff: coeff.re,
                })
            })
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, Complex64)> for Operator {
    fn from_iter<I: IntoIterator<Item = (S, Complex64)>>(iter: I) -> Self {
        let mut op = Operator::new();
        for (pauli, coeff) in iter {
            op.add_term(pauli, coeff);
        }
        op
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Operator {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(pauli, coeff)| (pauli, Complex64::new(coeff, 0.0)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_real_terms() {
        let op = Operator::new().with_term("X0 X1", 1.0).with_term("Z0 Z1", -0.5);
        let items = op.encode().unwrap();
        assert_eq!(
            items,
            vec![
                OperatorItem {
                    pauli: "X0 X1".into(),
                    coeff: 1.0
                },
                OperatorItem {
                    pauli: "Z0 Z1".into(),
                    coeff: -0.5
                },
            ]
        );
    }

    #[test]
    fn test_complex_coefficient_rejected() {
        let mut op = Operator::new();
        op.add_term("X0", Complex64::new(1.0, 2.0));
        let err = op.encode().unwrap_err();
        match err {
            OqtopusError::Validation(msg) => {
                assert!(msg.starts_with("Complex numbers are not supported in coefficient"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_imaginary_part_accepted() {
        let op: Operator = [("Y0", Complex64::new(0.25, 0.0))].into_iter().collect();
        assert_eq!(op.encode().unwrap()[0].coeff, 0.25);
    }

    #[test]
    fn test_duplicate_labels_merge() {
        let op: Operator = [("Z0", 0.5), ("X1", 1.0), ("Z0", 0.25)].into_iter().collect();
        assert_eq!(op.len(), 2);
        let items = op.encode().unwrap();
        assert_eq!(items[0].pauli, "Z0");
        assert_eq!(items[0].coeff, 0.75);
    }

    #[test]
    fn test_item_wire_format() {
        let item = OperatorItem {
            pauli: "X0 Y1".into(),
            coeff: 1.5,
        };
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            serde_json::json!({"pauli": "X0 Y1", "coeff": 1.5})
        );
    }
}
