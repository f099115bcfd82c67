//! Typed job results.
//!
//! Sampling results arrive as `result.sampling.counts`, a map from bit string
//! to shot count, possibly JSON-encoded as a string. Bit strings are decoded
//! base 2 (`"10"` → 2) so that measured values can be compared as integers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{OqtopusError, OqtopusResult};
use crate::job::JobInfo;

/// Measurement counts: measured value → number of shots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts(BTreeMap<u64, u64>);

impl Counts {
    /// Create empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add shots for a value; repeated values accumulate.
    pub fn insert(&mut self, value: u64, count: u64) {
        *self.0.entry(value).or_insert(0) += count;
    }

    /// Shots recorded for a value.
    pub fn get(&self, value: u64) -> u64 {
        self.0.get(&value).copied().unwrap_or(0)
    }

    /// Total number of shots.
    pub fn total_shots(&self) -> u64 {
        self.0.values().sum()
    }

    /// The most frequent value and its count.
    pub fn most_frequent(&self) -> Option<(u64, u64)> {
        self.0
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(value, count)| (*value, *count))
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in ascending value order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.0.iter().map(|(v, c)| (*v, *c))
    }

    /// Parse a JSON counts map, decoding bit-string keys.
    pub fn from_json(value: &Value) -> OqtopusResult<Self> {
        let map = as_object(value, "counts")?;
        let mut counts = Counts::new();
        for (bits, count) in &map {
            let count = count.as_u64().ok_or_else(|| {
                OqtopusError::Validation(format!(
                    "count for '{bits}' must be a non-negative integer, got {count}"
                ))
            })?;
            counts.insert(decode_bits(bits)?, count);
        }
        Ok(counts)
    }
}

impl FromIterator<(u64, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (u64, u64)>>(iter: I) -> Self {
        let mut counts = Counts::new();
        for (value, count) in iter {
            counts.insert(value, count);
        }
        counts
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (value, count)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}: {count}")?;
        }
        write!(f, "}}")
    }
}

/// Decode a measured bit string as a base-2 integer.
pub fn decode_bits(bits: &str) -> OqtopusResult<u64> {
    if bits.is_empty() || !bits.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(OqtopusError::Validation(format!(
            "'{bits}' is not a bit string"
        )));
    }
    u64::from_str_radix(bits, 2).map_err(|_| {
        OqtopusError::Validation(format!("bit string '{bits}' does not fit in 64 bits"))
    })
}

/// Result of a sampling job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SamplingResult {
    /// Counts over all measured bits.
    pub counts: Counts,
    /// Per-program counts of a combined (`multi_manual`) job, keyed by index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divided_counts: Option<BTreeMap<u32, Counts>>,
}

impl SamplingResult {
    /// Decode the `sampling` section of a result payload.
    pub fn from_payload(payload: &Value) -> OqtopusResult<Self> {
        let counts = payload.get("counts").ok_or_else(|| {
            OqtopusError::Validation("'counts' does not exist in result".into())
        })?;
        let counts = Counts::from_json(counts)?;

        let divided_counts = match payload.get("divided_counts") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(raw) => {
                let map = as_object(raw, "divided_counts")?;
                if map.is_empty() {
                    None
                } else {
                    let mut divided = BTreeMap::new();
                    for (index, value) in &map {
                        let index: u32 = index.parse().map_err(|_| {
                            OqtopusError::Validation(format!(
                                "divided_counts index '{index}' is not an integer"
                            ))
                        })?;
                        divided.insert(index, Counts::from_json(value)?);
                    }
                    Some(divided)
                }
            }
        };

        Ok(Self {
            counts,
            divided_counts,
        })
    }
}

/// Result of an estimation job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    /// Expectation value.
    #[serde(default)]
    pub exp_value: Option<f64>,
    /// Standard deviation.
    #[serde(default)]
    pub stds: Option<f64>,
}

/// Decode the sampling result of a job.
pub fn decode_sampling(info: &JobInfo) -> OqtopusResult<SamplingResult> {
    let section = result_section(info, "sampling")?;
    SamplingResult::from_payload(section)
}

/// Decode the estimation result of a job.
pub fn decode_estimation(info: &JobInfo) -> OqtopusResult<EstimationResult> {
    let section = result_section(info, "estimation")?;
    serde_json::from_value(section.clone())
        .map_err(|e| OqtopusError::Validation(format!("malformed estimation result: {e}")))
}

fn result_section<'a>(info: &'a JobInfo, name: &str) -> OqtopusResult<&'a Value> {
    let result = info
        .result
        .as_ref()
        .ok_or_else(|| OqtopusError::Validation("'result' does not exist in job_info".into()))?;
    result
        .get(name)
        .filter(|v| !v.is_null())
        .ok_or_else(|| OqtopusError::Validation(format!("'{name}' does not exist in result")))
}

/// Read a value as a JSON object, decoding it first if it is a string.
fn as_object(value: &Value, what: &str) -> OqtopusResult<serde_json::Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        Value::String(s) => match serde_json::from_str(s) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(OqtopusError::Validation(format!(
                "'{what}' is not a JSON object"
            ))),
        },
        _ => Err(OqtopusError::Validation(format!(
            "'{what}' must be an object"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn info_with(result: Value) -> JobInfo {
        JobInfo {
            result: Some(result),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_bits() {
        assert_eq!(decode_bits("00").unwrap(), 0);
        assert_eq!(decode_bits("01").unwrap(), 1);
        assert_eq!(decode_bits("10").unwrap(), 2);
        assert_eq!(decode_bits("11").unwrap(), 3);
        assert!(decode_bits("").is_err());
        assert!(decode_bits("+1").is_err());
        assert!(decode_bits("12").is_err());
        assert!(decode_bits(&"1".repeat(65)).is_err());
    }

    #[test]
    fn test_sampling_counts_scenario() {
        let info = info_with(json!({
            "sampling": {"counts": {"00": 490, "01": 10, "10": 20, "11": 480}}
        }));
        let result = decode_sampling(&info).unwrap();

        let expected: Counts = [(0, 490), (1, 10), (2, 20), (3, 480)].into_iter().collect();
        assert_eq!(result.counts, expected);
        assert_eq!(result.counts.total_shots(), 1000);
        assert_eq!(result.counts.most_frequent(), Some((0, 490)));
        assert!(result.divided_counts.is_none());
    }

    #[test]
    fn test_sampling_counts_as_json_string() {
        let info = info_with(json!({
            "sampling": {"counts": "{\"0\": 600, \"1\": 300, \"11\": 100}"}
        }));
        let result = decode_sampling(&info).unwrap();
        assert_eq!(result.counts.get(0), 600);
        assert_eq!(result.counts.get(1), 300);
        assert_eq!(result.counts.get(3), 100);
    }

    #[test]
    fn test_sampling_divided_counts() {
        let info = info_with(json!({
            "sampling": {
                "counts": {"0000": 490, "0001": 10, "0110": 20, "1111": 480},
                "divided_counts": {
                    "0": {"00": 490, "01": 10, "10": 20, "11": 480},
                    "1": {"00": 500, "01": 20, "11": 480}
                }
            }
        }));
        let result = decode_sampling(&info).unwrap();
        assert_eq!(result.counts.get(15), 480);
        assert_eq!(result.counts.get(6), 20);

        let divided = result.divided_counts.unwrap();
        assert_eq!(divided.len(), 2);
        assert_eq!(divided[&0].get(2), 20);
        assert_eq!(divided[&1].get(3), 480);
        assert_eq!(divided[&1].get(2), 0);
    }

    #[test]
    fn test_divided_counts_as_json_string() {
        let payload = json!({
            "counts": {"0": 1},
            "divided_counts": "{\"0\": {\"1\": 7}}"
        });
        let result = SamplingResult::from_payload(&payload).unwrap();
        assert_eq!(result.divided_counts.unwrap()[&0].get(1), 7);
    }

    #[test]
    fn test_empty_divided_counts_is_none() {
        let payload = json!({"counts": {"0": 1}, "divided_counts": {}});
        let result = SamplingResult::from_payload(&payload).unwrap();
        assert!(result.divided_counts.is_none());
    }

    #[test]
    fn test_missing_counts() {
        let payload = json!({"transpile_result": {"virtual_physical_mapping": {"0": 0}}});
        let err = SamplingResult::from_payload(&payload).unwrap_err();
        assert!(matches!(
            err,
            OqtopusError::Validation(ref m) if m == "'counts' does not exist in result"
        ));
    }

    #[test]
    fn test_missing_result() {
        let err = decode_sampling(&JobInfo::default()).unwrap_err();
        assert!(matches!(err, OqtopusError::Validation(_)));
        let err = decode_estimation(&info_with(json!({"sampling": {}}))).unwrap_err();
        assert!(err.to_string().contains("'estimation'"));
    }

    #[test]
    fn test_negative_count_rejected() {
        let payload = json!({"counts": {"0": -1}});
        assert!(SamplingResult::from_payload(&payload).is_err());
    }

    #[test]
    fn test_estimation_result() {
        let info = info_with(json!({"estimation": {"exp_value": 2.0, "stds": 1.1}}));
        let result = decode_estimation(&info).unwrap();
        assert_eq!(result.exp_value, Some(2.0));
        assert_eq!(result.stds, Some(1.1));

        let info = info_with(json!({"estimation": {"exp_value": 0.5}}));
        let result = decode_estimation(&info).unwrap();
        assert_eq!(result.exp_value, Some(0.5));
        assert_eq!(result.stds, None);
    }

    #[test]
    fn test_counts_display() {
        let counts: Counts = [(3, 5), (0, 7)].into_iter().collect();
        assert_eq!(counts.to_string(), "{0: 7, 3: 5}");
    }

    proptest! {
        /// Distinct bit strings of one width decode to distinct integers.
        #[test]
        fn test_decode_bits_is_injective(width in 1usize..=16, a in 0u64..65536, b in 0u64..65536) {
            let mask = (1u64 << width) - 1;
            let (a, b) = (a & mask, b & mask);
            let bits_a = format!("{a:0width$b}");
            let bits_b = format!("{b:0width$b}");

            prop_assert_eq!(decode_bits(&bits_a).unwrap(), a);
            prop_assert_eq!(bits_a == bits_b, decode_bits(&bits_a).unwrap() == decode_bits(&bits_b).unwrap());
        }
    }
}
