// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Summary table produced by the aggregator.

use ndarray::Array2;
use serde::Serialize;

use super::Reducer;

/// Time coordinate of an [`ObservationResult`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeTag {
    /// Value at one grid point
    At(f64),
    /// Reduction over the whole grid
    Summary(Reducer),
}

/// One scalar tagged by (state label, observable label, time).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationResult {
    pub state: String,
    pub observable: String,
    pub time: TimeTag,
    pub value: f64,
}

/// (state × measure) summary scalars in caller label order.
///
/// Rows follow the initial-state labels, columns the measure labels.
#[derive(Debug, Clone)]
pub struct SummaryTable {
    state_labels: Vec<String>,
    measure_labels: Vec<String>,
    reducer: Reducer,
    times: Vec<f64>,
    values: Array2<f64>,
    /// series[state][measure][grid point]
    series: Option<Vec<Vec<Vec<f64>>>>,
}

impl SummaryTable {
    pub(crate) fn build(
        state_labels: Vec<String>,
        measure_labels: Vec<String>,
        reducer: Reducer,
        times: Vec<f64>,
        rows: Vec<Vec<Vec<f64>>>,
        keep_series: bool,
    ) -> Self {
        let values = Array2::from_shape_fn((state_labels.len(), measure_labels.len()), |(i, j)| {
            reducer.reduce(&times, &rows[i][j])
        });
        Self {
            state_labels,
            measure_labels,
            reducer,
            times,
            values,
            series: keep_series.then_some(rows),
        }
    }

    pub fn state_labels(&self) -> &[String] {
        &self.state_labels
    }

    pub fn measure_labels(&self) -> &[String] {
        &self.measure_labels
    }

    pub fn reducer(&self) -> Reducer {
        self.reducer
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Summary values, shape (states, measures).
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn get(&self, state: &str, measure: &str) -> Option<f64> {
        let (i, j) = self.position(state, measure)?;
        Some(self.values[[i, j]])
    }

    /// Full time series, when the table was built with `keep_series`.
    pub fn series(&self, state: &str, measure: &str) -> Option<&[f64]> {
        let (i, j) = self.position(state, measure)?;
        self.series.as_ref().map(|s| s[i][j].as_slice())
    }

    pub fn has_series(&self) -> bool {
        self.series.is_some()
    }

    /// (state, measure, value) in row-major label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.state_labels.iter().enumerate().flat_map(move |(i, s)| {
            self.measure_labels
                .iter()
                .enumerate()
                .map(move |(j, m)| (s.as_str(), m.as_str(), self.values[[i, j]]))
        })
    }

    /// Flatten into tagged records: every summary, then every series point if kept.
    pub fn to_records(&self) -> Vec<ObservationResult> {
        let mut out: Vec<ObservationResult> = self
            .iter()
            .map(|(s, m, v)| ObservationResult {
                state: s.to_string(),
                observable: m.to_string(),
                time: TimeTag::Summary(self.reducer),
                value: v,
            })
            .collect();

        if let Some(series) = &self.series {
            for (s, per_state) in self.state_labels.iter().zip(series) {
                for (m, values) in self.measure_labels.iter().zip(per_state) {
                    out.extend(self.times.iter().zip(values).map(|(&t, &v)| {
                        ObservationResult {
                            state: s.clone(),
                            observable: m.clone(),
                            time: TimeTag::At(t),
                            value: v,
                        }
                    }));
                }
            }
        }
        out
    }

    /// Largest |Δ| between matching cells, with the labels where it occurs.
    ///
    /// `None` if the tables have different labels.
    pub fn max_abs_diff(&self, other: &SummaryTable) -> Option<(f64, Option<(String, String)>)> {
        if self.state_labels != other.state_labels || self.measure_labels != other.measure_labels {
            return None;
        }
        let mut worst = (0.0, None);
        for ((s, m, a), (_, _, b)) in self.iter().zip(other.iter()) {
            let d = (a - b).abs();
            if d > worst.0 || d.is_nan() {
                worst = (d, Some((s.to_string(), m.to_string())));
            }
        }
        Some(worst)
    }

    fn position(&self, state: &str, measure: &str) -> Option<(usize, usize)> {
        let i = self.state_labels.iter().position(|l| l == state)?;
        let j = self.measure_labels.iter().position(|l| l == measure)?;
        Some((i, j))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table(keep_series: bool) -> SummaryTable {
        SummaryTable::build(
            vec!["a".into(), "b".into()],
            vec!["x".into()],
            Reducer::Mean,
            vec![0.0, 1.0],
            vec![vec![vec![1.0, 3.0]], vec![vec![0.0, 0.5]]],
            keep_series,
        )
    }

    #[test]
    fn test_lookup_and_iteration_order() {
        let t = table(false);
        assert_relative_eq!(t.get("a", "x").unwrap(), 2.0);
        assert_relative_eq!(t.get("b", "x").unwrap(), 0.25);
        assert!(t.series("a", "x").is_none());
        let order: Vec<_> = t.iter().map(|(s, m, _)| format!("{s}/{m}")).collect();
        assert_eq!(order, vec!["a/x", "b/x"]);
    }

    #[test]
    fn test_records_include_series_when_kept() {
        assert_eq!(table(false).to_records().len(), 2);
        let t = table(true);
        assert_eq!(t.series("b", "x").unwrap(), &[0.0, 0.5]);
        let records = t.to_records();
        assert_eq!(records.len(), 2 + 4);
        assert_eq!(records[0].time, TimeTag::Summary(Reducer::Mean));
        assert_eq!(records[3].time, TimeTag::At(1.0));

        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["time"]["summary"], "mean");
    }

    #[test]
    fn test_max_abs_diff() {
        let a = table(false);
        let b = SummaryTable::build(
            vec!["a".into(), "b".into()],
            vec!["x".into()],
            Reducer::Mean,
            vec![0.0, 1.0],
            vec![vec![vec![1.0, 3.0]], vec![vec![0.0, 0.7]]],
            false,
        );
        let (d, at) = a.max_abs_diff(&b).unwrap();
        assert_relative_eq!(d, 0.1, epsilon = 1e-15);
        assert_eq!(at, Some(("b".to_string(), "x".to_string())));
        assert!(a.max_abs_diff(&table(false)).unwrap().1.is_none());
    }
}
