//! Summary types produced from a [`crate::Dataset`] and their text renderings.

use std::fmt;

use serde::{Serialize, Serializer};

/// Category frequencies of one column, most frequent first.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueCounts {
    column: String,
    entries: Vec<(String, usize)>,
}

impl ValueCounts {
    pub fn new(column: impl Into<String>, entries: Vec<(String, usize)>) -> Self {
        Self { column: column.into(), entries }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.entries.iter().find(|(l, _)| l == label).map(|(_, c)| *c)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

}

/// Serialises as a `label -> count` map, most frequent first.
impl Serialize for ValueCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(label, count)| (label, count)))
    }
}

/// One `label  count` line per category, counts right-aligned.
impl fmt::Display for ValueCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_w = self.entries.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
        let count_w = self.entries.iter().map(|(_, c)| c.to_string().len()).max().unwrap_or(0);
        for (i, (label, count)) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{:<label_w$}    {:>count_w$}", label, count)?;
        }
        Ok(())
    }
}

/// ER / PR / HER2 receptor distributions.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceptorStatus {
    pub er: ValueCounts,
    pub pr: ValueCounts,
    pub her2: ValueCounts,
}

impl ReceptorStatus {
    pub const ER_KEY: &'static str = "ER Status";
    pub const PR_KEY: &'static str = "PR Status";
    pub const HER2_KEY: &'static str = "HER2 Status";

    /// Receptors in display order: ER, PR, HER2.
    pub fn receptors(&self) -> [(&'static str, &ValueCounts); 3] {
        [(Self::ER_KEY, &self.er), (Self::PR_KEY, &self.pr), (Self::HER2_KEY, &self.her2)]
    }
}

impl Serialize for ReceptorStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.receptors())
    }
}

/// Pretty JSON mapping of receptor name to category counts.
impl fmt::Display for ReceptorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Zero-filled contingency table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTab {
    pub row_name: String,
    pub col_name: String,
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// `counts[row][col]`
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn row_total(&self, row: usize) -> usize {
        self.counts.get(row).map(|r| r.iter().sum()).unwrap_or(0)
    }

    pub fn max_row_total(&self) -> usize {
        (0..self.row_labels.len()).map(|r| self.row_total(r)).max().unwrap_or(0)
    }
}

impl fmt::Display for CrossTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_w = self
            .row_labels
            .iter()
            .map(|l| l.chars().count())
            .chain(std::iter::once(self.row_name.chars().count()))
            .max()
            .unwrap_or(0);

        write!(f, "{:<label_w$}", self.row_name)?;
        for c in &self.col_labels {
            write!(f, "  {:>6}", c)?;
        }
        for (label, counts) in self.row_labels.iter().zip(&self.counts) {
            write!(f, "\n{:<label_w$}", label)?;
            for n in counts {
                write!(f, "  {:>6}", n)?;
            }
        }
        Ok(())
    }
}

/// Statistics of a single numeric column. Fields are `None` where the
/// statistic is undefined for the number of present values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    /// Rows in display order: `(label, value)`.
    pub fn stats(&self) -> [(&'static str, Option<f64>); 8] {
        [
            ("count", Some(self.count as f64)),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q25),
            ("50%", self.q50),
            ("75%", self.q75),
            ("max", self.max),
        ]
    }
}

pub const STAT_LABELS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

pub fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.6}", v),
        None => "NaN".to_string(),
    }
}

/// `describe()`-style table: one column per input column, one row per statistic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescribeTable {
    pub columns: Vec<ColumnSummary>,
}

impl DescribeTable {
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for DescribeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|c| c.stats().iter().map(|(_, v)| format_stat(*v)).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&cells)
            .map(|(c, col)| col.iter().map(String::len).chain([c.name.len()]).max().unwrap_or(0))
            .collect();

        write!(f, "{:<5}", "")?;
        for (c, w) in self.columns.iter().zip(widths.iter().copied()) {
            write!(f, "  {:>w$}", c.name)?;
        }
        for (row, label) in STAT_LABELS.iter().enumerate() {
            write!(f, "\n{:<5}", label)?;
            for (col, w) in cells.iter().zip(widths.iter().copied()) {
                write!(f, "  {:>w$}", col[row])?;
            }
        }
        Ok(())
    }
}

/// Symmetric correlation matrix; `None` where the coefficient is undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_counts_display_aligns_counts() {
        let vc = ValueCounts::new(
            "histological.type",
            vec![("infiltrating ductal carcinoma".into(), 593), ("mixed".into(), 17)],
        );
        let text = vc.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("593"));
        assert!(lines[1].starts_with("mixed"));
        assert!(lines[1].ends_with(" 17"));
        assert_eq!(lines[0].len(), lines[1].len());
    }

    #[test]
    fn test_receptor_display_is_json() {
        let rs = ReceptorStatus {
            er: ValueCounts::new("ER.Status", vec![("Positive".into(), 3)]),
            pr: ValueCounts::new("PR.Status", vec![("Negative".into(), 3)]),
            her2: ValueCounts::new("HER2.Final.Status", vec![("Equivocal".into(), 3)]),
        };
        let parsed: serde_json::Value = serde_json::from_str(&rs.to_string()).unwrap();
        assert_eq!(parsed["ER Status"]["Positive"], 3);
        assert_eq!(parsed["HER2 Status"]["Equivocal"], 3);
    }

    #[test]
    fn test_receptor_json_keeps_display_order() {
        let rs = ReceptorStatus {
            er: ValueCounts::new("ER.Status", vec![("Positive".into(), 5), ("Negative".into(), 1)]),
            pr: ValueCounts::new("PR.Status", vec![("Positive".into(), 4), ("Negative".into(), 2)]),
            her2: ValueCounts::new("HER2.Final.Status", vec![("Negative".into(), 4), ("Equivocal".into(), 2)]),
        };
        let text = rs.to_string();
        let at = |needle: &str| text.find(needle).unwrap();
        assert!(at("ER Status") < at("PR Status"));
        assert!(at("PR Status") < at("HER2 Status"));

        let er = &text[at("ER Status")..at("PR Status")];
        assert!(er.find("Positive").unwrap() < er.find("Negative").unwrap());
        let her2 = &text[at("HER2 Status")..];
        assert!(her2.find("Negative").unwrap() < her2.find("Equivocal").unwrap());
    }

    #[test]
    fn test_describe_display_has_stat_rows() {
        let table = DescribeTable {
            columns: vec![ColumnSummary {
                name: "rs_TP53".into(),
                count: 1,
                mean: Some(2.0),
                std: None,
                min: Some(2.0),
                q25: Some(2.0),
                q50: Some(2.0),
                q75: Some(2.0),
                max: Some(2.0),
            }],
        };
        let text = table.to_string();
        assert!(text.lines().next().unwrap().contains("rs_TP53"));
        assert!(text.contains("std"));
        assert!(text.contains("NaN"));
        assert_eq!(text.lines().count(), 9);
    }
}
