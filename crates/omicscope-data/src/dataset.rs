//! CSV loading and column access.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::columns;
use crate::error::{DatasetError, Result};
use crate::stats;
use crate::summary::{ColumnSummary, CorrelationMatrix, CrossTab, DescribeTable, ReceptorStatus, ValueCounts};

/// Cell tokens treated as missing values.
const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "NULL", "null", "None"];

/// A single typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl Column {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell rendered for display; missing cells show as `NaN`.
    pub fn display(&self, row: usize) -> String {
        match self {
            Column::Numeric(v) => match v.get(row).copied().flatten() {
                Some(x) => x.to_string(),
                None => "NaN".to_string(),
            },
            Column::Categorical(v) => match v.get(row) {
                Some(Some(s)) => s.clone(),
                _ => "NaN".to_string(),
            },
        }
    }

    /// Cell as a label for counting; `None` when missing.
    fn label(&self, row: usize) -> Option<String> {
        match self {
            Column::Numeric(v) => v.get(row).copied().flatten().map(|x| x.to_string()),
            Column::Categorical(v) => v.get(row).cloned().flatten(),
        }
    }

    fn from_cells(cells: Vec<Option<String>>) -> Self {
        let parsed: Option<Vec<Option<f64>>> = cells
            .iter()
            .map(|cell| match cell {
                None => Some(None),
                Some(s) => s.trim().parse::<f64>().ok().map(Some),
            })
            .collect();

        match parsed {
            Some(values) => Column::Numeric(values),
            None => Column::Categorical(cells),
        }
    }
}

/// Immutable in-memory table.
#[derive(Debug, Clone)]
pub struct Dataset {
    headers: Vec<String>,
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    rows: usize,
}

impl Dataset {
    /// Load a CSV file. A missing file is reported as [`DatasetError::NotFound`].
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(DatasetError::NotFound(path.to_path_buf()));
        }

        debug!("Loading dataset from {:?}", path);
        let content = tokio::fs::read(path).await?;
        let dataset = Self::from_reader(content.as_slice())?;

        info!(
            "Dataset loaded: {} rows, {} columns ({} numeric)",
            dataset.row_count(),
            dataset.column_count(),
            dataset.numeric_columns().len()
        );
        Ok(dataset)
    }

    /// Parse CSV text with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        let mut rows = 0;

        for result in reader.records() {
            let record = result?;
            for (i, value) in record.iter().enumerate() {
                let value = value.trim();
                let cell = if MISSING_TOKENS.contains(&value) { None } else { Some(value.to_string()) };
                cells[i].push(cell);
            }
            rows += 1;
        }

        let columns: Vec<Column> = cells.into_iter().map(Column::from_cells).collect();

        let mut index = HashMap::with_capacity(headers.len());
        for (i, name) in headers.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }

        Ok(Self { headers, columns, index, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.index
            .get(name)
            .map(|&i| &self.columns[i])
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
    }

    fn numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        match self.column(name)? {
            Column::Numeric(values) => Ok(values),
            Column::Categorical(_) => Err(DatasetError::NotNumeric(name.to_string())),
        }
    }

    pub fn numeric_columns(&self) -> Vec<&str> {
        self.headers
            .iter()
            .zip(&self.columns)
            .filter(|(_, c)| c.is_numeric())
            .map(|(h, _)| h.as_str())
            .collect()
    }

    pub fn categorical_columns(&self) -> Vec<&str> {
        self.headers
            .iter()
            .zip(&self.columns)
            .filter(|(_, c)| !c.is_numeric())
            .map(|(h, _)| h.as_str())
            .collect()
    }

    /// Columns whose name starts with `prefix`, in file order.
    pub fn columns_with_prefix(&self, prefix: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|h| h.starts_with(prefix))
            .map(|h| h.as_str())
            .collect()
    }

    /// First `n` rows rendered as strings, one inner vec per row.
    pub fn head(&self, n: usize) -> Vec<Vec<String>> {
        (0..n.min(self.rows))
            .map(|row| self.columns.iter().map(|c| c.display(row)).collect())
            .collect()
    }

    /// Frequency of each present value, most frequent first.
    pub fn value_counts(&self, name: &str) -> Result<ValueCounts> {
        let column = self.column(name)?;
        let mut entries: Vec<(String, usize)> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();

        for row in 0..self.rows {
            let Some(label) = column.label(row) else { continue };
            match slots.get(&label) {
                Some(&slot) => entries[slot].1 += 1,
                None => {
                    slots.insert(label.clone(), entries.len());
                    entries.push((label, 1));
                }
            }
        }

        // stable sort keeps first-appearance order for ties
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(ValueCounts::new(name, entries))
    }

    pub fn receptor_status(&self) -> Result<ReceptorStatus> {
        Ok(ReceptorStatus {
            er: self.value_counts(columns::ER_STATUS)?,
            pr: self.value_counts(columns::PR_STATUS)?,
            her2: self.value_counts(columns::HER2_STATUS)?,
        })
    }

    /// Vital status counts per histological type.
    pub fn survival_by_histology(&self) -> Result<CrossTab> {
        self.crosstab(columns::HISTOLOGICAL_TYPE, columns::VITAL_STATUS)
    }

    /// Zero-filled contingency table of two columns with sorted labels.
    /// Rows missing either value are skipped.
    pub fn crosstab(&self, row_column: &str, col_column: &str) -> Result<CrossTab> {
        let rows = self.column(row_column)?;
        let cols = self.column(col_column)?;

        let pairs: Vec<(String, String)> = (0..self.rows)
            .filter_map(|i| Some((rows.label(i)?, cols.label(i)?)))
            .collect();

        let mut row_labels: Vec<String> = pairs.iter().map(|(r, _)| r.clone()).collect();
        row_labels.sort();
        row_labels.dedup();
        let mut col_labels: Vec<String> = pairs.iter().map(|(_, c)| c.clone()).collect();
        col_labels.sort();
        col_labels.dedup();

        let mut counts = vec![vec![0usize; col_labels.len()]; row_labels.len()];
        for (r, c) in &pairs {
            let (Ok(ri), Ok(ci)) = (row_labels.binary_search(r), col_labels.binary_search(c)) else {
                continue;
            };
            counts[ri][ci] += 1;
        }

        Ok(CrossTab {
            row_name: row_column.to_string(),
            col_name: col_column.to_string(),
            row_labels,
            col_labels,
            counts,
        })
    }

    /// Descriptive statistics for the given numeric columns.
    pub fn describe(&self, names: &[&str]) -> Result<DescribeTable> {
        if names.is_empty() {
            return Err(DatasetError::EmptySelection);
        }

        let mut summaries = Vec::with_capacity(names.len());
        for &name in names {
            let mut values: Vec<f64> = self.numeric(name)?.iter().flatten().copied().collect();
            values.sort_by(f64::total_cmp);
            summaries.push(ColumnSummary {
                name: name.to_string(),
                count: values.len(),
                mean: stats::mean(&values),
                std: stats::sample_std(&values),
                min: values.first().copied(),
                q25: stats::quantile_sorted(&values, 0.25),
                q50: stats::quantile_sorted(&values, 0.50),
                q75: stats::quantile_sorted(&values, 0.75),
                max: values.last().copied(),
            });
        }
        Ok(DescribeTable { columns: summaries })
    }

    /// Summary of every gene-expression column carrying `prefix`.
    pub fn gene_expression_summary(&self, prefix: &str) -> Result<DescribeTable> {
        let genes = self.columns_with_prefix(prefix);
        if genes.is_empty() {
            return Err(DatasetError::NoColumnsWithPrefix(prefix.to_string()));
        }
        self.describe(&genes)
    }

    /// Pairwise-complete Pearson correlation of the given numeric columns.
    pub fn correlation(&self, names: &[&str]) -> Result<CorrelationMatrix> {
        let series: Vec<&[Option<f64>]> = names
            .iter()
            .map(|name| self.numeric(name))
            .collect::<Result<_>>()?;

        let n = series.len();
        let mut values = vec![vec![None; n]; n];
        for i in 0..n {
            for j in i..n {
                let r = stats::pearson(series[i], series[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Ok(CorrelationMatrix {
            labels: names.iter().map(|s| s.to_string()).collect(),
            values,
        })
    }
}
