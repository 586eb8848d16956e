//! omicscope-data - in-memory multi-omics table and the summaries shown by
//! the dashboard panels and the query router.
//!
//! The table is loaded once from CSV and never mutated afterwards. Columns are
//! typed the way a dataframe would type them: a column whose every present
//! cell parses as a float is numeric, anything else is categorical.

pub mod dataset;
pub mod error;
pub mod stats;
pub mod summary;

pub use dataset::{Column, Dataset};
pub use error::DatasetError;
pub use summary::{CorrelationMatrix, CrossTab, DescribeTable, ReceptorStatus, ValueCounts};

/// Clinical columns the router and panels depend on.
pub mod columns {
    pub const ER_STATUS: &str = "ER.Status";
    pub const PR_STATUS: &str = "PR.Status";
    pub const HER2_STATUS: &str = "HER2.Final.Status";
    pub const HISTOLOGICAL_TYPE: &str = "histological.type";
    pub const VITAL_STATUS: &str = "vital.status";

    /// Default name prefix of the gene-expression (RNA-seq) columns.
    pub const GENE_EXPRESSION_PREFIX: &str = "rs_";
}
