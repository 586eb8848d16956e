//! Analytics panels. Each panel reads the loaded table and renders one card;
//! a panel whose columns are missing renders its error instead of failing
//! the page.

use omicscope_data::summary::{format_stat, STAT_LABELS};
use omicscope_data::{Dataset, DatasetError, ValueCounts};

use super::{escape, heatmap};
use crate::state::DashboardSettings;

fn card(title: &str, body: &str) -> String {
    format!(
        r#"
    <section class="card">
        <h2 class="card-title">{}</h2>
        <div class="card-body">{}</div>
    </section>"#,
        escape(title),
        body
    )
}

fn error_alert(err: &DatasetError) -> String {
    tracing::warn!("Panel unavailable: {}", err);
    format!(r#"<div class="alert alert-danger">{}</div>"#, escape(&err.to_string()))
}

fn panel(title: &str, body: Result<String, DatasetError>) -> String {
    match body {
        Ok(html) => card(title, &html),
        Err(e) => card(title, &error_alert(&e)),
    }
}

fn counts_table(counts: &ValueCounts) -> String {
    let total = counts.total().max(1);
    let rows: String = counts
        .entries()
        .iter()
        .map(|(label, n)| {
            format!(
                r#"<tr><td>{}</td><td class="num">{}</td><td><div class="bar" style="width:{}%"></div></td></tr>"#,
                escape(label),
                n,
                n * 100 / total
            )
        })
        .collect();
    format!(
        r#"<table class="table"><thead><tr><th>{}</th><th class="num">count</th><th></th></tr></thead><tbody>{}</tbody></table>"#,
        escape(counts.column()),
        rows
    )
}

pub fn sample_data(ds: &Dataset, rows: usize) -> String {
    let header: String = ds.headers().iter().map(|h| format!("<th>{}</th>", escape(h))).collect();
    let body: String = ds
        .head(rows)
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let cells: String = row.iter().map(|c| format!("<td>{}</td>", escape(c))).collect();
            format!(r#"<tr><td class="index">{}</td>{}</tr>"#, i, cells)
        })
        .collect();
    card(
        "Sample Data",
        &format!(
            r#"<div class="scroll-x"><table class="table"><thead><tr><th></th>{}</tr></thead><tbody>{}</tbody></table></div>"#,
            header, body
        ),
    )
}

pub fn categorical_analysis(ds: &Dataset) -> String {
    let columns = ds.categorical_columns();
    if columns.is_empty() {
        return card("Categorical Column Analysis", r#"<p class="text-muted">No categorical columns.</p>"#);
    }
    let body: Result<String, DatasetError> = columns
        .iter()
        .map(|col| -> Result<String, DatasetError> {
            let counts = ds.value_counts(col)?;
            Ok(format!(
                r#"<p>Value counts for <code>{}</code>:</p>{}"#,
                escape(col),
                counts_table(&counts)
            ))
        })
        .collect();
    panel("Categorical Column Analysis", body)
}

pub fn receptor_status(ds: &Dataset) -> String {
    let body = ds.receptor_status().map(|receptors| {
        format!(
            r#"<p>Receptor Status Distribution:</p><pre class="json">{}</pre>"#,
            escape(&receptors.to_string())
        )
    });
    panel("Receptor Status Distribution", body)
}

pub fn survival_analysis(ds: &Dataset) -> String {
    const PALETTE: [&str; 6] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b"];

    let body = ds.survival_by_histology().map(|tab| {
        let scale = tab.max_row_total().max(1);
        let legend: String = tab
            .col_labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                format!(
                    r#"<span class="legend"><i style="background:{}"></i>{} = {}</span>"#,
                    PALETTE[i % PALETTE.len()],
                    escape(&tab.col_name),
                    escape(label)
                )
            })
            .collect();
        let rows: String = tab
            .row_labels
            .iter()
            .zip(&tab.counts)
            .map(|(label, counts)| {
                let segments: String = counts
                    .iter()
                    .enumerate()
                    .filter(|(_, n)| **n > 0)
                    .map(|(i, n)| {
                        format!(
                            r#"<div class="segment" title="{}" style="width:{:.2}%;background:{}"></div>"#,
                            n,
                            *n as f64 * 100.0 / scale as f64,
                            PALETTE[i % PALETTE.len()]
                        )
                    })
                    .collect();
                let cells: String = counts.iter().map(|n| format!(r#"<td class="num">{}</td>"#, n)).collect();
                format!(
                    r#"<tr><td>{}</td>{}<td class="chart"><div class="stack">{}</div></td></tr>"#,
                    escape(label),
                    cells,
                    segments
                )
            })
            .collect();
        let head: String = tab
            .col_labels
            .iter()
            .map(|l| format!(r#"<th class="num">{}</th>"#, escape(l)))
            .collect();
        format!(
            r#"<div class="legend-row">{}</div><table class="table"><thead><tr><th>{}</th>{}<th></th></tr></thead><tbody>{}</tbody></table>"#,
            legend,
            escape(&tab.row_name),
            head,
            rows
        )
    });
    panel("Survival Analysis by Histological Type", body)
}

pub fn gene_expression(ds: &Dataset, prefix: &str) -> String {
    let body = ds.gene_expression_summary(prefix).map(|table| {
        let head: String = table
            .columns
            .iter()
            .map(|c| format!(r#"<th class="num">{}</th>"#, escape(&c.name)))
            .collect();
        let rows: String = STAT_LABELS
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let cells: String = table
                    .columns
                    .iter()
                    .map(|c| format!(r#"<td class="num">{}</td>"#, format_stat(c.stats()[i].1)))
                    .collect();
                format!(r#"<tr><th>{}</th>{}</tr>"#, label, cells)
            })
            .collect();
        format!(
            r#"<p>Summary Statistics for Key Genes:</p><div class="scroll-x"><table class="table"><thead><tr><th></th>{}</tr></thead><tbody>{}</tbody></table></div>"#,
            head, rows
        )
    });
    panel("Gene Expression Insights", body)
}

pub fn correlation_heatmap(ds: &Dataset, max_columns: usize) -> String {
    let numeric = ds.numeric_columns();
    let shown: Vec<&str> = numeric.iter().copied().take(max_columns).collect();
    let note = if shown.len() < numeric.len() {
        format!(
            r#"<p class="text-muted">Showing the first {} of {} numeric columns.</p>"#,
            shown.len(),
            numeric.len()
        )
    } else {
        String::new()
    };
    let body = ds
        .correlation(&shown)
        .map(|matrix| format!(r#"{}<div class="scroll-x">{}</div>"#, note, heatmap::render_svg(&matrix)));
    panel("Correlation Heatmap", body)
}

/// All enabled panels, in sidebar order.
pub fn render_enabled(ds: &Dataset, settings: &DashboardSettings, toggles: &super::Toggles) -> String {
    let mut out = String::new();
    if toggles.sample {
        out.push_str(&sample_data(ds, settings.sample_rows));
    }
    if toggles.categorical {
        out.push_str(&categorical_analysis(ds));
    }
    if toggles.receptor {
        out.push_str(&receptor_status(ds));
    }
    if toggles.survival {
        out.push_str(&survival_analysis(ds));
    }
    if toggles.genes {
        out.push_str(&gene_expression(ds, &settings.gene_prefix));
    }
    if toggles.heatmap {
        out.push_str(&correlation_heatmap(ds, settings.heatmap_max_columns));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
rs_A,rs_B,cn_C,vital.status,ER.Status,PR.Status,HER2.Final.Status,histological.type
1.0,2.0,0,0,Positive,Positive,Negative,ductal
2.0,4.5,1,1,Negative,Positive,Negative,lobular
3.0,1.0,0,0,Positive,Negative,Positive,ductal
";

    fn dataset() -> Dataset {
        Dataset::from_reader(CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_sample_data_limits_rows() {
        let html = sample_data(&dataset(), 2);
        assert_eq!(html.matches(r#"<td class="index">"#).count(), 2);
        assert!(html.contains("<th>histological.type</th>"));
    }

    #[test]
    fn test_categorical_analysis_lists_each_column() {
        let html = categorical_analysis(&dataset());
        for col in ["ER.Status", "PR.Status", "HER2.Final.Status", "histological.type"] {
            assert!(html.contains(&format!("<code>{col}</code>")), "{col}");
        }
        assert!(!html.contains("<code>rs_A</code>"));
    }

    #[test]
    fn test_survival_table_is_zero_filled() {
        let html = survival_analysis(&dataset());
        assert!(html.contains("<td>lobular</td><td class=\"num\">0</td><td class=\"num\">1</td>"));
    }

    #[test]
    fn test_gene_expression_uses_prefix() {
        let html = gene_expression(&dataset(), "rs_");
        assert!(html.contains("rs_A") && html.contains("rs_B"));
        assert!(!html.contains("cn_C"));
        assert!(html.contains("2.000000"));
    }

    #[test]
    fn test_missing_columns_render_inline_error() {
        let ds = Dataset::from_reader("x,y\n1,a\n".as_bytes()).unwrap();
        let html = receptor_status(&ds);
        assert!(html.contains("alert-danger"));
        assert!(html.contains("ER.Status"));
        let html = gene_expression(&ds, "rs_");
        assert!(html.contains("alert-danger"));
    }

    #[test]
    fn test_heatmap_is_capped() {
        let html = correlation_heatmap(&dataset(), 2);
        assert!(html.contains("Showing the first 2 of 4 numeric columns."));
        assert_eq!(html.matches("<title>").count(), 4);
    }
}
