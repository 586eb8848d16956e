//! Correlation heatmap rendered as inline SVG.

use std::fmt::Write;

use omicscope_data::CorrelationMatrix;

use super::escape;

const CELL: usize = 14;
const LABEL_SPACE: usize = 140;
const LEGEND_WIDTH: usize = 60;

const COOL: (f64, f64, f64) = (59.0, 76.0, 192.0);
const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

/// Diverging blue → grey → red scale over `[-1, 1]`. Undefined
/// correlations are drawn white.
pub fn coolwarm(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return "#ffffff".to_string();
    };
    let v = v.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 { (NEUTRAL, COOL, -v) } else { (NEUTRAL, WARM, v) };
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    format!("#{:02x}{:02x}{:02x}", mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

pub fn render_svg(matrix: &CorrelationMatrix) -> String {
    let n = matrix.len();
    let grid = n * CELL;
    let width = LABEL_SPACE + grid + LEGEND_WIDTH;
    let height = LABEL_SPACE + grid;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="heatmap" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-size="10">"#
    );

    for (i, label) in matrix.labels.iter().enumerate() {
        let label = escape(label);
        let y = LABEL_SPACE + i * CELL + CELL / 2 + 3;
        let x = LABEL_SPACE + i * CELL + CELL / 2 + 3;
        let _ = write!(
            svg,
            r#"<text x="{}" y="{y}" text-anchor="end">{label}</text><text transform="translate({x},{}) rotate(-90)">{label}</text>"#,
            LABEL_SPACE - 4,
            LABEL_SPACE - 4,
        );
    }

    for row in 0..n {
        for col in 0..n {
            let value = matrix.get(row, col);
            let title = match value {
                Some(v) => format!("{} × {}: {:.3}", matrix.labels[row], matrix.labels[col], v),
                None => format!("{} × {}: undefined", matrix.labels[row], matrix.labels[col]),
            };
            let _ = write!(
                svg,
                r#"<rect x="{}" y="{}" width="{CELL}" height="{CELL}" fill="{}"><title>{}</title></rect>"#,
                LABEL_SPACE + col * CELL,
                LABEL_SPACE + row * CELL,
                coolwarm(value),
                escape(&title),
            );
        }
    }

    // colour bar from +1 (top) to -1 (bottom)
    let bar_x = LABEL_SPACE + grid + 16;
    let steps = 20;
    let step_h = grid.max(CELL * 4) as f64 / steps as f64;
    for s in 0..steps {
        let v = 1.0 - 2.0 * (s as f64 + 0.5) / steps as f64;
        let _ = write!(
            svg,
            r#"<rect x="{bar_x}" y="{:.1}" width="12" height="{:.1}" fill="{}"/>"#,
            LABEL_SPACE as f64 + s as f64 * step_h,
            step_h + 0.5,
            coolwarm(Some(v)),
        );
    }
    let _ = write!(
        svg,
        r#"<text x="{}" y="{}">1.0</text><text x="{}" y="{:.0}">-1.0</text></svg>"#,
        bar_x + 16,
        LABEL_SPACE + 8,
        bar_x + 16,
        LABEL_SPACE as f64 + steps as f64 * step_h,
    );
    svg
}
