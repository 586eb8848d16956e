//! HTTP handlers for all web routes.

pub mod chat;
pub mod dashboard;
pub mod heatmap;
pub mod panels;
pub mod voice;

use omicscope_common::Language;
use serde::Deserialize;

/// Raw dashboard query parameters. Checkboxes arrive as `on` when ticked and
/// are absent otherwise.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DashboardParams {
    pub lang: Option<String>,
    pub sample: Option<String>,
    pub categorical: Option<String>,
    pub receptor: Option<String>,
    pub survival: Option<String>,
    pub genes: Option<String>,
    pub heatmap: Option<String>,
    pub voice: Option<String>,
    /// Reason code of a failed form submission.
    pub error: Option<String>,
}

/// Sidebar state: response language plus the panel and voice toggles.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Toggles {
    pub language: Language,
    pub sample: bool,
    pub categorical: bool,
    pub receptor: bool,
    pub survival: bool,
    pub genes: bool,
    pub heatmap: bool,
    pub voice: bool,
}

fn ticked(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some("on" | "true" | "1"))
}

impl From<&DashboardParams> for Toggles {
    fn from(p: &DashboardParams) -> Self {
        let language = match p.lang.as_deref() {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::debug!(lang = raw, "Unknown language, using default");
                Language::default()
            }),
            None => Language::default(),
        };
        Self {
            language,
            sample: ticked(&p.sample),
            categorical: ticked(&p.categorical),
            receptor: ticked(&p.receptor),
            survival: ticked(&p.survival),
            genes: ticked(&p.genes),
            heatmap: ticked(&p.heatmap),
            voice: ticked(&p.voice),
        }
    }
}

impl Toggles {
    /// `(parameter, enabled, sidebar label)` for every checkbox.
    pub fn flags(&self) -> [(&'static str, bool, &'static str); 7] {
        [
            ("categorical", self.categorical, "Show Categorical Column Analysis"),
            ("sample",      self.sample,      "Show Sample Data"),
            ("receptor",    self.receptor,    "Show Receptor Status Distribution"),
            ("survival",    self.survival,    "Show Survival Analysis"),
            ("genes",       self.genes,       "Show Gene Expression Insights"),
            ("heatmap",     self.heatmap,     "Show Correlation Heatmap"),
            ("voice",       self.voice,       "Enable Voice Input"),
        ]
    }

    /// Query string that reproduces this sidebar state.
    pub fn query_string(&self) -> String {
        let mut parts = vec![format!("lang={}", self.language.as_str())];
        parts.extend(
            self.flags()
                .iter()
                .filter(|(_, on, _)| *on)
                .map(|(name, _, _)| format!("{name}=on")),
        );
        parts.join("&")
    }
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&'  => out.push_str("&amp;"),
            '<'  => out.push_str("&lt;"),
            '>'  => out.push_str("&gt;"),
            '"'  => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _    => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles_from_params() {
        let params = DashboardParams {
            lang: Some("ta".into()),
            receptor: Some("on".into()),
            heatmap: Some("true".into()),
            genes: Some("off".into()),
            ..Default::default()
        };
        let t = Toggles::from(&params);
        assert_eq!(t.language, Language::Tamil);
        assert!(t.receptor && t.heatmap);
        assert!(!t.genes && !t.sample && !t.voice);
        assert_eq!(t.query_string(), "lang=Tamil&receptor=on&heatmap=on");
    }

    #[test]
    fn test_unknown_language_falls_back() {
        let params = DashboardParams { lang: Some("Klingon".into()), ..Default::default() };
        assert_eq!(Toggles::from(&params).language, Language::English);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<b>"R&D" 'x'</b>"#), "&lt;b&gt;&quot;R&amp;D&quot; &#39;x&#39;&lt;/b&gt;");
    }
}
