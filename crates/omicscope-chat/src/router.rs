//! Query router - classifies a question by ordered rules and answers it.
//!
//! Rules are evaluated top to bottom and the first matching rule answers, so
//! a question mentioning both "histological type" and "vital status" gets the
//! histological summary. Once the dataset is fixed, classification is a pure
//! function of the query string.

use std::sync::{Arc, LazyLock};
use std::time::Instant;

use omicscope_data::{columns, Dataset, DatasetError};
use omicscope_llm::{multi_omics_prompt, LlmBackend, LlmError, LlmRequest, LlmResponse};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const GREETING_PHRASES: &[&str] = &[
    "hi", "hello", "hey", "good morning", "good afternoon", "how are you", "what's up",
];

pub const GREETING_REPLY: &str = "Hello! How can I assist you with multi-omics? 😊";

static GREETING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:hi|hello|hey|good morning|good afternoon|how are you|what's up)\b")
        .expect("greeting pattern is a valid regex")
});

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    HistologicalTypeSummary,
    VitalStatusSummary,
    ReceptorStatusSummary,
    GeneExpressionSummary,
    GeneralLlmQuery,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting                => "greeting",
            Intent::HistologicalTypeSummary => "histological_type_summary",
            Intent::VitalStatusSummary      => "vital_status_summary",
            Intent::ReceptorStatusSummary   => "receptor_status_summary",
            Intent::GeneExpressionSummary   => "gene_expression_summary",
            Intent::GeneralLlmQuery         => "general_llm_query",
        }
    }
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),
    #[error("No routing rule matched the query")]
    NoRule,
}

/// Predicate half of a rule.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Any of the listed words or phrases, on word boundaries, ignoring case.
    AnyWord(Regex),
    /// Case-insensitive substring.
    Phrase(String),
    /// Catch-all.
    Always,
}

impl Matcher {
    pub fn any_word(phrases: &[&str]) -> Result<Self, regex::Error> {
        let alternation = phrases.iter().map(|p| regex::escape(p)).collect::<Vec<_>>().join("|");
        Ok(Matcher::AnyWord(Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))?))
    }

    pub fn greeting() -> Self {
        Matcher::AnyWord(GREETING_RE.clone())
    }

    pub fn phrase(phrase: &str) -> Self {
        Matcher::Phrase(phrase.to_lowercase())
    }

    pub fn matches(&self, query: &str) -> bool {
        match self {
            Matcher::AnyWord(re)    => re.is_match(query),
            Matcher::Phrase(phrase) => query.to_lowercase().contains(phrase.as_str()),
            Matcher::Always         => true,
        }
    }
}

/// Inputs available to a dataset handler.
pub struct RouteContext<'a> {
    pub query: &'a str,
    pub dataset: &'a Dataset,
    pub gene_prefix: &'a str,
}

/// Handler half of a rule.
#[derive(Clone, Copy)]
pub enum RuleHandler {
    /// Answer locally.
    Reply(fn(&RouteContext<'_>) -> Result<String, DatasetError>),
    /// Wrap the query in the multi-omics template and ask the LLM backend.
    Delegate,
}

impl std::fmt::Debug for RuleHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleHandler::Reply(_) => f.write_str("Reply"),
            RuleHandler::Delegate => f.write_str("Delegate"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub intent: Intent,
    pub matcher: Matcher,
    pub handler: RuleHandler,
}

impl Rule {
    pub fn new(intent: Intent, matcher: Matcher, handler: RuleHandler) -> Self {
        Self { intent, matcher, handler }
    }
}

/// Metadata of an LLM-answered question.
#[derive(Debug, Clone)]
pub struct Completion {
    pub response: LlmResponse,
    pub backend: String,
    pub latency_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub intent: Intent,
    pub text: String,
    pub completion: Option<Completion>,
}

// ── Default rule set ──────────────────────────────────────────────────────────

fn greeting_reply(_: &RouteContext<'_>) -> Result<String, DatasetError> {
    Ok(GREETING_REPLY.to_string())
}

fn histological_types(ctx: &RouteContext<'_>) -> Result<String, DatasetError> {
    let counts = ctx.dataset.value_counts(columns::HISTOLOGICAL_TYPE)?;
    Ok(format!("Histological types in the dataset:\n{}", counts))
}

fn vital_status(ctx: &RouteContext<'_>) -> Result<String, DatasetError> {
    let counts = ctx.dataset.value_counts(columns::VITAL_STATUS)?;
    Ok(format!("Vital status distribution:\n{}", counts))
}

fn receptor_status(ctx: &RouteContext<'_>) -> Result<String, DatasetError> {
    let receptors = ctx.dataset.receptor_status()?;
    Ok(format!("Receptor status distribution:\n{}", receptors))
}

fn gene_expression(ctx: &RouteContext<'_>) -> Result<String, DatasetError> {
    let summary = ctx.dataset.gene_expression_summary(ctx.gene_prefix)?;
    Ok(format!("Summary statistics for key genes:\n{}", summary))
}

/// Greeting, four dataset summaries, then the LLM fallback.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new(Intent::Greeting, Matcher::greeting(), RuleHandler::Reply(greeting_reply)),
        Rule::new(Intent::HistologicalTypeSummary, Matcher::phrase("histological type"), RuleHandler::Reply(histological_types)),
        Rule::new(Intent::VitalStatusSummary, Matcher::phrase("vital status"), RuleHandler::Reply(vital_status)),
        Rule::new(Intent::ReceptorStatusSummary, Matcher::phrase("receptor status"), RuleHandler::Reply(receptor_status)),
        Rule::new(Intent::GeneExpressionSummary, Matcher::phrase("gene expression"), RuleHandler::Reply(gene_expression)),
        Rule::new(Intent::GeneralLlmQuery, Matcher::Always, RuleHandler::Delegate),
    ]
}

// ── Router ────────────────────────────────────────────────────────────────────

pub struct QueryRouter {
    dataset: Arc<Dataset>,
    llm: Arc<dyn LlmBackend>,
    rules: Vec<Rule>,
    gene_prefix: String,
}

impl QueryRouter {
    pub fn new(dataset: Arc<Dataset>, llm: Arc<dyn LlmBackend>) -> Self {
        Self {
            dataset,
            llm,
            rules: default_rules(),
            gene_prefix: columns::GENE_EXPRESSION_PREFIX.to_string(),
        }
    }

    pub fn with_gene_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.gene_prefix = prefix.into();
        self
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn gene_prefix(&self) -> &str {
        &self.gene_prefix
    }

    pub fn llm(&self) -> &Arc<dyn LlmBackend> {
        &self.llm
    }

    /// First rule whose predicate accepts the query.
    pub fn matching_rule(&self, query: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.matcher.matches(query))
    }

    pub fn classify(&self, query: &str) -> Option<Intent> {
        self.matching_rule(query).map(|r| r.intent)
    }

    /// Answer `query`. Dataset lookups fail with the missing column named;
    /// LLM failures propagate unchanged.
    pub async fn route(&self, query: &str) -> Result<Answer, RouteError> {
        let rule = self.matching_rule(query).ok_or(RouteError::NoRule)?;
        tracing::debug!(intent = rule.intent.as_str(), "Query classified");

        match rule.handler {
            RuleHandler::Reply(handler) => {
                let ctx = RouteContext {
                    query,
                    dataset: &self.dataset,
                    gene_prefix: &self.gene_prefix,
                };
                Ok(Answer { intent: rule.intent, text: handler(&ctx)?, completion: None })
            }
            RuleHandler::Delegate => {
                let started = Instant::now();
                let response = self.llm.complete(LlmRequest::prompt(multi_omics_prompt(query))).await?;
                let latency_ms = started.elapsed().as_millis() as u64;

                tracing::info!(
                    model = self.llm.model_id(),
                    is_local = self.llm.is_local(),
                    latency_ms,
                    "LLM answered query"
                );

                Ok(Answer {
                    intent: rule.intent,
                    text: response.content.clone(),
                    completion: Some(Completion {
                        response,
                        backend: self.llm.backend_name().to_string(),
                        latency_ms,
                    }),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    const CSV: &str = "\
rs_CLEC3A,rs_CPB1,vital.status,PR.Status,ER.Status,HER2.Final.Status,histological.type
0.5,6.5,0,Positive,Positive,Negative,infiltrating lobular carcinoma
1.5,3.5,0,Positive,Positive,Negative,infiltrating ductal carcinoma
2.5,4.5,1,Negative,Negative,Positive,infiltrating ductal carcinoma
";

    #[derive(Default)]
    struct EchoLlm {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmBackend for EchoLlm {
        async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
            let prompt = req.messages[0].content.clone();
            self.prompts.lock().unwrap().push(prompt);
            Ok(LlmResponse {
                content: "Multi-omics integrates genome and proteome data.".to_string(),
                model: "stub".to_string(),
                prompt_tokens: 1,
                completion_tokens: 1,
            })
        }
        fn model_id(&self) -> &str { "stub" }
        fn backend_name(&self) -> &str { "stub" }
        fn is_local(&self) -> bool { true }
    }

    fn router_with(csv: &str) -> (QueryRouter, Arc<EchoLlm>) {
        let llm = Arc::new(EchoLlm::default());
        let dataset = Arc::new(Dataset::from_reader(csv.as_bytes()).unwrap());
        (QueryRouter::new(dataset, llm.clone()), llm)
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let intents: Vec<Intent> = default_rules().iter().map(|r| r.intent).collect();
        assert_eq!(
            intents,
            vec![
                Intent::Greeting,
                Intent::HistologicalTypeSummary,
                Intent::VitalStatusSummary,
                Intent::ReceptorStatusSummary,
                Intent::GeneExpressionSummary,
                Intent::GeneralLlmQuery,
            ]
        );
    }

    #[test]
    fn test_greeting_matcher_uses_word_boundaries() {
        let m = Matcher::greeting();
        assert!(m.matches("Hi there"));
        assert!(m.matches("GOOD MORNING!"));
        assert!(m.matches("hey, what's up?"));
        assert!(!m.matches("which histological type is most common"));
        assert!(!m.matches("they study proteomics"));
    }

    #[test]
    fn test_any_word_matches_greeting_list() {
        let m = Matcher::any_word(GREETING_PHRASES).unwrap();
        for phrase in GREETING_PHRASES {
            assert!(m.matches(&format!("well, {phrase}!")), "{phrase}");
            assert!(Matcher::greeting().matches(phrase), "{phrase}");
        }
    }

    #[test]
    fn test_phrase_matcher_ignores_case() {
        assert!(Matcher::phrase("vital status").matches("Show VITAL STATUS please"));
        assert!(!Matcher::phrase("vital status").matches("vital-status"));
    }

    #[test]
    fn test_classification_priority() {
        let (router, _) = router_with(CSV);
        assert_eq!(router.classify("hello, show the vital status"), Some(Intent::Greeting));
        assert_eq!(
            router.classify("histological type and vital status"),
            Some(Intent::HistologicalTypeSummary)
        );
        assert_eq!(
            router.classify("gene expression by receptor status"),
            Some(Intent::ReceptorStatusSummary)
        );
        assert_eq!(router.classify("what is metabolomics?"), Some(Intent::GeneralLlmQuery));
    }

    #[tokio::test]
    async fn test_greeting_ignores_dataset() {
        let (router, llm) = router_with("a\n1\n");
        let answer = router.route("Good afternoon").await.unwrap();
        assert_eq!(answer.text, GREETING_REPLY);
        assert!(llm.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vital_status_summary() {
        let (router, _) = router_with(CSV);
        let answer = router.route("What is the Vital Status breakdown?").await.unwrap();
        assert_eq!(answer.intent, Intent::VitalStatusSummary);
        let lines: Vec<&str> = answer.text.lines().collect();
        assert_eq!(lines[0], "Vital status distribution:");
        assert_eq!(lines[1], "0    2");
        assert_eq!(lines[2], "1    1");
    }

    #[tokio::test]
    async fn test_gene_expression_uses_prefix() {
        let (router, _) = router_with(CSV);
        let answer = router.route("gene expression overview").await.unwrap();
        assert!(answer.text.starts_with("Summary statistics for key genes:\n"));
        assert!(answer.text.contains("rs_CLEC3A"));
        assert!(answer.text.contains("rs_CPB1"));

        let (router, _) = router_with(CSV);
        let router = router.with_gene_prefix("cn_");
        let err = router.route("gene expression overview").await.unwrap_err();
        assert!(matches!(err, RouteError::Dataset(DatasetError::NoColumnsWithPrefix(_))));
    }

    #[tokio::test]
    async fn test_fallback_wraps_query_in_template() {
        let (router, llm) = router_with(CSV);
        let answer = router.route("Explain biomarker discovery").await.unwrap();
        assert_eq!(answer.intent, Intent::GeneralLlmQuery);
        assert_eq!(answer.text, "Multi-omics integrates genome and proteome data.");
        assert_eq!(answer.completion.as_ref().unwrap().backend, "stub");

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("#### Query:\nExplain biomarker discovery\n"));
    }

    #[tokio::test]
    async fn test_missing_column_names_the_column() {
        let (router, _) = router_with("sample,rs_A\nS1,1\n");
        for (query, column) in [
            ("histological type?", columns::HISTOLOGICAL_TYPE),
            ("vital status?", columns::VITAL_STATUS),
            ("receptor status?", columns::ER_STATUS),
        ] {
            match router.route(query).await {
                Err(RouteError::Dataset(DatasetError::MissingColumn(c))) => assert_eq!(c, column),
                other => panic!("expected missing column for {query:?}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_custom_rules_without_fallback() {
        let (router, _) = router_with(CSV);
        let router = router.with_rules(vec![Rule::new(
            Intent::Greeting,
            Matcher::phrase("ping"),
            RuleHandler::Reply(greeting_reply),
        )]);
        assert!(matches!(router.route("unrelated").await, Err(RouteError::NoRule)));
        assert_eq!(router.route("ping").await.unwrap().text, GREETING_REPLY);
    }
}
