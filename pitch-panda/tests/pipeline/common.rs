//! Shared fixtures: a scripted LLM client and a served company website

use async_trait::async_trait;
use pitch_panda::llm::{ChatRequest, ChatResponse, LlmClient, LlmError};
use pitch_panda::pipeline::{PipelineContext, PipelineOptions};
use pitch_panda::schemas::SlideImage;
use pitch_panda::scraper::build_http_client;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Distinctive phrases from each stage's instructions
pub const VISION: &str = "You analyze pitch deck slides";
pub const EXTRA_CONTEXT: &str = "You extract structured data from private context";
pub const EVIDENCE: &str = "You extract factual evidence";
pub const CORE: &str = "synthesizing the core of a startup";
pub const BUSINESS: &str = "assessing startup business fundamentals";
pub const MARKET: &str = "You are a market analyst";
pub const RISK: &str = "identifying investment risks";
pub const MEMO: &str = "writing a factual investment memo";

enum Reply {
    Content(String),
    Fail { status: u16 },
}

struct Rule {
    needle: String,
    reply: Reply,
    delay: Option<Duration>,
}

/// LLM client answering from a script.
///
/// Each request is matched against the rules in insertion order by looking
/// for the rule's needle anywhere in the request's message text.
#[derive(Default)]
pub struct MockLlm {
    rules: Vec<Rule>,
    requests: Mutex<Vec<String>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, needle: &str, content: impl Into<String>) -> Self {
        self.rules.push(Rule {
            needle: needle.to_string(),
            reply: Reply::Content(content.into()),
            delay: None,
        });
        self
    }

    pub fn respond_after(mut self, needle: &str, content: impl Into<String>, delay: Duration) -> Self {
        self.rules.push(Rule {
            needle: needle.to_string(),
            reply: Reply::Content(content.into()),
            delay: Some(delay),
        });
        self
    }

    pub fn fail(mut self, needle: &str) -> Self {
        self.rules.push(Rule {
            needle: needle.to_string(),
            reply: Reply::Fail { status: 500 },
            delay: None,
        });
        self
    }

    /// How many requests contained `needle`
    pub fn calls_matching(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|text| text.contains(needle))
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let text = request
            .messages
            .iter()
            .map(|m| m.text())
            .collect::<Vec<_>>()
            .join("\n");
        self.requests.lock().unwrap().push(text.clone());

        let Some(rule) = self.rules.iter().find(|r| text.contains(&r.needle)) else {
            return Err(LlmError::Api {
                status: 404,
                body: "no scripted reply".to_string(),
            });
        };

        if let Some(delay) = rule.delay {
            tokio::time::sleep(delay).await;
        }

        match &rule.reply {
            Reply::Content(content) => Ok(ChatResponse {
                content: content.clone(),
                model: Some("mock".to_string()),
                usage: None,
            }),
            Reply::Fail { status } => Err(LlmError::Api {
                status: *status,
                body: "scripted failure".to_string(),
            }),
        }
    }
}

pub const SLIDE_JSON: &str = r#"{"page": 42, "slide_type": "traction", "title": "Growth", "main_bullets": ["120 customers"]}"#;

pub const EXTRA_CONTEXT_JSON: &str = r#"{"extra_context": {
    "mrr": "$40k", "mrr_label": "MRR", "mrr_is_explicit": true,
    "arr": "$1.2M", "arr_label": "revenue"
}}"#;

pub const EVIDENCE_JSON: &str = r#"{
    "problem_snippets": [{"text": "Invoices take weeks to reconcile", "source": {"kind": "website", "location": "/"}}],
    "solution_snippets": [{"text": "Automated reconciliation", "source": {"kind": "deck_slide", "page": 1}}],
    "traction_facts": [{"metric_type": "customers", "value": 120, "source": {"kind": "deck_slide", "page": 1}}]
}"#;

pub const CORE_JSON: &str = r#"{
    "problem": {"one_liner": "Reconciliation is slow", "details": "Finance teams reconcile by hand.", "target_users": "Mid-market finance teams", "pain_points": ["manual work"]},
    "solution": {"one_liner": "Automated reconciliation", "details": "Matches invoices to payments.", "features": ["bank sync"]},
    "value_proposition": {"summary": "Close the books faster", "key_benefits": ["fewer errors"]}
}"#;

pub const BUSINESS_JSON: &str = r#"{
    "team": {"size": 12, "members": [{"name": "Ada Park", "role": "CEO", "background": "Ex-Stripe"}]},
    "traction": {"metrics": [{"metric": "Customers", "value": 120}], "partnerships": [], "milestones": ["Seed closed"]},
    "competition": {"competitors": [{"name": "LedgerCo", "description": "Legacy tool", "differentiation": "Real-time sync"}], "positioning": "Mid-market"},
    "funding": {"rounds": [{"type": "Seed", "amount": "$3M", "investors": ["Fund A"], "status": "closed"}], "total_raised": "$3M", "status": "Raising Series A"},
    "business_model": {"summary": "SaaS subscription", "monetization": ["subscription"], "pricing": "$499/month"}
}"#;

pub const MARKET_JSON: &str = r#"{"market": {
    "tam": "$20B", "tam_label": "TAM", "tam_is_explicit": true,
    "market_size_summary": "Large finance automation market",
    "growth_trends": ["Cloud finance adoption"],
    "target_customers": "Mid-market companies"
}}"#;

pub const RISK_JSON: &str = r#"{
    "risks": [
        {"category": "competition", "description": "Crowded space", "severity": "medium"},
        {"category": "team", "description": "No CFO", "severity": "high"}
    ],
    "missing_info": ["Churn figures"]
}"#;

pub const MEMO_TEXT: &str = "## Executive Summary\n\nAcme automates invoice reconciliation.";

/// Every stage answers successfully
pub fn scripted_llm() -> MockLlm {
    MockLlm::new()
        .respond(VISION, SLIDE_JSON)
        .respond(EXTRA_CONTEXT, EXTRA_CONTEXT_JSON)
        .respond(EVIDENCE, EVIDENCE_JSON)
        .respond(CORE, CORE_JSON)
        .respond(BUSINESS, BUSINESS_JSON)
        .respond(MARKET, MARKET_JSON)
        .respond(RISK, RISK_JSON)
        .respond(MEMO, MEMO_TEXT)
}

pub const LANDING_HTML: &str = r#"<html><body>
<nav><a href="/">Home</a><a href="/about">About</a></nav>
<main>
  <h1>Acme</h1>
  <p>Invoice reconciliation for finance teams.</p>
  <h2>Why Acme</h2>
  <p>Close the books in hours, not weeks.</p>
  <a href="/about">About us</a>
</main>
<script>track()</script>
</body></html>"#;

pub const ABOUT_HTML: &str = r#"<html><body><main>
  <h2>Our Team</h2>
  <p>Founded by former Stripe engineers.</p>
</main></body></html>"#;

/// Serve a two-page company site
pub async fn website() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LANDING_HTML))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ABOUT_HTML))
        .mount(&server)
        .await;

    server
}

/// Nothing listens here; connections are refused
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

pub fn context(llm: Arc<MockLlm>) -> PipelineContext {
    let http = build_http_client(Duration::from_secs(5)).unwrap();
    PipelineContext::new(llm, http).with_options(PipelineOptions {
        vision_concurrency: 3,
        max_pages: 3,
        ..Default::default()
    })
}

pub fn slides(count: u32) -> Vec<SlideImage> {
    (1..=count)
        .map(|page| SlideImage {
            page,
            image_data_url: "data:image/png;base64,iVBORw0KGgo=".to_string(),
            file_name: Some(format!("slide{}.png", page)),
        })
        .collect()
}
