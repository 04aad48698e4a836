//! Web enrichment plugin.
//!
//! Fetches the merchant's website, reduces it to visible text, and asks
//! the model router (extraction task type) for a structured business
//! profile. Everything here is optional enrichment: fetch failures,
//! missing providers, and unparseable replies are warnings, never
//! pipeline errors.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use pitchline_llm::{ModelRouter, TaskRequest, TaskType};
use pitchline_types::{AuditEntry, Citation, ProposalContext, Stage};

use crate::plugin::{PluginDescriptor, PluginError, ProposalPlugin};

/// Explicit deadline for the website fetch; a slow site is a soft
/// failure, not a stalled pipeline.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("pitchline-enrichment/", env!("CARGO_PKG_VERSION"));

/// Upper bound on page text forwarded to the extraction model.
const MAX_PAGE_CHARS: usize = 6000;

const EXTRACTION_SYSTEM_PROMPT: &str = "You extract business profiles from website text. \
Reply with a single JSON object and nothing else. Keys: description (string), \
services (array of strings), brand_tone (string), social_proof (array of strings), \
industry (string), logo_url (string or null). Use empty values for anything \
the text does not support.";

/// Enriches the context from the merchant's website via AI extraction.
pub struct WebEnrichmentPlugin {
    router: Arc<ModelRouter>,
    http: reqwest::Client,
}

#[derive(Debug, Default, Deserialize)]
struct ExtractedProfile {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    services: Vec<String>,
    #[serde(default)]
    brand_tone: Option<String>,
    #[serde(default)]
    social_proof: Vec<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default)]
    logo_url: Option<String>,
}

impl WebEnrichmentPlugin {
    /// Create the plugin over a shared model router.
    pub fn new(router: Arc<ModelRouter>) -> Self {
        Self {
            router,
            http: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| format!("website fetch failed: {e}"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("website returned HTTP {status}"));
        }
        response
            .text()
            .await
            .map_err(|e| format!("website body unreadable: {e}"))
    }
}

/// Reduce an HTML document to visible text, bounded to `max_chars`.
fn strip_html(html: &str, max_chars: usize) -> String {
    static SCRIPT_RE: OnceLock<Regex> = OnceLock::new();
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    static SPACE_RE: OnceLock<Regex> = OnceLock::new();

    let script_re = SCRIPT_RE
        .get_or_init(|| Regex::new(r"(?is)<(script|style|noscript)\b.*?</(script|style|noscript)>").unwrap());
    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap());
    let space_re = SPACE_RE.get_or_init(|| Regex::new(r"\s+").unwrap());

    let without_scripts = script_re.replace_all(html, " ");
    let without_tags = tag_re.replace_all(&without_scripts, " ");
    let collapsed = space_re.replace_all(without_tags.trim(), " ").into_owned();
    match collapsed.char_indices().nth(max_chars) {
        Some((idx, _)) => collapsed[..idx].to_owned(),
        None => collapsed,
    }
}

/// Pull the JSON object out of a model reply that may wrap it in a
/// fenced code block.
fn extract_json(reply: &str) -> &str {
    let trimmed = reply.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or(rest);
        return body.rsplit_once("```").map(|(b, _)| b).unwrap_or(body).trim();
    }
    trimmed
}

fn normalize_url(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_owned()
    } else {
        format!("https://{raw}")
    }
}

#[async_trait]
impl ProposalPlugin for WebEnrichmentPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(
            "web_enrichment",
            "Web Enrichment",
            "1.2.0",
            Stage::Enrich,
            10,
        )
    }

    async fn run(&self, ctx: &mut ProposalContext) -> Result<(), PluginError> {
        let website = ctx.merchant.website.trim().to_owned();
        if website.is_empty() {
            ctx.add_warning("no website provided; skipping web enrichment");
            return Ok(());
        }

        let url = normalize_url(&website);
        let page = match self.fetch_page(&url).await {
            Ok(body) => body,
            Err(reason) => {
                warn!(url = %url, reason = %reason, "web enrichment fetch failed");
                ctx.add_warning(reason);
                return Ok(());
            }
        };

        let text = strip_html(&page, MAX_PAGE_CHARS);
        if text.is_empty() {
            ctx.add_warning(format!("website {url} had no extractable text"));
            return Ok(());
        }

        // Short-circuit before routing when nothing is configured.
        if self.router.available_providers().is_empty() {
            ctx.add_warning("no AI providers configured; skipping website extraction");
            return Ok(());
        }

        let task = TaskRequest::new(
            TaskType::Extraction,
            format!(
                "Extract the business profile for '{}' from the website text.",
                ctx.merchant.business_name
            ),
        )
        .with_system(EXTRACTION_SYSTEM_PROMPT)
        .with_context(text);

        let response = match self.router.route(&task, None).await {
            Ok(response) => response,
            Err(err) => {
                warn!(url = %url, error = %err, "website extraction failed");
                ctx.add_warning(format!("website extraction failed: {err}"));
                return Ok(());
            }
        };

        let profile: ExtractedProfile = match serde_json::from_str(extract_json(&response.content))
        {
            Ok(profile) => profile,
            Err(err) => {
                ctx.add_warning(format!("extraction reply was not valid JSON: {err}"));
                return Ok(());
            }
        };

        debug!(url = %url, model = %response.model, "website profile extracted");

        ctx.enriched.description = profile.description.filter(|s| !s.is_empty());
        ctx.enriched.services = profile.services;
        ctx.enriched.brand_tone = profile.brand_tone.filter(|s| !s.is_empty());
        ctx.enriched.social_proof = profile.social_proof;
        ctx.enriched.logo_url = profile.logo_url.filter(|s| !s.is_empty());

        // Backfill only: never overwrite a caller-supplied industry. The
        // interchange plugin runs after this one and reads the result.
        if ctx.merchant.industry.trim().is_empty() {
            if let Some(industry) = profile.industry.filter(|s| !s.is_empty()) {
                ctx.merchant.industry = industry;
            }
        }

        ctx.add_citation(Citation::new(
            url.clone(),
            "Business profile extracted from the merchant's website",
            0.7,
        ));
        ctx.push_audit(
            AuditEntry::success(
                Stage::Enrich,
                "web_enrichment",
                format!("extracted profile from {url}"),
                response.latency_ms,
            )
            .with_model(response.model),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_removes_scripts_and_tags() {
        let html = r#"<html><head><style>body{color:red}</style>
            <script>tracker()</script></head>
            <body><h1>ACME  Plumbing</h1><p>Since 1984.</p></body></html>"#;
        let text = strip_html(html, 1000);
        assert_eq!(text, "ACME Plumbing Since 1984.");
    }

    #[test]
    fn strip_html_bounds_length() {
        let html = "<p>".to_owned() + &"word ".repeat(5000) + "</p>";
        let text = strip_html(&html, 100);
        assert!(text.chars().count() <= 100);
    }

    #[test]
    fn extract_json_passthrough() {
        assert_eq!(extract_json(r#"{"a":1}"#), r#"{"a":1}"#);
    }

    #[test]
    fn extract_json_unwraps_fences() {
        let reply = "```json\n{\"description\":\"cafe\"}\n```";
        assert_eq!(extract_json(reply), "{\"description\":\"cafe\"}");
    }

    #[test]
    fn normalize_url_adds_scheme() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
    }

    #[test]
    fn profile_deserializes_with_missing_keys() {
        let profile: ExtractedProfile = serde_json::from_str(r#"{"description":"x"}"#).unwrap();
        assert_eq!(profile.description.as_deref(), Some("x"));
        assert!(profile.services.is_empty());
        assert!(profile.logo_url.is_none());
    }
}
