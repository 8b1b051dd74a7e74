use async_trait::async_trait;
use fluxion_core::FluxionError;

/// Seam for model invocation. Steps and entries only ever see this trait,
/// so tests can inject failing or scripted clients.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, FluxionError>;
}

/// Deterministic, provider-less client.
///
/// Classification prompts get a keyword-derived label; everything else gets
/// a canned but non-empty completion echoing the prompt. Stands in until a
/// real provider is wired up.
pub struct OfflineClient;

#[async_trait]
impl LlmClient for OfflineClient {
    async fn complete(&self, _model: &str, prompt: &str) -> Result<String, FluxionError> {
        if prompt.starts_with("Classify") {
            return Ok(classify_label(prompt).to_string());
        }
        if prompt.starts_with("Draft a polite") {
            return Ok(format!(
                "Hello,\n\nThank you for contacting support. We have reviewed your request \
and are looking into it now. You will hear back from us shortly with next steps.\n\n\
Best regards,\nThe Support Team\n\n[context: {}]",
                first_line(prompt)
            ));
        }
        Ok(format!("LLM(offline): {}", first_line(prompt)))
    }
}

fn classify_label(prompt: &str) -> &'static str {
    let lower = prompt.to_lowercase();
    if lower.contains("refund") || lower.contains("charge") || lower.contains("invoice") {
        "billing"
    } else if lower.contains("crash") || lower.contains("error") || lower.contains("bug") {
        "bug"
    } else if lower.contains("feature") || lower.contains("request") {
        "feature"
    } else {
        "general"
    }
}

fn first_line(prompt: &str) -> &str {
    prompt.lines().next().unwrap_or(prompt)
}
