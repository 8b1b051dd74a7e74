use async_trait::async_trait;
use fluxion_core::{FluxionError, NodeConfig, RunTrace};
use fluxion_flows::{
    DecisionStep, HttpStep, HumanApproveStep, LlmCallStep, LlmClient, ParseJsonStep,
};
use fluxion_runtime::{EgressPolicy, RetryPolicy, Step, StepContext, StepOutput};
use serde_json::{json, Value};
use std::sync::Arc;

struct ScriptedClient;

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, FluxionError> {
        Ok(format!("{}::{}", model, prompt))
    }
}

fn ctx(config: NodeConfig, input: Value) -> StepContext {
    StepContext {
        node: "test-node".into(),
        config,
        input,
        trace: RunTrace::new(),
        run_id: "run-1".into(),
    }
}

fn value_of(output: StepOutput) -> Value {
    match output {
        StepOutput::Value(v) => v,
        StepOutput::Suspend { text } => panic!("unexpected suspension: {}", text),
    }
}

#[tokio::test]
async fn llm_step_prefers_the_prompt_field() {
    let step = LlmCallStep::new(Arc::new(ScriptedClient), RetryPolicy::default());
    let config = NodeConfig::LlmCall {
        provider: "offline".into(),
        model: "sim-1".into(),
    };

    let out = step
        .execute(ctx(config.clone(), json!({"prompt": "summarize this"})))
        .await
        .unwrap();
    assert_eq!(value_of(out)["text"], "sim-1::summarize this");

    // Without a prompt field the whole input is serialized.
    let out = step
        .execute(ctx(config, json!({"subject": "hi"})))
        .await
        .unwrap();
    let text = value_of(out)["text"].as_str().unwrap().to_string();
    assert!(text.starts_with("sim-1::"));
    assert!(text.contains("\"subject\""));
}

#[tokio::test]
async fn http_step_rejects_unlisted_hosts_before_any_io() {
    let step = HttpStep::new(EgressPolicy::default());
    let config = NodeConfig::Http {
        url: "https://internal.corp/secrets".into(),
    };

    let err = step.execute(ctx(config, json!({}))).await.unwrap_err();
    assert!(matches!(err, FluxionError::BlockedEgress(_)));
    assert!(err.to_string().contains("internal.corp"));
}

#[tokio::test]
async fn http_step_rejects_non_http_schemes() {
    let step = HttpStep::new(EgressPolicy::default());
    let config = NodeConfig::Http {
        url: "file:///etc/passwd".into(),
    };

    let err = step.execute(ctx(config, json!({}))).await.unwrap_err();
    assert!(matches!(err, FluxionError::BlockedEgress(_)));
}

#[tokio::test]
async fn approval_step_picks_the_first_known_text_field() {
    let step = HumanApproveStep;
    let config = NodeConfig::HumanApprove { queue: None };

    let out = step
        .execute(ctx(
            config.clone(),
            json!({"text": "draft body", "plan": "ignored"}),
        ))
        .await
        .unwrap();
    match out {
        StepOutput::Suspend { text } => assert_eq!(text, "draft body"),
        other => panic!("expected suspension, got {:?}", other),
    }

    // No known field: the payload itself becomes the review text.
    let out = step
        .execute(ctx(config, json!({"other": 1})))
        .await
        .unwrap();
    match out {
        StepOutput::Suspend { text } => assert!(text.contains("\"other\"")),
        other => panic!("expected suspension, got {:?}", other),
    }
}

#[tokio::test]
async fn decision_step_maps_flag_to_branch() {
    let step = DecisionStep;

    let out = step
        .execute(ctx(NodeConfig::Decision, json!({"flag": true})))
        .await
        .unwrap();
    assert_eq!(value_of(out)["branch"], "yes");

    let out = step
        .execute(ctx(NodeConfig::Decision, json!({"flag": false})))
        .await
        .unwrap();
    assert_eq!(value_of(out)["branch"], "no");

    let err = step
        .execute(ctx(NodeConfig::Decision, json!({"flag": "yes"})))
        .await
        .unwrap_err();
    assert!(matches!(err, FluxionError::InvalidInput(_)));
    assert!(err.to_string().contains("test-node"));
}

#[tokio::test]
async fn parse_json_step_decodes_the_text_field() {
    let step = ParseJsonStep;

    let out = step
        .execute(ctx(
            NodeConfig::ParseJson,
            json!({"text": "{\"a\": [1, 2]}"}),
        ))
        .await
        .unwrap();
    assert_eq!(value_of(out)["json"]["a"][1], 2);

    let err = step
        .execute(ctx(NodeConfig::ParseJson, json!({"text": "not json"})))
        .await
        .unwrap_err();
    assert!(matches!(err, FluxionError::InvalidInput(_)));

    let err = step
        .execute(ctx(NodeConfig::ParseJson, json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, FluxionError::InvalidInput(_)));
}
