mod common;

use caselaw_rag::types::{AttemptOutcome, Outcome};
use common::*;

const SMITH_ANSWER: &str = "Reasoning:\nThe query concerns Smith v Jones.\n\nFinal Answer:\nThe court held the contract void [1], following [2] and distinguishing [3].";

#[tokio::test]
async fn smith_v_jones_context_follows_rerank_order() {
    let llm = FakeLlm::answering("primary", SMITH_ANSWER);
    let harness = HarnessBuilder::new().smith_v_jones().llm(llm.clone()).build();

    let result = harness
        .pipeline
        .handle_query("Summarize Smith v. Jones", "user-1")
        .await;

    assert_eq!(result.outcome, Outcome::Completed);
    let cited: Vec<(usize, &str)> = result
        .citations
        .iter()
        .map(|c| (c.index, c.case_id.as_str()))
        .collect();
    assert_eq!(cited, vec![(1, "case-3"), (2, "case-1"), (3, "case-2")]);

    let prompt = llm.last_prompt().unwrap();
    let first = prompt.find("[1] Case 3 v Respondent").unwrap();
    let second = prompt.find("[2] Case 1 v Respondent").unwrap();
    let third = prompt.find("[3] Case 2 v Respondent").unwrap();
    assert!(first < second && second < third);
    assert!(!prompt.contains("[4]"));
}

#[tokio::test]
async fn only_referenced_citations_are_returned() {
    let llm = FakeLlm::answering("primary", "Final Answer:\nThe contract was void [2].");
    let harness = HarnessBuilder::new().smith_v_jones().llm(llm).build();

    let result = harness.pipeline.handle_query("Is the contract void?", "u").await;

    assert_eq!(result.citations.len(), 1);
    assert_eq!(result.citations[0].index, 2);
    assert_eq!(result.citations[0].case_id, "case-1");
    assert_eq!(result.final_answer, "The contract was void [2].");
    assert_eq!(result.provider_used.as_deref(), Some("primary/fake-model"));
}

#[tokio::test]
async fn empty_retrieval_answers_no_relevant_cases() {
    let llm = FakeLlm::answering("primary", "unused");
    let harness = HarnessBuilder::new().llm(llm.clone()).build();

    let result = harness.pipeline.handle_query("Who owns the river bed?", "u").await;

    assert_eq!(result.outcome, Outcome::NoRelevantSources);
    assert_eq!(result.final_answer, "No relevant cases found.");
    assert!(result.citations.is_empty());
    assert!(result.error.is_none());
    assert_eq!(llm.calls(), 0);
    assert_eq!(harness.history.records.lock().len(), 1);
}

#[tokio::test]
async fn blank_query_is_rejected_without_network_calls() {
    let llm = FakeLlm::answering("primary", "unused");
    let harness = HarnessBuilder::new().smith_v_jones().llm(llm.clone()).build();

    let result = harness.pipeline.handle_query("   \n ", "u").await;

    assert_eq!(result.outcome, Outcome::Rejected);
    assert!(result.error.is_some());
    assert_eq!(harness.network_calls(), 0);
    assert_eq!(llm.calls(), 0);
    assert!(harness.history.records.lock().is_empty());
}

#[tokio::test]
async fn handle_query_is_deterministic() {
    let harness = HarnessBuilder::new()
        .smith_v_jones()
        .llm(FakeLlm::answering("primary", SMITH_ANSWER))
        .build();

    let first = harness.pipeline.handle_query("Summarize Smith v. Jones", "u").await;
    let second = harness.pipeline.handle_query("Summarize Smith v. Jones", "u").await;

    assert_eq!(first.final_answer, second.final_answer);
    assert_eq!(first.citations, second.citations);
    assert_eq!(first.provider_used, second.provider_used);
    assert_eq!(first.attempts, second.attempts);
}

#[tokio::test]
async fn transient_primary_fails_over_to_secondary() {
    let primary = FakeLlm::new("primary", Script::Transient);
    let secondary = FakeLlm::answering("secondary", "Final Answer:\nVoid [1].");
    let harness = HarnessBuilder::new()
        .smith_v_jones()
        .llm(primary.clone())
        .llm(secondary.clone())
        .build();

    let result = harness.pipeline.handle_query("Summarize Smith v. Jones", "u").await;

    assert_eq!(result.outcome, Outcome::Completed);
    assert_eq!(result.provider_used.as_deref(), Some("secondary/fake-model"));
    assert!(primary.calls() <= 3);
    assert_eq!(primary.calls(), 3);
    assert_eq!(secondary.calls(), 1);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn permanent_failure_is_not_retried() {
    let primary = FakeLlm::new("primary", Script::Permanent);
    let secondary = FakeLlm::answering("secondary", "Final Answer:\nVoid [1].");
    let harness = HarnessBuilder::new()
        .smith_v_jones()
        .llm(primary.clone())
        .llm(secondary)
        .build();

    let result = harness.pipeline.handle_query("q", "u").await;

    assert_eq!(primary.calls(), 1);
    assert!(matches!(result.attempts[0].outcome, AttemptOutcome::Permanent(_)));
    assert_eq!(result.outcome, Outcome::Completed);
}

#[tokio::test]
async fn exhausted_providers_fail_with_message() {
    let harness = HarnessBuilder::new()
        .smith_v_jones()
        .llm(FakeLlm::new("primary", Script::Transient))
        .llm(FakeLlm::new("secondary", Script::Permanent))
        .build();

    let result = harness.pipeline.handle_query("q", "u").await;

    assert_eq!(result.outcome, Outcome::Failed);
    assert!(result.final_answer.is_empty());
    assert!(!result.error.as_deref().unwrap_or_default().is_empty());
    assert_eq!(result.attempts.len(), 4);
    assert!(harness.history.records.lock().is_empty());
}

#[tokio::test]
async fn embedding_failure_hides_upstream_detail() {
    let mut builder = HarnessBuilder::new().smith_v_jones().llm(FakeLlm::answering("p", "x"));
    builder.embed_fails = true;
    let harness = builder.build();

    let result = harness.pipeline.handle_query("q", "u").await;

    assert_eq!(result.outcome, Outcome::Failed);
    let error = result.error.unwrap();
    assert_eq!(error, "Service unavailable, please retry later.");
    assert!(!error.contains("voyage"));
    assert_eq!(harness.index.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rerank_failure_fails_closed() {
    let mut builder = HarnessBuilder::new().smith_v_jones().llm(FakeLlm::answering("p", "x"));
    builder.rerank_fails = true;
    let harness = builder.build();

    let result = harness.pipeline.handle_query("q", "u").await;

    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.error.as_deref(), Some("Service unavailable, please retry later."));
}

#[tokio::test]
async fn rerank_failure_can_degrade_to_retrieval_order() {
    let llm = FakeLlm::answering("p", "Final Answer:\nSee [1] and [3].");
    let harness = retrieval_order(HarnessBuilder::new().smith_v_jones().llm(llm)).build();

    let result = harness.pipeline.handle_query("q", "u").await;

    assert_eq!(result.outcome, Outcome::Completed);
    let ids: Vec<&str> = result.citations.iter().map(|c| c.case_id.as_str()).collect();
    assert_eq!(ids, vec!["case-1", "case-3"]);
}

#[tokio::test]
async fn request_deadline_yields_timeout_error() {
    let mut builder = HarnessBuilder::new()
        .smith_v_jones()
        .llm(FakeLlm::new("slow", Script::Hang));
    builder.config.pipeline.request_timeout_secs = 1;
    let harness = builder.build();

    let started = std::time::Instant::now();
    let result = harness.pipeline.handle_query("q", "u").await;

    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.error.as_deref(), Some("The request timed out, please retry."));
    assert!(started.elapsed() < std::time::Duration::from_secs(3));
}

#[tokio::test]
async fn backoff_longer_than_deadline_fails_over_instead_of_timing_out() {
    let mut builder = HarnessBuilder::new()
        .smith_v_jones()
        .llm(FakeLlm::new("primary", Script::Transient))
        .llm(FakeLlm::answering("secondary", "Final Answer:\nThe lease is void [1]."));
    builder.config.generation.retry.base_delay_ms = 2000;
    builder.config.generation.retry.max_delay_ms = 2000;
    builder.config.pipeline.request_timeout_secs = 1;
    let harness = builder.build();

    let result = harness.pipeline.handle_query("q", "u").await;

    assert_eq!(result.outcome, Outcome::Completed);
    assert_eq!(result.provider_used.as_deref(), Some("secondary/fake-model"));
    assert_eq!(result.attempts.len(), 2);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn completed_interaction_is_recorded() {
    let harness = HarnessBuilder::new()
        .smith_v_jones()
        .llm(FakeLlm::answering("p", SMITH_ANSWER))
        .build();

    harness.pipeline.handle_query("Summarize Smith v. Jones", "user-7").await;

    let records = harness.history.records.lock();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].user_id, "user-7");
    assert_eq!(records[0].query, "Summarize Smith v. Jones");
    assert_eq!(records[0].citations.len(), 3);
    assert_eq!(records[0].citations[0], "Case 3 v Respondent [2020] eKLR");
}
