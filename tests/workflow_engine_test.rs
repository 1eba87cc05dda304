mod common;

use common::*;
use fallout_core::models::{ActivationStatus, EsimStatus, FalloutStatus, SwitchStatus};
use fallout_core::orchestration::FixedDecision;
use fallout_core::store::AuditStore;
use fallout_core::workflow::{EscalationCause, PausedTraversal};
use fallout_core::{
    FalloutError, NodeTarget, ResolutionStatus, RuleBasedClassifier, TraversalOutcome,
};
use std::sync::Arc;

async fn suspended(engine: &fallout_core::WorkflowEngine, order_id: &str) -> PausedTraversal {
    engine
        .start(order_id)
        .await
        .unwrap()
        .into_paused()
        .expect("traversal should suspend at the escalation gate")
}

#[tokio::test]
async fn test_activation_scenario_resolves_via_resubmission() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    let state = engine
        .start("ORD123")
        .await
        .unwrap()
        .into_completed()
        .unwrap();

    assert_eq!(state.resolution_status(), ResolutionStatus::Resolved);
    assert_eq!(state.next_target, NodeTarget::Completed);
    assert_eq!(
        state.visited(),
        &[NodeTarget::Master, NodeTarget::Resubmission]
    );
    let order = store.get_order("ORD123").await.unwrap();
    assert_eq!(order.activation_status, ActivationStatus::Pending);

    let fallouts = store.list_fallouts("ORD123").await.unwrap();
    assert_eq!(fallouts.len(), 1);
    assert_eq!(fallouts[0].resolution_kind, "activation_resubmission");
    assert_eq!(fallouts[0].status, FalloutStatus::Completed);
}

#[tokio::test]
async fn test_esim_scenario_records_reprovision() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    let outcome = engine.start("ORD456").await.unwrap();
    assert_eq!(outcome.state().resolution_status(), ResolutionStatus::Resolved);

    let fallouts = store.list_fallouts("ORD456").await.unwrap();
    assert_eq!(fallouts.len(), 1);
    assert_eq!(fallouts[0].resolution_kind, "esim_reprovision");
    assert_eq!(fallouts[0].status, FalloutStatus::Completed);
    assert_eq!(
        store.get_order("ORD456").await.unwrap().esim_status,
        EsimStatus::Reprovisioned
    );
}

#[tokio::test]
async fn test_multiple_faults_follow_classifier_priority() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    let state = engine
        .start("ORD555")
        .await
        .unwrap()
        .into_completed()
        .unwrap();
    assert!(state.visited().contains(&NodeTarget::Switch));

    let order = store.get_order("ORD555").await.unwrap();
    assert_eq!(order.switch_status, SwitchStatus::Reconfigured);
    // Only one specialist runs per traversal
    assert_eq!(order.esim_status, EsimStatus::Failed);
}

#[tokio::test]
async fn test_engine_routes_on_label_without_own_priority() {
    let store = seeded_store().await;
    let classifier = ScriptedClassifier::always("human").with_label("ORD555", "esim");
    let engine = engine_with(store.clone(), Arc::new(classifier));

    engine.start("ORD555").await.unwrap();
    let order = store.get_order("ORD555").await.unwrap();
    assert_eq!(order.esim_status, EsimStatus::Reprovisioned);
    assert_eq!(order.switch_status, SwitchStatus::Error);
}

#[tokio::test]
async fn test_nominal_order_classified_human_waits_for_input() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    let paused = suspended(&engine, "ORD999").await;
    assert_eq!(paused.state.resolution_status(), ResolutionStatus::WaitingInput);
    assert_eq!(paused.state.next_target, NodeTarget::HumanResume);
    assert_eq!(paused.state.escalation_cause, Some(EscalationCause::Classified));

    let fallouts = store.list_fallouts("ORD999").await.unwrap();
    assert_eq!(fallouts.len(), 1);
    assert_eq!(fallouts[0].status, FalloutStatus::Escalated);
    assert_eq!(fallouts[0].fallout_id, paused.marker.fallout_id);
    assert!(paused.marker.summary.contains("ORD999"));
}

#[tokio::test]
async fn test_unknown_label_routes_to_human_escalate() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(ScriptedClassifier::always("xyz")));

    let paused = suspended(&engine, "ORD123").await;
    assert!(paused.state.visited().contains(&NodeTarget::HumanEscalate));
    assert!(!paused
        .state
        .visited()
        .iter()
        .any(|node| node.is_specialist()));
    assert_eq!(
        paused.state.escalation_cause,
        Some(EscalationCause::UnrecognizedLabel("xyz".into()))
    );
    // The specialist never touched the order
    assert_eq!(
        store.get_order("ORD123").await.unwrap().activation_status,
        ActivationStatus::NotSent
    );
}

#[tokio::test]
async fn test_resume_approve_resolves() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    let paused = suspended(&engine, "ORD999").await;
    let state = engine.resume(paused, "approve").await.unwrap();

    assert_eq!(state.resolution_status(), ResolutionStatus::Resolved);
    assert_eq!(state.next_target, NodeTarget::Completed);
    assert_eq!(state.actions_taken().last().map(String::as_str), Some("approve"));
}

#[tokio::test]
async fn test_resume_reject_escalates() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    let paused = suspended(&engine, "ORD999").await;
    let state = engine.resume(paused, "REJECT").await.unwrap();
    assert_eq!(state.resolution_status(), ResolutionStatus::Escalated);
    assert!(state.actions_taken().iter().any(|a| a == "REJECT"));
}

#[tokio::test]
async fn test_resume_unrecognized_input_escalates_with_note() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    let paused = suspended(&engine, "ORD999").await;
    let state = engine.resume(paused, "banana").await.unwrap();

    assert_eq!(state.resolution_status(), ResolutionStatus::Escalated);
    assert!(state.actions_taken().iter().any(|a| a == "banana"));
    assert!(state
        .actions_taken()
        .iter()
        .any(|a| a.contains("unrecognized decision input") && a.contains("banana")));
}

#[tokio::test]
async fn test_resume_records_decision_step() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    let paused = suspended(&engine, "ORD999").await;
    let fallout_id = paused.marker.fallout_id;
    engine.resume(paused, "approve").await.unwrap();

    let history = store.get_resolution_history("ORD999").await.unwrap();
    let steps: Vec<_> = history.steps_for(fallout_id).collect();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].action, "escalate_to_human");
    assert_eq!(steps[1].actor, "human_agent");
    assert!(steps[1].result.contains("outcome=resolved"));
}

#[tokio::test]
async fn test_paused_traversal_survives_serialization() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    let json = suspended(&engine, "ORD999").await.to_json().unwrap();
    let restored = PausedTraversal::from_json(&json).unwrap();
    let state = engine.resume(restored, "approve").await.unwrap();
    assert_eq!(state.resolution_status(), ResolutionStatus::Resolved);
}

#[tokio::test]
async fn test_resume_rejects_completed_or_mismatched_traversal() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    let paused = suspended(&engine, "ORD999").await;
    let mut mismatched = paused.clone();
    mismatched.marker.order_id = "ORD123".into();
    let err = engine.resume(mismatched, "approve").await.unwrap_err();
    assert!(matches!(err, FalloutError::InvalidResume(_)));

    let finished = engine.resume(paused.clone(), "approve").await.unwrap();
    let replay = PausedTraversal {
        marker: paused.marker.clone(),
        state: finished,
    };
    let err = engine.resume(replay, "reject").await.unwrap_err();
    assert!(matches!(err, FalloutError::InvalidResume(_)));
}

#[tokio::test]
async fn test_unknown_order_aborts_before_any_write() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    let err = engine.start("ORD000").await.unwrap_err();
    assert_eq!(err, FalloutError::order_not_found("ORD000"));
    assert_eq!(store.fallout_count(), 0);
    assert_eq!(store.step_count(), 0);
}

#[tokio::test]
async fn test_handler_error_becomes_escalation() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()))
        .with_handler(Arc::new(FaultyHandler {
            node: NodeTarget::Esim,
            mode: FaultMode::Error,
        }))
        .unwrap();

    let paused = suspended(&engine, "ORD456").await;
    assert!(matches!(
        &paused.state.escalation_cause,
        Some(EscalationCause::HandlerFault { handler, reason })
            if handler == "faulty_agent" && reason.contains("503")
    ));
    // Work from the faulty handler is discarded with its state
    assert!(!paused
        .state
        .actions_taken()
        .iter()
        .any(|a| a == "faulty handler started"));

    let fallouts = store.list_fallouts("ORD456").await.unwrap();
    assert_eq!(fallouts.len(), 1);
    assert_eq!(fallouts[0].status, FalloutStatus::Escalated);
    assert!(fallouts[0].detail.contains("503"));
}

#[tokio::test]
async fn test_handler_panic_becomes_escalation() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()))
        .with_handler(Arc::new(FaultyHandler {
            node: NodeTarget::Switch,
            mode: FaultMode::Panic,
        }))
        .unwrap();

    let state = engine
        .run_to_completion("ORD789", &FixedDecision::new("reject"))
        .await
        .unwrap();
    assert_eq!(state.resolution_status(), ResolutionStatus::Escalated);
    assert!(state
        .diagnostics
        .latest(NodeTarget::Switch, "fault")
        .and_then(|v| v.as_str())
        .is_some_and(|reason| reason.contains("provisioning client crashed")));
}

#[tokio::test]
async fn test_unfinished_handler_is_a_fault() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()))
        .with_handler(Arc::new(FaultyHandler {
            node: NodeTarget::Resubmission,
            mode: FaultMode::Unfinished,
        }))
        .unwrap();

    let outcome = engine.start("ORD123").await.unwrap();
    assert!(outcome.is_suspended());
}

#[tokio::test]
async fn test_non_specialist_handler_is_rejected() {
    let store = seeded_store().await;
    let result = engine_with(store, Arc::new(RuleBasedClassifier::new())).with_handler(Arc::new(
        FaultyHandler {
            node: NodeTarget::HumanEscalate,
            mode: FaultMode::Error,
        },
    ));
    assert!(matches!(result, Err(FalloutError::Configuration(_))));
}

#[tokio::test]
async fn test_classifier_failure_routes_to_human() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(FailingClassifier));

    let paused = suspended(&engine, "ORD123").await;
    assert!(matches!(
        paused.state.escalation_cause,
        Some(EscalationCause::ClassifierError(_))
    ));
}

#[tokio::test]
async fn test_escalation_detail_is_bounded_and_full_rationale_kept() {
    let store = seeded_store().await;
    let rationale = "r".repeat(900);
    let classifier = ScriptedClassifier::always("human").with_rationale(rationale.clone());
    let engine = engine_with(store.clone(), Arc::new(classifier));

    let paused = suspended(&engine, "ORD999").await;
    let fallouts = store.list_fallouts("ORD999").await.unwrap();
    assert_eq!(fallouts[0].detail.chars().count(), 500);
    assert!(fallouts[0].detail.ends_with("..."));

    let history = store.get_resolution_history("ORD999").await.unwrap();
    let step = history.steps_for(paused.marker.fallout_id).next().unwrap();
    assert!(step.result.contains(&rationale));
}

#[tokio::test]
async fn test_rationale_oracle_failure_still_escalates() {
    let store = seeded_store().await;
    let classifier = ScriptedClassifier::always("human").failing_explain();
    let engine = engine_with(store.clone(), Arc::new(classifier));

    let paused = suspended(&engine, "ORD999").await;
    let fallouts = store.list_fallouts("ORD999").await.unwrap();
    assert_eq!(fallouts.len(), 1);
    assert!(fallouts[0].detail.contains("Rationale unavailable"));
    assert_eq!(paused.state.resolution_status(), ResolutionStatus::WaitingInput);
}

#[tokio::test]
async fn test_rationale_oracle_panic_still_escalates() {
    let store = seeded_store().await;
    let classifier = ScriptedClassifier::always("human").panicking_explain();
    let engine = Arc::new(engine_with(store.clone(), Arc::new(classifier)));

    // Spawned so an escaping panic would surface as a JoinError
    let paused = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.start("ORD999").await }
    })
    .await
    .expect("panic in explain must not escape the engine")
    .unwrap()
    .into_paused()
    .unwrap();

    let fallouts = store.list_fallouts("ORD999").await.unwrap();
    assert_eq!(fallouts.len(), 1);
    assert_eq!(fallouts[0].status, FalloutStatus::Escalated);
    assert!(fallouts[0].detail.contains("Rationale unavailable"));
    assert!(fallouts[0].detail.contains("reasoning service crashed"));

    let state = engine.resume(paused, "approve").await.unwrap();
    assert_eq!(state.resolution_status(), ResolutionStatus::Resolved);
}

#[tokio::test]
async fn test_failed_decision_write_can_be_retried_from_serialized_copy() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    let paused = suspended(&engine, "ORD999").await;
    let saved = paused.to_json().unwrap();

    store.fail_next_write();
    let err = engine.resume(paused, "approve").await.unwrap_err();
    assert!(matches!(err, FalloutError::Persistence(_)));
    assert_eq!(store.step_count(), 1);

    let state = engine
        .resume(PausedTraversal::from_json(&saved).unwrap(), "approve")
        .await
        .unwrap();
    assert_eq!(state.resolution_status(), ResolutionStatus::Resolved);
    assert_eq!(store.step_count(), 2);
}

#[tokio::test]
async fn test_escalation_write_failure_is_surfaced() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    store.fail_next_write();
    let err = engine.start("ORD999").await.unwrap_err();
    assert!(matches!(err, FalloutError::Persistence(_)));
    assert_eq!(store.fallout_count(), 0);
    assert_eq!(store.step_count(), 0);
}

#[tokio::test]
async fn test_run_to_completion_presents_summary_once() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));
    let decisions = ScriptedDecisions::answering("approve");

    let state = engine.run_to_completion("ORD999", &decisions).await.unwrap();
    assert_eq!(state.resolution_status(), ResolutionStatus::Resolved);
    assert_eq!(decisions.calls(), 1);
    let presented = decisions.presented.lock();
    assert_eq!(presented[0].0, "ORD999");
    assert!(presented[0].1.contains("Alice Brown"));
}

#[tokio::test]
async fn test_run_to_completion_skips_decision_for_specialists() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));
    let decisions = ScriptedDecisions::answering("approve");

    let state = engine.run_to_completion("ORD789", &decisions).await.unwrap();
    assert_eq!(state.resolution_status(), ResolutionStatus::Resolved);
    assert_eq!(decisions.calls(), 0);
}

#[tokio::test]
async fn test_failing_decision_source_leaves_order_escalated() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    let state = engine
        .run_to_completion("ORD999", &ScriptedDecisions::failing())
        .await
        .unwrap();
    assert_eq!(state.resolution_status(), ResolutionStatus::Escalated);
}

#[tokio::test]
async fn test_every_completed_traversal_is_terminal() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    for (order_id, ..) in SCENARIO_ORDERS {
        let state = engine
            .run_to_completion(order_id, &FixedDecision::new("approve"))
            .await
            .unwrap();
        assert!(
            state.resolution_status().is_terminal(),
            "{order_id} ended in {}",
            state.resolution_status()
        );
        assert_eq!(state.next_target, NodeTarget::Completed);
    }
}

#[tokio::test]
async fn test_audit_completeness_after_all_scenarios() {
    let store = seeded_store().await;
    let engine = engine_with(store.clone(), Arc::new(RuleBasedClassifier::new()));

    for (order_id, ..) in SCENARIO_ORDERS {
        let _ = engine
            .run_to_completion(order_id, &FixedDecision::new("reject"))
            .await
            .unwrap();
        let history = store.get_resolution_history(order_id).await.unwrap();
        for fallout in store.list_fallouts(order_id).await.unwrap() {
            assert!(
                history.steps_for(fallout.fallout_id).count() >= 1,
                "fallout {} of {order_id} has no steps",
                fallout.fallout_id
            );
        }
    }
}

#[tokio::test]
async fn test_second_traversal_after_remediation_takes_no_action() {
    let store = seeded_store().await;
    // Scripted so the second run still lands on the resubmission specialist
    let engine = engine_with(
        store.clone(),
        Arc::new(ScriptedClassifier::always("resubmission")),
    );

    engine.start("ORD123").await.unwrap();
    let second = engine.start("ORD123").await.unwrap();

    assert!(matches!(second, TraversalOutcome::Completed(_)));
    assert_eq!(store.list_fallouts("ORD123").await.unwrap().len(), 1);
    assert!(second.state().actions_taken()[1].starts_with("No action needed"));
}
