mod common;

use std::sync::Arc;

use common::{Answer, ScriptedPrompter, build_alice, connect, open_runtime, sent_contents};
use didi_application::identity::verify_base64;
use didi_application::session::Inquirer;
use didi_application::{Alice, DispatchOutcome, Dispatcher, DispatcherCapabilities, ListeningGate};
use didi_core::identity::IdentityRecord;
use didi_core::message::DidChallengeResponse;
use didi_core::prompt::Prompter;
use tempfile::TempDir;

const BALLOT: &str = r#"{"voteMessage": {
    "roomNum": 7,
    "roomName": "Student council",
    "candidateInfo": [
        {"id": 11, "num": 1, "name": "Kim", "gender": "F", "age": 21, "img": "kim.png", "desc": "",
         "createdAt": "2023-05-01T09:00:00Z", "updatedAt": "2023-05-01T09:00:00Z", "RoomId": 7},
        {"id": 12, "num": 2, "name": "Lee", "gender": "M", "age": 22, "img": "lee.png", "desc": null,
         "createdAt": null, "updatedAt": null, "RoomId": 7},
        {"id": 13, "num": 3, "name": "Park", "img": "park.png", "RoomId": 7}
    ]
}}"#;

fn dispatcher(
    alice: &Arc<Alice>,
    prompter: Arc<ScriptedPrompter>,
    gate: &ListeningGate,
    capabilities: DispatcherCapabilities,
) -> Dispatcher {
    let prompter: Arc<dyn Prompter> = prompter;
    let inquirer = Inquirer::new(prompter, alice.clone());
    Dispatcher::new(alice.clone(), inquirer, gate.clone(), capabilities)
}

#[tokio::test]
async fn test_did_challenge_reply_verifies() {
    let temp_dir = TempDir::new().unwrap();
    let runtime = open_runtime(&temp_dir).await;
    let alice = build_alice(&runtime).await;
    connect(&alice).await;
    let gate = ListeningGate::new();
    let dispatcher = dispatcher(&alice, ScriptedPrompter::new([]), &gate, DispatcherCapabilities::default());

    let outcome = dispatcher.dispatch(r#"{"DIDMessage": [1, 2, 3]}"#).await;
    assert_eq!(outcome, DispatchOutcome::ChallengeAnswered);

    let sent = runtime.sent_messages().await;
    assert_eq!(sent.len(), 1);
    let reply: DidChallengeResponse = serde_json::from_str(&sent[0].content).unwrap();
    assert_eq!(reply.did, alice.did());

    let identity = alice.key_store().load_identity().await.unwrap();
    verify_base64(&identity.public_key, &[1, 2, 3], &reply.signature).unwrap();
    assert!(verify_base64(&identity.public_key, &[3, 2, 1], &reply.signature).is_err());
}

#[tokio::test]
async fn test_corrupted_private_key_sends_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let runtime = open_runtime(&temp_dir).await;
    let alice = build_alice(&runtime).await;
    connect(&alice).await;
    let gate = ListeningGate::new();
    let dispatcher = dispatcher(&alice, ScriptedPrompter::new([]), &gate, DispatcherCapabilities::default());

    let mut identity = alice.key_store().load_identity().await.unwrap();
    for corrupted in ["", "not-base64!!", "AQID"] {
        identity.private_key = corrupted.to_string();
        alice.key_store().put_identity(&identity).await.unwrap();

        let outcome = dispatcher.dispatch(r#"{"DIDMessage": [1, 2, 3]}"#).await;
        assert!(matches!(outcome, DispatchOutcome::Failed(_)), "{corrupted:?}: {outcome:?}");
    }
    assert!(runtime.sent_messages().await.is_empty());
}

#[tokio::test]
async fn test_missing_identity_record_sends_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let runtime = open_runtime(&temp_dir).await;
    let alice = build_alice(&runtime).await;
    connect(&alice).await;
    alice.key_store().delete("key").await.unwrap();
    let gate = ListeningGate::new();
    let dispatcher = dispatcher(&alice, ScriptedPrompter::new([]), &gate, DispatcherCapabilities::default());

    let outcome = dispatcher.dispatch(r#"{"DIDMessage": [9]}"#).await;
    assert!(matches!(outcome, DispatchOutcome::Failed(_)));
    assert!(runtime.sent_messages().await.is_empty());
}

#[tokio::test]
async fn test_challenge_without_connection_fails_quietly() {
    let temp_dir = TempDir::new().unwrap();
    let runtime = open_runtime(&temp_dir).await;
    let alice = build_alice(&runtime).await;
    let gate = ListeningGate::new();
    let dispatcher = dispatcher(&alice, ScriptedPrompter::new([]), &gate, DispatcherCapabilities::default());

    let outcome = dispatcher.dispatch(r#"{"DIDMessage": [1]}"#).await;
    assert!(matches!(outcome, DispatchOutcome::Failed(_)));
}

#[tokio::test]
async fn test_vote_ballot_renders_candidates_and_sends_input() {
    let temp_dir = TempDir::new().unwrap();
    let runtime = open_runtime(&temp_dir).await;
    let alice = build_alice(&runtime).await;
    connect(&alice).await;
    let gate = ListeningGate::new();
    let prompter = ScriptedPrompter::new([Answer::Input("3")]);
    let dispatcher = dispatcher(&alice, prompter.clone(), &gate, DispatcherCapabilities::default());

    let outcome = dispatcher.dispatch(BALLOT).await;
    assert_eq!(outcome, DispatchOutcome::BallotAnswered);
    assert!(!gate.is_listening());

    let lines = prompter.lines();
    assert_eq!(
        lines,
        vec![
            "[Room 7] Student council".to_string(),
            "kim.png  1. Kim".to_string(),
            "lee.png  2. Lee".to_string(),
            "park.png  3. Park".to_string(),
        ]
    );
    assert_eq!(sent_contents(&runtime.sent_messages().await), vec!["3".to_string()]);
}

#[tokio::test]
async fn test_vote_reply_is_forwarded_unvalidated() {
    let temp_dir = TempDir::new().unwrap();
    let runtime = open_runtime(&temp_dir).await;
    let alice = build_alice(&runtime).await;
    connect(&alice).await;
    let gate = ListeningGate::new();
    let prompter = ScriptedPrompter::new([Answer::Input(" candidate two \r\n")]);
    let dispatcher = dispatcher(&alice, prompter, &gate, DispatcherCapabilities::default());

    assert_eq!(dispatcher.dispatch(BALLOT).await, DispatchOutcome::BallotAnswered);
    assert_eq!(
        sent_contents(&runtime.sent_messages().await),
        vec![" candidate two ".to_string()]
    );
}

#[tokio::test]
async fn test_ballot_prompt_failure_lowers_flag() {
    let temp_dir = TempDir::new().unwrap();
    let runtime = open_runtime(&temp_dir).await;
    let alice = build_alice(&runtime).await;
    connect(&alice).await;
    let gate = ListeningGate::new();
    let dispatcher = dispatcher(&alice, ScriptedPrompter::new([]), &gate, DispatcherCapabilities::default());

    assert!(matches!(dispatcher.dispatch(BALLOT).await, DispatchOutcome::Failed(_)));
    assert!(!gate.is_listening());
    assert!(runtime.sent_messages().await.is_empty());
}

#[tokio::test]
async fn test_unrecognized_messages_are_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let runtime = open_runtime(&temp_dir).await;
    let alice = build_alice(&runtime).await;
    connect(&alice).await;
    let gate = ListeningGate::new();
    let prompter = ScriptedPrompter::new([]);
    let dispatcher = dispatcher(&alice, prompter.clone(), &gate, DispatcherCapabilities::default());

    for body in [
        "hello there",
        "",
        "{",
        "[1, 2, 3]",
        r#"{"other": 1}"#,
        r#"{"DIDMessage": "not bytes"}"#,
        r#"{"DIDMessage": [1, 2, 300]}"#,
        r#"{"voteMessage": "vote now"}"#,
    ] {
        assert_eq!(dispatcher.dispatch(body).await, DispatchOutcome::Ignored, "{body:?}");
    }
    assert!(runtime.sent_messages().await.is_empty());
    assert!(prompter.displayed().is_empty());
}

#[tokio::test]
async fn test_disabled_capabilities_ignore_messages() {
    let temp_dir = TempDir::new().unwrap();
    let runtime = open_runtime(&temp_dir).await;
    let alice = build_alice(&runtime).await;
    connect(&alice).await;
    let gate = ListeningGate::new();
    let capabilities = DispatcherCapabilities {
        did_auth: false,
        voting: false,
    };
    let dispatcher = dispatcher(&alice, ScriptedPrompter::new([]), &gate, capabilities);

    assert_eq!(dispatcher.dispatch(r#"{"DIDMessage": [1]}"#).await, DispatchOutcome::Ignored);
    assert_eq!(dispatcher.dispatch(BALLOT).await, DispatchOutcome::Ignored);
    assert!(runtime.sent_messages().await.is_empty());
}

#[tokio::test]
async fn test_stored_identity_signs_with_stored_key() {
    let temp_dir = TempDir::new().unwrap();
    let runtime = open_runtime(&temp_dir).await;
    let alice = build_alice(&runtime).await;
    connect(&alice).await;

    // Re-provision the identity with a known keypair.
    let keypair = didi_application::SigningKeyPair::generate();
    let identity: IdentityRecord = keypair.to_identity_record();
    alice.key_store().put_identity(&identity).await.unwrap();

    let gate = ListeningGate::new();
    let dispatcher = dispatcher(&alice, ScriptedPrompter::new([]), &gate, DispatcherCapabilities::default());
    assert_eq!(
        dispatcher.dispatch(r#"{"DIDMessage": [42]}"#).await,
        DispatchOutcome::ChallengeAnswered
    );

    let sent = runtime.sent_messages().await;
    let reply: DidChallengeResponse = serde_json::from_str(&sent[0].content).unwrap();
    assert_eq!(reply.signature, keypair.sign_base64(&[42]));
}
