//! Component dialogs, version fingerprints and version-change policies.

use proptest::prelude::*;
use std::sync::Arc;

use dialog_engine::adapters::storage::InMemoryStateStorage;
use dialog_engine::adapters::testing::{TestAdapter, TestFlowError};
use dialog_engine::application::DialogManager;
use dialog_engine::domain::dialogs::{
    ComponentDialog, DialogSet, StepAction, VersionChangePolicy, WaterfallDialog,
};
use dialog_engine::domain::foundation::{ConversationId, DialogError};
use dialog_engine::domain::prompts::{PromptOptions, TextPrompt};
use dialog_engine::ports::StateStorage;

fn ask_name() -> WaterfallDialog {
    WaterfallDialog::new("ask")
        .step(|_| Ok(StepAction::prompt("name", PromptOptions::new("Name?"))))
        .step(|step| Ok(StepAction::EndDialog(step.result().cloned())))
}

fn profile(extra_child: bool) -> ComponentDialog {
    let mut component = ComponentDialog::new("profile");
    component.add_dialog(ask_name()).unwrap();
    component.add_dialog(TextPrompt::new("name")).unwrap();
    if extra_child {
        component.add_dialog(TextPrompt::new("nickname")).unwrap();
    }
    component
}

fn main_dialog() -> WaterfallDialog {
    WaterfallDialog::new("main")
        .step(|_| Ok(StepAction::begin("profile", None)))
        .step(|step| {
            let name = step.result_str().unwrap_or("nobody").to_string();
            step.send(format!("profile done: {}", name));
            Ok(StepAction::EndDialog(None))
        })
}

fn component_manager(storage: Arc<InMemoryStateStorage>, extra_child: bool) -> DialogManager {
    let mut manager = DialogManager::new(storage, main_dialog()).unwrap();
    manager.add_dialog(profile(extra_child)).unwrap();
    manager
}

#[tokio::test]
async fn component_runs_its_inner_stack_and_returns_the_result() {
    let storage = Arc::new(InMemoryStateStorage::new());
    let manager = component_manager(Arc::clone(&storage), false);
    let conversation_id = ConversationId::new("component-1").unwrap();

    let adapter = TestAdapter::new(Arc::new(manager)).with_conversation(conversation_id.clone());
    adapter
        .clone()
        .send("hi")
        .assert_reply("Name?")
        .run()
        .await
        .unwrap();

    // From the outside the component is a single frame.
    let saved = storage.load_state(&conversation_id).await.unwrap();
    let ids: Vec<_> = saved.dialog_stack.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["main", "profile"]);

    adapter
        .send("Grace")
        .assert_reply("profile done: Grace")
        .run()
        .await
        .unwrap();
}

#[test]
fn adding_a_child_changes_the_component_version() {
    let before = profile(false);
    let after = profile(true);

    assert_ne!(before.internal_version(), after.internal_version());
    assert_eq!(before.internal_version(), profile(false).internal_version());
}

#[test]
fn dialog_set_requires_a_state_accessor() {
    let err = DialogSet::new(None).unwrap_err();
    assert!(matches!(err, DialogError::InvalidArgument { argument: "dialog_state", .. }));
}

#[test]
fn dialog_set_rejects_duplicate_ids() {
    let mut set = DialogSet::detached();
    set.add(TextPrompt::new("name")).unwrap();
    let err = set.add(TextPrompt::new("name")).unwrap_err();
    assert!(matches!(err, DialogError::DuplicateId(ref id) if id == "name"));
}

async fn start_then_change(policy: VersionChangePolicy) -> (TestAdapter, Arc<InMemoryStateStorage>) {
    let storage = Arc::new(InMemoryStateStorage::new());
    let conversation_id = ConversationId::generate();

    let v1 = component_manager(Arc::clone(&storage), false);
    TestAdapter::new(Arc::new(v1))
        .with_conversation(conversation_id.clone())
        .send("hi")
        .assert_reply("Name?")
        .run()
        .await
        .unwrap();

    let v2 = component_manager(Arc::clone(&storage), true).with_version_policy(policy);
    let adapter = TestAdapter::new(Arc::new(v2)).with_conversation(conversation_id);
    (adapter, storage)
}

#[tokio::test]
async fn warn_policy_keeps_running_a_changed_dialog() {
    let (adapter, _) = start_then_change(VersionChangePolicy::Warn).await;

    adapter
        .send("Grace")
        .assert_reply("profile done: Grace")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn restart_policy_starts_over() {
    let (adapter, _) = start_then_change(VersionChangePolicy::Restart).await;

    adapter
        .send("Grace")
        .assert_reply("Name?")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn fail_policy_refuses_to_continue() {
    let (adapter, storage) = start_then_change(VersionChangePolicy::Fail).await;
    let conversation_id = adapter.conversation_id().clone();

    let err = adapter.send("Grace").run().await.unwrap_err();
    assert!(matches!(
        err,
        TestFlowError::Turn {
            source: DialogError::VersionChanged { ref dialog_id },
            ..
        } if dialog_id == "profile"
    ));

    // The stack is left as it was.
    let saved = storage.load_state(&conversation_id).await.unwrap();
    assert_eq!(saved.depth(), 2);
}

#[tokio::test]
async fn unchanged_waterfall_versions_are_stable_across_restarts() {
    let storage = Arc::new(InMemoryStateStorage::new());
    let conversation_id = ConversationId::generate();

    let first = component_manager(Arc::clone(&storage), false)
        .with_version_policy(VersionChangePolicy::Fail);
    TestAdapter::new(Arc::new(first))
        .with_conversation(conversation_id.clone())
        .send("hi")
        .assert_reply("Name?")
        .run()
        .await
        .unwrap();

    let second = component_manager(Arc::clone(&storage), false)
        .with_version_policy(VersionChangePolicy::Fail);
    TestAdapter::new(Arc::new(second))
        .with_conversation(conversation_id)
        .send("Ada")
        .assert_reply("profile done: Ada")
        .run()
        .await
        .unwrap();
}

fn build(children: &[String], properties: &[(String, String)], split: usize) -> ComponentDialog {
    let mut component = ComponentDialog::new("c");
    let split = split.min(properties.len());
    for (key, value) in &properties[..split] {
        component.set_property(key.clone(), value.clone());
    }
    for child in children {
        component
            .add_dialog(WaterfallDialog::new(child.clone()).step(|_| Ok(StepAction::EndOfTurn)))
            .unwrap();
    }
    for (key, value) in &properties[split..] {
        component.set_property(key.clone(), value.clone());
    }
    component
}

fn version_of(component: &ComponentDialog) -> String {
    component.internal_version().into_string()
}

proptest! {
    #[test]
    fn property_order_and_interleaving_do_not_change_the_version(
        children in prop::collection::btree_set("[a-z]{1,8}", 1..6),
        properties in prop::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{0,6}", 0..5),
        split in 0usize..6,
    ) {
        let children: Vec<String> = children.into_iter().collect();
        let forward: Vec<(String, String)> = properties.into_iter().collect();
        let mut backward = forward.clone();
        backward.reverse();

        let a = build(&children, &forward, 0);
        let b = build(&children, &backward, backward.len());
        let c = build(&children, &forward, split);

        prop_assert_eq!(version_of(&a), version_of(&b));
        prop_assert_eq!(version_of(&a), version_of(&c));
        prop_assert_eq!(version_of(&a), version_of(&a));
    }

    #[test]
    fn adding_any_new_child_changes_the_version(
        children in prop::collection::btree_set("[a-z]{1,8}", 1..6),
        extra in "[A-Z]{1,8}",
    ) {
        let children: Vec<String> = children.into_iter().collect();
        let base = build(&children, &[], 0);

        let mut grown = build(&children, &[], 0);
        grown
            .add_dialog(WaterfallDialog::new(extra).step(|_| Ok(StepAction::EndOfTurn)))
            .unwrap();

        prop_assert_ne!(version_of(&base), version_of(&grown));
    }

    #[test]
    fn changing_a_property_value_changes_the_version(
        key in "[a-z]{1,6}",
        value in "[a-z]{1,6}",
    ) {
        let children = vec!["child".to_string()];
        let original = build(&children, &[(key.clone(), value.clone())], 0);
        let changed = build(&children, &[(key, format!("{}x", value))], 0);

        prop_assert_ne!(version_of(&original), version_of(&changed));
    }
}

#[test]
fn component_version_feeds_the_dialog_version() {
    let a: dialog_engine::domain::dialogs::Dialog = profile(false).into();
    let b: dialog_engine::domain::dialogs::Dialog = profile(true).into();
    assert_ne!(a.version(), b.version());
}

fn asks_with(prompt_id: &'static str) -> WaterfallDialog {
    WaterfallDialog::new("main")
        .step(move |_| Ok(StepAction::prompt(prompt_id, PromptOptions::new("Name?"))))
        .step(|step| {
            let name = step.result_str().unwrap_or_default().to_string();
            step.send(format!("Hi {}", name));
            Ok(StepAction::EndDialog(None))
        })
}

async fn start_then_rename(policy: VersionChangePolicy) -> TestAdapter {
    let storage = Arc::new(InMemoryStateStorage::new());
    let conversation_id = ConversationId::generate();

    let mut v1 = DialogManager::new(storage.clone(), asks_with("name")).unwrap();
    v1.add_dialog(TextPrompt::new("name")).unwrap();
    TestAdapter::new(Arc::new(v1))
        .with_conversation(conversation_id.clone())
        .send("hi")
        .assert_reply("Name?")
        .run()
        .await
        .unwrap();

    let mut v2 = DialogManager::new(storage, asks_with("fullname")).unwrap();
    v2.add_dialog(TextPrompt::new("fullname")).unwrap();
    TestAdapter::new(Arc::new(v2.with_version_policy(policy))).with_conversation(conversation_id)
}

#[tokio::test]
async fn restart_policy_recovers_from_a_removed_dialog() {
    start_then_rename(VersionChangePolicy::Restart)
        .await
        .send("Grace")
        .assert_reply("Name?")
        .send("Grace Hopper")
        .assert_reply("Hi Grace Hopper")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn fail_policy_reports_a_removed_dialog() {
    let err = start_then_rename(VersionChangePolicy::Fail)
        .await
        .send("Grace")
        .run()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TestFlowError::Turn {
            source: DialogError::VersionChanged { ref dialog_id },
            ..
        } if dialog_id == "name"
    ));
}

#[tokio::test]
async fn component_children_can_begin_dialogs_from_the_enclosing_set() {
    let mut component = ComponentDialog::new("profile");
    component
        .add_dialog(
            WaterfallDialog::new("ask")
                .step(|_| Ok(StepAction::prompt("shared", PromptOptions::new("Shared name?"))))
                .step(|step| Ok(StepAction::EndDialog(step.result().cloned()))),
        )
        .unwrap();

    let mut manager = DialogManager::new(Arc::new(InMemoryStateStorage::new()), main_dialog()).unwrap();
    manager.add_dialog(component).unwrap();
    manager.add_dialog(TextPrompt::new("shared")).unwrap();

    TestAdapter::new(Arc::new(manager))
        .send("hi")
        .assert_reply("Shared name?")
        .send("Linus")
        .assert_reply("profile done: Linus")
        .run()
        .await
        .unwrap();
}
