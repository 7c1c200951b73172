//! Multi-turn waterfall conversations driven through the DialogManager.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use dialog_engine::adapters::storage::InMemoryStateStorage;
use dialog_engine::adapters::testing::{TestAdapter, TestTurnContext};
use dialog_engine::application::DialogManager;
use dialog_engine::domain::dialogs::{
    DialogContext, DialogSet, DialogState, DialogStateAccessor, DialogTurnStatus, StepAction,
    WaterfallDialog,
};
use dialog_engine::domain::foundation::DialogError;
use dialog_engine::ports::{TurnContext, TurnHandler};

fn storage() -> Arc<InMemoryStateStorage> {
    Arc::new(InMemoryStateStorage::new())
}

fn three_steps() -> WaterfallDialog {
    WaterfallDialog::new("test")
        .step(|step| {
            step.send("step1");
            Ok(StepAction::EndOfTurn)
        })
        .step(|step| {
            step.send("step2");
            Ok(StepAction::EndOfTurn)
        })
        .step(|step| {
            step.send("step3");
            Ok(StepAction::EndOfTurn)
        })
}

#[tokio::test]
async fn three_step_waterfall_sends_one_message_per_turn() {
    let manager = DialogManager::new(storage(), three_steps()).unwrap();

    TestAdapter::new(Arc::new(manager))
        .send("hello")
        .assert_reply("step1")
        .send("hello")
        .assert_reply("step2")
        .send("hello")
        .assert_reply("step3")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn finished_waterfall_restarts_on_the_next_turn() {
    let manager = DialogManager::new(storage(), three_steps()).unwrap();

    // The fourth turn runs past the last step and ends the waterfall
    // without a reply; the fifth starts it again.
    TestAdapter::new(Arc::new(manager))
        .send("a")
        .assert_reply("step1")
        .send("b")
        .assert_reply("step2")
        .send("c")
        .assert_reply("step3")
        .send("d")
        .assert_no_reply()
        .send("e")
        .assert_reply("step1")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn nested_waterfalls_hand_results_to_the_parent() {
    let outer = WaterfallDialog::new("outer")
        .step(|_| Ok(StepAction::begin("inner", Some(json!({"greeting": "hi"})))))
        .step(|step| {
            let from_inner = step.result_str().unwrap_or("nothing").to_string();
            step.send(format!("outer got {}", from_inner));
            Ok(StepAction::EndDialog(None))
        });
    let inner = WaterfallDialog::new("inner")
        .step(|step| {
            let greeting = step
                .options()
                .and_then(|o| o.get("greeting"))
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string();
            step.send(format!("inner says {}", greeting));
            Ok(StepAction::EndOfTurn)
        })
        .step(|step| {
            let reply = step.activity().text_or_empty().to_string();
            Ok(StepAction::end(format!("'{}'", reply)))
        });

    let mut manager = DialogManager::new(storage(), outer).unwrap();
    manager.add_dialog(inner).unwrap();

    TestAdapter::new(Arc::new(manager))
        .send("start")
        .assert_reply("inner says hi")
        .send("pizza")
        .assert_reply("outer got 'pizza'")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn values_survive_between_turns() {
    let survey = WaterfallDialog::new("survey")
        .step(|step| {
            step.send("first?");
            Ok(StepAction::EndOfTurn)
        })
        .step(|step| {
            let first = step.activity().text_or_empty().to_string();
            step.values_mut().insert("first".to_string(), json!(first));
            step.send("second?");
            Ok(StepAction::EndOfTurn)
        })
        .step(|step| {
            let first = step
                .values()
                .get("first")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let second = step.activity().text_or_empty().to_string();
            step.send(format!("{} then {}", first, second));
            Ok(StepAction::EndDialog(None))
        });

    let manager = DialogManager::new(storage(), survey).unwrap();
    TestAdapter::new(Arc::new(manager))
        .send("go")
        .assert_reply("first?")
        .send("tea")
        .assert_reply("second?")
        .send("cake")
        .assert_reply("tea then cake")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn repeat_step_loops_until_satisfied() {
    let looping = WaterfallDialog::new("loop")
        .step(|step| {
            if step.activity().text_or_empty() == "done" {
                return Ok(StepAction::next("ok"));
            }
            step.send("say done");
            Ok(StepAction::RepeatStep)
        })
        .step(|step| {
            step.send("finally");
            Ok(StepAction::EndDialog(None))
        });

    let manager = DialogManager::new(storage(), looping).unwrap();
    TestAdapter::new(Arc::new(manager))
        .send("hi")
        .assert_reply("say done")
        .send("nope")
        .assert_reply("say done")
        .send("done")
        .assert_reply("finally")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn replace_dialog_swaps_the_active_waterfall() {
    let first = WaterfallDialog::new("first")
        .step(|step| {
            step.send("in first");
            Ok(StepAction::replace("second", None))
        });
    let second = WaterfallDialog::new("second")
        .step(|step| {
            step.send("in second");
            Ok(StepAction::EndOfTurn)
        })
        .step(|step| {
            step.send("second done");
            Ok(StepAction::EndDialog(None))
        });

    let mut manager = DialogManager::new(storage(), first).unwrap();
    manager.add_dialog(second).unwrap();

    TestAdapter::new(Arc::new(manager))
        .send("go")
        .assert_reply("in first")
        .assert_reply("in second")
        .send("next")
        .assert_reply("second done")
        .run()
        .await
        .unwrap();
}

/// Cancels the whole stack when the user says "cancel".
struct CancellableBot {
    dialogs: DialogSet,
}

#[async_trait]
impl TurnHandler for CancellableBot {
    async fn on_turn(&self, turn: Arc<dyn TurnContext>) -> Result<(), DialogError> {
        let mut lease = self.dialogs.load_state(turn.as_ref()).await?;
        {
            let mut dc = DialogContext::new(&self.dialogs, Some(Arc::clone(&turn)), lease.state_mut())?;
            if turn.activity().text_or_empty() == "cancel" {
                let result = dc.cancel_all_dialogs().await?;
                if result.status == DialogTurnStatus::Cancelled {
                    turn.send_text("Cancelled.").await?;
                }
            } else {
                let result = dc.continue_dialog().await?;
                if result.status == DialogTurnStatus::Empty {
                    dc.begin_dialog("test", None).await?;
                }
            }
        }
        lease.persist().await
    }
}

#[tokio::test]
async fn cancel_all_dialogs_clears_the_stack() {
    let accessor = Arc::new(DialogStateAccessor::new(storage()));
    let mut dialogs = DialogSet::new(Some(accessor)).unwrap();
    dialogs.add(three_steps()).unwrap();

    TestAdapter::new(Arc::new(CancellableBot { dialogs }))
        .send("hi")
        .assert_reply("step1")
        .send("hi")
        .assert_reply("step2")
        .send("cancel")
        .assert_reply("Cancelled.")
        .send("hi")
        .assert_reply("step1")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn cancel_with_nothing_active_is_empty() {
    let mut dialogs = DialogSet::detached();
    dialogs.add(three_steps()).unwrap();
    let mut state = DialogState::new();

    let turn: Arc<dyn TurnContext> = Arc::new(TestTurnContext::message("cancel"));
    let mut dc = DialogContext::new(&dialogs, Some(turn), &mut state).unwrap();
    let result = dc.cancel_all_dialogs().await.unwrap();

    assert_eq!(result.status, DialogTurnStatus::Empty);
}

#[tokio::test]
async fn unknown_dialog_ids_are_reported() {
    let mut dialogs = DialogSet::detached();
    dialogs.add(three_steps()).unwrap();
    let mut state = DialogState::new();

    let turn: Arc<dyn TurnContext> = Arc::new(TestTurnContext::message("hi"));
    let mut dc = DialogContext::new(&dialogs, Some(turn), &mut state).unwrap();

    let err = dc.begin_dialog("nope", None).await.unwrap_err();
    assert!(matches!(err, DialogError::DialogNotFound(ref id) if id == "nope"));

    let err = dc.begin_dialog("", None).await.unwrap_err();
    assert!(matches!(err, DialogError::InvalidArgument { .. }));
    assert!(state.is_empty());
}
