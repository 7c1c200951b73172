//! Prompts asked from waterfalls, end to end through the DialogManager.

use serde_json::{json, Value};
use std::sync::Arc;

use dialog_engine::adapters::storage::InMemoryStateStorage;
use dialog_engine::adapters::testing::{TestAdapter, TestFlowError};
use dialog_engine::application::DialogManager;
use dialog_engine::domain::choices::{Choice, ListStyle};
use dialog_engine::domain::dialogs::{StepAction, WaterfallDialog};
use dialog_engine::domain::foundation::{ConversationId, DialogError};
use dialog_engine::domain::prompts::{
    ChoicePrompt, ConfirmPrompt, NumberPrompt, PromptOptions, TextPrompt,
};

fn colors() -> Vec<Choice> {
    Choice::list(["red", "green", "blue"])
}

fn choice_waterfall() -> WaterfallDialog {
    WaterfallDialog::new("main")
        .step(|_| {
            Ok(StepAction::prompt(
                "choice",
                PromptOptions::new("favorite color?").with_choices(colors()),
            ))
        })
        .step(|step| {
            let value = step
                .result()
                .and_then(|found| found.get("value"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            step.send(format!("Bot received the choice '{}'.", value));
            Ok(StepAction::EndDialog(None))
        })
}

fn manager_with(root: WaterfallDialog, prompt: impl Into<dialog_engine::domain::dialogs::Dialog>) -> DialogManager {
    let mut manager = DialogManager::new(Arc::new(InMemoryStateStorage::new()), root).unwrap();
    manager.add_dialog(prompt).unwrap();
    manager
}

#[tokio::test]
async fn inline_choice_prompt_round_trip() {
    let manager = manager_with(choice_waterfall(), ChoicePrompt::new("choice"));

    TestAdapter::new(Arc::new(manager))
        .send("hello")
        .assert_reply("favorite color? (1) red, (2) green, or (3) blue")
        .send("green")
        .assert_reply("Bot received the choice 'green'.")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn choice_prompt_accepts_ordinals_and_retries_on_nonsense() {
    let manager = manager_with(choice_waterfall(), ChoicePrompt::new("choice"));

    TestAdapter::new(Arc::new(manager))
        .send("hello")
        .assert_reply("favorite color? (1) red, (2) green, or (3) blue")
        .send("purple")
        .assert_reply("favorite color? (1) red, (2) green, or (3) blue")
        .send("the third one")
        .assert_reply("Bot received the choice 'blue'.")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn list_style_choice_prompt() {
    let manager = manager_with(
        choice_waterfall(),
        ChoicePrompt::new("choice").with_style(ListStyle::List),
    );

    TestAdapter::new(Arc::new(manager))
        .send("hello")
        .assert_reply("favorite color?\n\n   1. red\n   2. green\n   3. blue")
        .send("2")
        .assert_reply("Bot received the choice 'green'.")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn choice_prompt_renders_in_the_user_locale() {
    let manager = manager_with(choice_waterfall(), ChoicePrompt::new("choice"));

    TestAdapter::new(Arc::new(manager))
        .with_locale("de-DE")
        .send("hallo")
        .assert_reply("favorite color? (1) red, (2) green, oder (3) blue")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn number_prompt_retries_until_it_gets_a_number() {
    let root = WaterfallDialog::new("main")
        .step(|_| {
            Ok(StepAction::prompt(
                "age",
                PromptOptions::new("How old are you?").with_retry_prompt("Please enter a number."),
            ))
        })
        .step(|step| {
            let age = step.result().and_then(Value::as_i64).unwrap_or(-1);
            step.send(format!("You are {}.", age));
            Ok(StepAction::EndDialog(None))
        });
    let manager = manager_with(root, NumberPrompt::<i64>::new("age"));

    TestAdapter::new(Arc::new(manager))
        .send("hi")
        .assert_reply("How old are you?")
        .send("lots")
        .assert_reply("Please enter a number.")
        .send("I am 42 years old")
        .assert_reply("You are 42.")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn validator_messages_replace_the_retry_prompt() {
    let root = WaterfallDialog::new("main")
        .step(|_| {
            Ok(StepAction::prompt(
                "age",
                PromptOptions::new("How old are you?").with_retry_prompt("Try again."),
            ))
        })
        .step(|step| {
            let age = step.result().and_then(Value::as_i64).unwrap_or(-1);
            step.send(format!("Welcome, {}.", age));
            Ok(StepAction::EndDialog(None))
        });
    let prompt = NumberPrompt::<i64>::new("age").with_validator(|ctx| {
        let value = ctx.recognized().value;
        match value {
            Some(age) if age >= 18 => true,
            Some(_) => {
                let attempt = ctx.attempt_count();
                ctx.send(format!("Too young (attempt {}).", attempt));
                false
            }
            None => false,
        }
    });
    let manager = manager_with(root, prompt);

    TestAdapter::new(Arc::new(manager))
        .send("hi")
        .assert_reply("How old are you?")
        .send("12")
        .assert_reply("Too young (attempt 1).")
        .send("what")
        .assert_reply("Try again.")
        .send("30")
        .assert_reply("Welcome, 30.")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn confirm_prompt_renders_yes_no_and_returns_a_bool() {
    let root = WaterfallDialog::new("main")
        .step(|_| Ok(StepAction::prompt("confirm", PromptOptions::new("Please confirm."))))
        .step(|step| {
            let confirmed = step.result().and_then(Value::as_bool);
            step.send(format!("Confirmed: {:?}", confirmed));
            Ok(StepAction::EndDialog(None))
        });
    let manager = manager_with(root, ConfirmPrompt::new("confirm"));

    TestAdapter::new(Arc::new(manager))
        .send("hi")
        .assert_reply("Please confirm. (1) Yes or (2) No")
        .send("maybe")
        .assert_reply("Please confirm. (1) Yes or (2) No")
        .send("nope")
        .assert_reply("Confirmed: Some(false)")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn text_prompt_feeds_the_next_step() {
    let root = WaterfallDialog::new("main")
        .step(|_| Ok(StepAction::prompt("name", PromptOptions::new("Name?"))))
        .step(|step| {
            let name = step.result_str().unwrap_or_default().to_string();
            step.send(format!("Hello {}", name));
            Ok(StepAction::EndDialog(None))
        });
    let manager = manager_with(root, TextPrompt::new("name"));

    TestAdapter::new(Arc::new(manager))
        .send("hi")
        .assert_reply_with(|reply| match reply.input_hint {
            Some(dialog_engine::domain::foundation::InputHint::ExpectingInput) => Ok(()),
            other => Err(format!("unexpected input hint {:?}", other)),
        })
        .send("Ada")
        .assert_reply("Hello Ada")
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn malformed_prompt_options_fail_the_turn() {
    let root = WaterfallDialog::new("main")
        .step(|_| Ok(StepAction::begin("name", Some(json!("just text")))));
    let manager = manager_with(root, TextPrompt::new("name"));

    let err = TestAdapter::new(Arc::new(manager))
        .send("hi")
        .run()
        .await
        .unwrap_err();

    match err {
        TestFlowError::Turn { source, .. } => assert!(matches!(
            source,
            DialogError::InvalidArgument { argument: "options", .. }
        )),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn prompts_require_options() {
    let root = WaterfallDialog::new("main").step(|_| Ok(StepAction::begin("name", None)));
    let manager = manager_with(root, TextPrompt::new("name"));

    let err = TestAdapter::new(Arc::new(manager))
        .send("hi")
        .run()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TestFlowError::Turn {
            source: DialogError::InvalidArgument { argument: "options", .. },
            ..
        }
    ));
}

#[tokio::test]
async fn conversation_recovers_after_a_failed_prompt_begin() {
    let root = WaterfallDialog::new("main")
        .step(|step| {
            if step.activity().text_or_empty() == "bad" {
                return Ok(StepAction::begin("name", Some(json!("just text"))));
            }
            Ok(StepAction::prompt("name", PromptOptions::new("Name?")))
        })
        .step(|step| {
            let name = step.result_str().unwrap_or_default().to_string();
            step.send(format!("Hello {}", name));
            Ok(StepAction::EndDialog(None))
        });
    let adapter = TestAdapter::new(Arc::new(manager_with(root, TextPrompt::new("name"))))
        .with_conversation(ConversationId::new("recovering").unwrap());

    let err = adapter.clone().send("bad").run().await.unwrap_err();
    assert!(matches!(
        err,
        TestFlowError::Turn {
            source: DialogError::InvalidArgument { argument: "options", .. },
            ..
        }
    ));

    adapter
        .send("hello again")
        .assert_reply("Name?")
        .send("Ada")
        .assert_reply("Hello Ada")
        .run()
        .await
        .unwrap();
}
