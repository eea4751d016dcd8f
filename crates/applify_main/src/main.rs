mod cli;
mod error;
mod log;
mod questions;

use anyhow::Context;
use applify_domain::{Plugin, PluginConfig, Question, Renderer};
use applify_pipe::{Channel, Event, Pipe, Subscription};
use applify_prompt::{
    InquireRenderer, PromptPlugin, ASK_EVENT, PROMPT_CHANNEL, QUESTION_EVENT, RESPONSE_EVENT,
};
use clap::Parser;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = log::init_tracing(log::log_dir(cli.log_dir.clone()), cli.verbose)?;

    let mut questions = match &cli.questions {
        Some(path) => questions::load_questions(path)?,
        None => Vec::new(),
    };
    questions.extend(cli.inline.into_iter().map(Question::from));

    let answers = ask(questions, InquireRenderer::new()).await?;
    println!("{}", serde_json::to_string_pretty(&answers)?);
    Ok(())
}

/// Plays the host: wires a prompt plugin onto a fresh pipe, sends every
/// question over the `prompt` channel, asks, and returns the `response`
/// payload.
async fn ask<R: Renderer + 'static>(
    questions: Vec<Question>,
    renderer: R,
) -> anyhow::Result<Value> {
    let pipe = Pipe::new();
    let plugin = PromptPlugin::new(renderer);
    plugin.init(PluginConfig::default(), pipe.clone()).await?;
    plugin.run().await?;

    let channel = pipe
        .channel(PROMPT_CHANNEL)
        .context("Prompt plugin did not create its channel")?;

    let (response, mut rx) = forward_responses(&channel);

    for question in questions {
        channel
            .emit(QUESTION_EVENT, serde_json::to_value(&question)?)
            .await?;
    }
    channel.emit(ASK_EVENT, Value::Null).await?;

    response.dispose();
    plugin.dispose();
    rx.recv().await.context("Prompt plugin published no response")
}

/// Forwards every `response` payload on `channel` to the returned receiver.
/// A closed receiver fails the emitting `ask`.
fn forward_responses(channel: &Channel) -> (Subscription, UnboundedReceiver<Value>) {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let subscription = channel.on(RESPONSE_EVENT, move |event: Event| {
        let sent = tx
            .send(event.value)
            .context("Response receiver is closed");
        async move { sent }
    });
    (subscription, rx)
}
