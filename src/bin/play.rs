//! Local terminal play.
//!
//! Seats one agent per `--model` and plays a session in this terminal,
//! rendering events as they arrive and prompting for your actions.

use clap::Parser;
use dialoguer::Input;
use dialoguer::Select;
use pokerroom::engine::Action;
use pokerroom::engine::ActionKind;
use pokerroom::engine::Legal;
use pokerroom::gameroom::Console;
use pokerroom::gameroom::Opponent;
use pokerroom::gameroom::Turn;
use pokerroom::hosting::Casino;
use pokerroom::hosting::Settings;
use pokerroom::*;
use std::sync::Arc;
use tokio::task::JoinSet;

#[derive(Debug, Parser)]
struct Play {
    #[command(flatten)]
    settings: Settings,
    /// Ollama model for each opponent, in seat order
    #[arg(long = "model", required = true)]
    models: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log(log::LevelFilter::Warn)?;
    kys();
    let args = Play::parse();
    let opponents = args
        .models
        .iter()
        .enumerate()
        .map(|(i, model)| Opponent {
            name: format!("Bot{}", i + 1),
            model: model.clone(),
            temperature: TEMPERATURE,
        })
        .collect::<Vec<_>>();
    let casino = Casino::new(args.settings.inference()?, args.settings.defaults())
        .with_trace(args.settings.trace().await?);
    let session = casino.create(&opponents, casino.defaults().clone()).await?;
    let (console, mut turns) = Console::new();
    let console = Arc::new(console);
    session.connect(console.clone()).await;
    session.start().await;
    // at most one prompt reads stdin; a turn that arrives meanwhile waits in `queued`
    let mut prompts = JoinSet::new();
    let mut queued = None::<Turn>;
    loop {
        tokio::select! {
            _ = session.wait() => break,
            Some(turn) = turns.recv() => match prompts.is_empty() {
                true => {
                    prompts.spawn_blocking(move || ask(turn));
                }
                false => queued = Some(turn),
            },
            Some(answer) = prompts.join_next() => {
                let (number, action) = answer??;
                match console.is_live(number) {
                    true => {
                        if let Err(e) = session.submit(action).await {
                            log::warn!("{}", e);
                        }
                    }
                    false => log::warn!("turn {} already resolved, dropped {}", number, action),
                }
                if let Some(turn) = queued.take().filter(|t| console.is_live(t.number)) {
                    prompts.spawn_blocking(move || ask(turn));
                }
            }
        }
    }
    casino.close_all().await;
    if !prompts.is_empty() {
        // a prompt blocked on stdin cannot be cancelled, and the runtime would wait for it
        std::process::exit(0);
    }
    Ok(())
}

fn ask(turn: Turn) -> anyhow::Result<(u64, Action)> {
    choose(turn.legal).map(|action| (turn.number, action))
}

fn choose(legal: Legal) -> anyhow::Result<Action> {
    let options = [
        (legal.can_fold, "Fold", ActionKind::Fold),
        (legal.can_check, "Check", ActionKind::Check),
        (legal.can_call, "Call", ActionKind::Call),
        (legal.can_raise, "Raise", ActionKind::Raise),
        (legal.max_raise > 0, "All-in", ActionKind::AllIn),
    ]
    .into_iter()
    .filter(|(allowed, _, _)| *allowed)
    .map(|(_, label, kind)| (label, kind))
    .collect::<Vec<_>>();
    let labels = options.iter().map(|(label, _)| *label).collect::<Vec<_>>();
    let selection = Select::new()
        .with_prompt(format!("to call {}", legal.call_amount))
        .report(false)
        .items(&labels)
        .default(0)
        .interact()?;
    match options[selection].1 {
        ActionKind::Raise => {
            let to = Input::<Chips>::new()
                .with_prompt(format!("Raise to ({}-{})", legal.min_raise, legal.max_raise))
                .report(false)
                .validate_with(|to: &Chips| -> Result<(), &str> {
                    match (legal.min_raise..=legal.max_raise).contains(to) {
                        true => Ok(()),
                        false => Err("Raise out of range"),
                    }
                })
                .interact_text()?;
            Ok(Action::raise(to))
        }
        ActionKind::AllIn => Ok(Action::shove(legal.max_raise)),
        kind => Ok(Action::from(kind)),
    }
}
