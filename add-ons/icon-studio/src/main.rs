//! Icon Studio: terminal rendition of the avatar voice-chat panel.
//!
//! Plain lines are fed to the panel as recognized speech; slash commands cover the rest.
//! Pass `--mute` to run without speech output (replies fall back to on-screen text).

mod commands;
mod console;

use anyhow::Context;
use commands::{Command, HELP};
use console::{render_message, render_outcome, ConsoleCheckout, ConsoleNotifier, ConsoleSpeaker};
use icon_core::icon_voice::{
    ChannelRecognizer, ListenConfig, NoSynthesizer, SpeechSynthesizer, VoiceInput, VoiceOutput,
};
use icon_core::{
    ActionKind, InteractionController, OpenRouterReplyGenerator, Persona, PersonaId,
    ReplyBackend, ReplyGenerator, StudioConfig, TemplateReplyGenerator,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[icon-studio] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let muted = std::env::args().any(|a| a == "--mute");
    let config = StudioConfig::load().context("load studio config")?;
    let catalog = Arc::new(config.persona_catalog()?);

    let replies: Arc<dyn ReplyGenerator> = match config.reply_backend {
        ReplyBackend::OpenRouter => match OpenRouterReplyGenerator::from_env(Arc::clone(&catalog)) {
            Some(remote) => {
                tracing::info!(model = remote.model(), "reply backend: openrouter");
                Arc::new(remote)
            }
            None => {
                tracing::warn!("reply_backend=openrouter but OPENROUTER_API_KEY is unset; using templates");
                Arc::new(TemplateReplyGenerator::new(Arc::clone(&catalog)))
            }
        },
        ReplyBackend::Template => Arc::new(TemplateReplyGenerator::new(Arc::clone(&catalog))),
    };

    let (recognizer, utterance_tx) = ChannelRecognizer::new(8);
    let synthesizer: Arc<dyn SpeechSynthesizer> = if muted {
        Arc::new(NoSynthesizer)
    } else {
        Arc::new(ConsoleSpeaker)
    };

    let controller = InteractionController::new(
        config.controller_config(),
        Arc::clone(&catalog),
        replies,
    )
    .with_voice_input(VoiceInput::new(
        Arc::new(recognizer),
        ListenConfig {
            timeout: config.listen_timeout(),
        },
    ))
    .with_voice_output(VoiceOutput::new(synthesizer, Arc::new(ConsoleNotifier)))
    .with_checkout(Arc::new(ConsoleCheckout));

    let mut persona = catalog
        .default_persona()
        .cloned()
        .context("persona catalog is empty")?;

    println!("🎶 {}: avatar chat", config.app_name);
    println!("Talking to {} ({}). Type /help.", persona.display_name, persona.role);
    tracing::info!(
        starting_balance = config.starting_balance,
        backend = config.reply_backend.as_str(),
        muted,
        "icon-studio started"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("CTRL-C received; closing panel");
                None
            }
        };
        let Some(line) = line else { break };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Say(text) => {
                let outcome = say(&controller, &utterance_tx, &persona, text).await?;
                println!("{}", render_outcome(&outcome, &persona));
            }
            Command::RequestAction(what) => {
                let outcome = controller
                    .perform_action(ActionKind::RequestAction, &persona, &what)
                    .await;
                println!("{}", render_outcome(&outcome, &persona));
            }
            Command::SelectPersona(arg) => match select_persona(&controller, &arg) {
                Some(p) => {
                    persona = p;
                    println!("Now talking to {} ({}).", persona.display_name, persona.role);
                }
                None => println!("No persona '{}'. Try /personas.", arg),
            },
            Command::Personas => {
                for p in controller.catalog().iter() {
                    println!(
                        "  {} {} ({}) speak {} / action {}",
                        p.id, p.display_name, p.role, p.costs.speak, p.costs.request_action
                    );
                }
            }
            Command::Buy => {
                let top_up = controller.buy_credits();
                if top_up.url.is_none() {
                    println!("No checkout link configured (set ICON__CHECKOUT__URL).");
                }
            }
            Command::Balance => match controller.balance().await {
                Some(balance) => println!("🪙 {} tokens", balance),
                None => println!("The chat panel is closed."),
            },
            Command::Transcript => match controller.session_snapshot().await {
                Some(session) => {
                    for message in session.transcript() {
                        let name = controller
                            .catalog()
                            .get(message.persona)
                            .map(|p| p.display_name.as_str())
                            .unwrap_or("persona");
                        println!("{}", render_message(message, name));
                    }
                }
                None => println!("The chat panel is closed."),
            },
            Command::Links => {
                let entries = config.links.entries();
                if entries.is_empty() {
                    println!("No links configured.");
                }
                for (label, url) in entries {
                    println!("  {}: {}", label, url);
                }
            }
            Command::Close => {
                controller.close_surface().await;
                println!("Chat panel closed.");
            }
            Command::Open => {
                controller.open_surface().await;
                println!("Chat panel open with a fresh session.");
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
            Command::Unknown(name) => println!("Unknown command /{}. Type /help.", name),
        }
    }

    controller.close_surface().await;
    Ok(())
}

/// Feed `text` through the recognizer as if it had been spoken, then run the voice turn.
/// Nothing is queued when the turn cannot reach listening, so later turns never hear it.
async fn say(
    controller: &InteractionController,
    utterance_tx: &mpsc::Sender<String>,
    persona: &Persona,
    text: String,
) -> anyhow::Result<icon_core::ActionOutcome> {
    if controller.is_open().await && controller.voice_input().is_supported() {
        utterance_tx
            .send(text)
            .await
            .context("speech channel closed")?;
    }
    Ok(controller.listen_and_respond(persona).await)
}

fn select_persona(controller: &InteractionController, arg: &str) -> Option<Persona> {
    let catalog = controller.catalog();
    let by_index = arg
        .parse::<usize>()
        .ok()
        .and_then(|i| catalog.get(PersonaId(i)));
    by_index.or_else(|| catalog.find_by_name(arg)).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use icon_core::{ActionOutcome, ControllerConfig, PersonaCatalog};

    fn panel() -> (InteractionController, mpsc::Sender<String>, Persona) {
        let catalog = Arc::new(PersonaCatalog::builtin());
        let persona = catalog.get(PersonaId(0)).cloned().unwrap();
        let (recognizer, tx) = ChannelRecognizer::new(8);
        let controller = InteractionController::new(
            ControllerConfig::default(),
            Arc::clone(&catalog),
            Arc::new(TemplateReplyGenerator::new(catalog)),
        )
        .with_voice_input(VoiceInput::new(Arc::new(recognizer), ListenConfig::default()));
        (controller, tx, persona)
    }

    #[tokio::test]
    async fn words_said_while_closed_are_not_replayed() {
        let (controller, tx, persona) = panel();
        controller.close_surface().await;

        let outcome = say(&controller, &tx, &persona, "said while closed".into())
            .await
            .unwrap();
        assert_eq!(outcome, ActionOutcome::SurfaceClosed);

        controller.open_surface().await;
        let outcome = say(&controller, &tx, &persona, "fresh words".into())
            .await
            .unwrap();
        let reply = outcome.reply().unwrap();
        assert!(reply.contains("fresh words"));
        assert!(!reply.contains("said while closed"));

        let session = controller.session_snapshot().await.unwrap();
        assert_eq!(session.transcript()[0].text, "fresh words");
    }
}
