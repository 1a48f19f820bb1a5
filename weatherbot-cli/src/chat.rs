//! Terminal rendering of the conversation.

use inquire::{InquireError, Text};
use tracing::debug;
use weatherbot_core::{ConversationTurn, Orchestrator, Role};

const TITLE: &str = "🌦️  Weather Assistant";
const CAPTION: &str = "Powered by Google Gemini & Open-Meteo";
const PLACEHOLDER: &str = "Ask about the weather (e.g. Will it rain in São Paulo tomorrow?)";
const THINKING: &str = "Consulting satellites and weather models...";

pub async fn run_interactive(orchestrator: &Orchestrator) -> anyhow::Result<()> {
    println!("{TITLE}");
    println!("{CAPTION}");
    println!("Type /history to replay the conversation, /quit to leave.\n");

    let mut session = orchestrator.start_session();
    debug!(session = %session.id(), "Started chat session");

    loop {
        let input = match Text::new("You:").with_placeholder(PLACEHOLDER).prompt() {
            Ok(input) => input,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        let input = input.trim();
        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/history" => {
                render_transcript(session.history());
                continue;
            }
            _ => {}
        }

        eprintln!("{THINKING}");
        match orchestrator.send(&mut session, input).await {
            Ok(answer) => render_turn(&ConversationTurn::assistant(answer)),
            Err(e) => render_error(&e),
        }
    }

    Ok(())
}

pub async fn ask_once(orchestrator: &Orchestrator, question: &str) {
    let mut session = orchestrator.start_session();

    eprintln!("{THINKING}");
    match orchestrator.send(&mut session, question).await {
        Ok(answer) => println!("{answer}"),
        Err(e) => render_error(&e),
    }
}

pub fn render_missing_credential(env_var: &str) {
    println!("{TITLE}");
    println!(
        "⚠️  No Gemini API key configured. Set {env_var} (or add it to .env), \
         or run `weatherbot configure` to start chatting."
    );
}

fn render_transcript(history: &[ConversationTurn]) {
    if history.is_empty() {
        println!("(no messages yet)\n");
        return;
    }
    for turn in history {
        render_turn(turn);
    }
}

fn render_turn(turn: &ConversationTurn) {
    let label = match turn.role {
        Role::User => "🧑 You",
        Role::Assistant => "🌦️  Assistant",
    };
    println!("{label}:\n{}\n", turn.content);
}

fn render_error(err: &dyn std::error::Error) {
    println!("❌ An error occurred: {err}\n");
}
