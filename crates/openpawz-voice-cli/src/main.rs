// OpenPawz Voice CLI
// Terminal front-end for the voice engine:
//   pawz-voice classify "turn on the flashlight"
//   pawz-voice parse '{"type":"action","action":"LIST_TASKS"}'
//   pawz-voice chat --session kitchen

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use log::{error, info};
use openpawz_voice::atoms::types::Parameters;
use openpawz_voice::engine::providers::backend_from_config;
use openpawz_voice::{
    ActionCategory, ClassificationResult, EngineConfig, InstantActionExecutor, OutputParser,
    ParsedOutput, PatternClassifier, RepositoryActionExecutor, Response, SessionManager,
};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "pawz-voice", version, about = "OpenPawz voice intent engine")]
struct Cli {
    /// Engine configuration (TOML). Missing file means defaults.
    #[arg(long, short, env = "PAWZ_VOICE_CONFIG", default_value = "pawz-voice.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pattern classifier on an utterance and print the result as JSON.
    Classify {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Run the output parser on raw backend text and print the result as JSON.
    Parse {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Interactive session against the configured backend.
    Chat {
        #[arg(long, default_value = "default")]
        session: String,
    },
}

// ── Console instant executor ───────────────────────────────────────────────

/// Stands in for device integrations: describes the action instead of doing it.
struct ConsoleInstantExecutor;

fn describe_instant(result: &ClassificationResult) -> String {
    let p = |key: &str| result.param(key).unwrap_or_default().to_string();
    match result.category {
        ActionCategory::ToggleFlashlight => match result.param("state") {
            Some("toggle") | None => "Toggling the flashlight".into(),
            Some(state) => format!("Turning the flashlight {state}"),
        },
        ActionCategory::TakePhoto => format!("Taking a {}", p("mode")),
        ActionCategory::RecordVideo => "Recording video".into(),
        ActionCategory::SetTimer => format!("Timer set for {} {}(s)", p("duration"), p("unit")),
        ActionCategory::SetAlarm => format!("Alarm set for {} {}(s) from now", p("duration"), p("unit")),
        ActionCategory::PlayMusic => match result.param("query") {
            Some(query) => format!("Playing {query}"),
            None => "Playing music".into(),
        },
        ActionCategory::SetReminder => match (result.param("task"), result.param("time")) {
            (Some(task), Some(time)) => format!("Reminder: {task} {time}"),
            (Some(task), None) => format!("Reminder: {task}"),
            _ => "Reminder set".into(),
        },
        ActionCategory::OpenApp => format!("Opening {}", p("appName")),
        other => format!("No device action for {}", other.as_str()),
    }
}

#[async_trait]
impl InstantActionExecutor for ConsoleInstantExecutor {
    async fn execute(&self, result: &ClassificationResult) -> Response {
        info!("[cli] instant {} {:?}", result.category.as_str(), result.parameters);
        Response::action(describe_instant(result))
    }
}

// ── Commands ───────────────────────────────────────────────────────────────

fn params_json(parameters: &Parameters) -> serde_json::Value {
    json!(parameters)
}

fn cmd_classify(text: &str) -> serde_json::Value {
    let result = PatternClassifier::new().classify(text);
    json!({
        "category": result.category.as_str(),
        "confidence": result.confidence,
        "instant": result.category.is_instant(),
        "parameters": params_json(&result.parameters),
    })
}

fn cmd_parse(text: &str) -> serde_json::Value {
    match OutputParser::new().parse(text) {
        ParsedOutput::Action(action) => json!({
            "type": "action",
            "action": action.kind.wire_name(),
            "parameters": params_json(&action.parameters),
        }),
        ParsedOutput::Conversation(text) => json!({"type": "conversation", "text": text}),
    }
}

fn print_response(response: &Response) {
    match response {
        Response::Action { message, data } => {
            println!("✓ {message}");
            if let Some(data) = data {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
        }
        Response::Text { text } => println!("{text}"),
        Response::Failure { error } => eprintln!("✗ {error}"),
    }
}

async fn cmd_chat(config: EngineConfig, session: &str) -> std::io::Result<()> {
    let backend = backend_from_config(&config.backend);
    let manager = SessionManager::new(
        config,
        Arc::new(ConsoleInstantExecutor),
        backend,
        Arc::new(RepositoryActionExecutor::in_memory()),
    );
    let dispatcher = manager.get_or_create(session);

    println!("pawz-voice chat (session '{session}'). /history, /clear, /quit. Ctrl-C cancels a reply.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                dispatcher.clear_context().await;
                println!("(context cleared)");
                continue;
            }
            "/history" => {
                for entry in dispatcher.context_snapshot().await {
                    println!("{}: {}", entry.role.label(), entry.text);
                }
                continue;
            }
            _ => {}
        }

        let cancel = CancellationToken::new();
        let guard = cancel.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                guard.cancel();
            }
        });
        let response = dispatcher.process_with_cancel(&line, &cancel).await;
        watcher.abort();
        print_response(&response);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Classify { text } => {
            println!("{}", cmd_classify(&text.join(" ")));
            ExitCode::SUCCESS
        }
        Command::Parse { text } => {
            println!("{}", cmd_parse(&text.join(" ")));
            ExitCode::SUCCESS
        }
        Command::Chat { session } => {
            let config = match EngineConfig::load(&cli.config) {
                Ok(config) => config,
                Err(e) => {
                    error!("[cli] {}", e);
                    eprintln!("{e}");
                    return ExitCode::FAILURE;
                }
            };
            match cmd_chat(config, &session).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("{e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_output() {
        let out = cmd_classify("set a timer for 5 minutes");
        assert_eq!(out["category"], "set_timer");
        assert_eq!(out["instant"], true);
        assert_eq!(out["parameters"]["duration"], "5");
    }

    #[test]
    fn test_parse_output() {
        let out = cmd_parse(r#"{"type":"action","action":"create_task","parameters":{"title":"x"}}"#);
        assert_eq!(out["action"], "CREATE_TASK");
        assert_eq!(cmd_parse("hi")["type"], "conversation");
    }

    #[test]
    fn test_describe_instant() {
        let flashlight = PatternClassifier::new().classify("turn off the torch");
        assert_eq!(describe_instant(&flashlight), "Turning the flashlight off");
        let app = PatternClassifier::new().classify("open whatsap");
        assert_eq!(describe_instant(&app), "Opening whatsapp");
    }
}
