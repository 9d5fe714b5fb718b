//! A terminal client for the document analysis assistant, built on the
//! `parley` library.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use parley::core::{ChatView, Role};
use parley::transport::Mode;
use parley::transport::catalog::MODELS;
use parley::{Session, SessionBuilder};
use parley_http_transport::HttpTransportConfigBuilder;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt};
use tokio::select;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, timeout};

const BAR_CHAR: &str = "▎";

const HELP: &str = "\
/advanced <query>   run an advanced analysis
/hybrid <query>     run a hybrid analysis
/vision <query>     ask about the attached drawings
/attach <document>  attach a document to the following queries
/detach             detach every document
/models             list the known models
/model [id]         select a model, or go back to the default
/mindmap            show the latest mind map
/export             print the conversation as JSON
/new                start a new conversation
/quit               leave";

/// Chat with the document analysis assistant
#[derive(Parser, Debug)]
#[command(name = "parley", version)]
struct Args {
    /// Base URL of the backend
    #[arg(long, default_value = "http://localhost:8000", env = "PARLEY_BASE_URL")]
    base_url: String,

    /// Token sent as bearer authorization
    #[arg(long, env = "PARLEY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Conversation to continue; a new one is started otherwise
    #[arg(short, long, env = "PARLEY_CONVERSATION_ID")]
    conversation: Option<String>,

    /// Document to attach to every query, may be repeated
    #[arg(short, long = "document")]
    documents: Vec<String>,

    /// Model for advanced analyses and vision queries
    #[arg(short, long, env = "PARLEY_MODEL")]
    model: Option<String>,

    /// Seconds a request may take
    #[arg(long, default_value_t = 120, env = "PARLEY_TIMEOUT_SECS")]
    timeout_secs: u64,
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Submit(Mode, &'a str),
    Attach(&'a str),
    Detach,
    Models,
    Model(Option<&'a str>),
    Mindmap,
    Export,
    New,
    Quit,
    Help,
    Empty,
    Invalid(String),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Submit(Mode::Chat, line);
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let mode = match name {
        "advanced" => Some(Mode::Advanced),
        "hybrid" => Some(Mode::Hybrid),
        "vision" => Some(Mode::Vision),
        _ => None,
    };
    if let Some(mode) = mode {
        if arg.is_empty() {
            return Command::Invalid(format!("usage: /{name} <query>"));
        }
        return Command::Submit(mode, arg);
    }
    match (name, arg) {
        ("attach", "") => Command::Invalid("usage: /attach <document>".to_owned()),
        ("attach", document) => Command::Attach(document),
        ("detach", _) => Command::Detach,
        ("models", _) => Command::Models,
        ("model", "") => Command::Model(None),
        ("model", id) => Command::Model(Some(id)),
        ("mindmap", _) => Command::Mindmap,
        ("export", _) => Command::Export,
        ("new", _) => Command::New,
        ("quit" | "exit", _) => Command::Quit,
        ("help", _) => Command::Help,
        _ => Command::Invalid(format!("unknown command: /{name}")),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = HttpTransportConfigBuilder::with_base_url(&args.base_url)
        .with_timeout(Duration::from_secs(args.timeout_secs));
    if let Some(api_key) = &args.api_key {
        config = config.with_api_key(api_key);
    }
    let session_builder = match SessionBuilder::connect(config.build()) {
        Ok(builder) => builder,
        Err(err) => {
            eprintln!("cannot set up the connection: {err}");
            return;
        }
    };

    let (mindmap_tx, mut mindmap_rx) = mpsc::unbounded_channel();
    let mut session = session_builder
        .on_view_mindmap(move |mermaid_code| {
            mindmap_tx.send(mermaid_code.to_owned()).ok();
        })
        .build();
    for document in &args.documents {
        session.attach_document(document);
    }
    if let Err(err) = session.select_model(args.model.as_deref()) {
        eprintln!("{err}, see /models");
        return;
    }
    let conversation_id = match args.conversation {
        Some(id) => {
            session.bind_conversation(id.clone());
            id
        }
        None => session.new_conversation(),
    };
    println!("{}", format!("conversation {conversation_id}").dimmed());

    let mut stdin = io::BufReader::new(io::stdin());
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut stdin).await else {
            break;
        };
        match parse_command(&line) {
            Command::Submit(mode, query) => {
                let mut rx = session.subscribe();
                let start = rx.borrow_and_update().messages.len();
                match mode {
                    Mode::Chat => session.send_message(query),
                    Mode::Advanced => session.advanced_analysis(query),
                    Mode::Hybrid => session.hybrid_analysis(query),
                    Mode::Vision => session.vision_query(query),
                }
                render_reply(&mut rx, start).await;
            }
            Command::Attach(document) => {
                session.attach_document(document);
                println!("attached: {}", session.documents().join(", "));
            }
            Command::Detach => {
                session.clear_documents();
                println!("no documents attached");
            }
            Command::Models => print_models(&session),
            Command::Model(id) => match session.select_model(id) {
                Ok(()) => match session.model() {
                    Some(model) => println!("using {}", model.name),
                    None => println!("using the default model"),
                },
                Err(err) => eprintln!("{err}"),
            },
            Command::Mindmap => show_mindmap(&session, &mut mindmap_rx).await,
            Command::Export => export(&session.view()),
            Command::New => {
                let conversation_id = session.new_conversation();
                println!("{}", format!("conversation {conversation_id}").dimmed());
            }
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Empty => {}
            Command::Invalid(message) => eprintln!("{message}"),
        }
    }

    session.close();
}

/// Prints the assistant turns added after index `start` as they are
/// revealed, until the view settles.
async fn render_reply(rx: &mut watch::Receiver<ChatView>, start: usize) {
    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let mut progress_bar: Option<ProgressBar> = None;
    // Index of the message being printed and how much of it is out.
    let mut cursor = start;
    let mut printed = 0;

    loop {
        let done = {
            let view = rx.borrow_and_update();
            let waiting = view.is_loading && view.streaming_message().is_none();
            if !waiting {
                if let Some(progress_bar) = progress_bar.take() {
                    progress_bar.finish_and_clear();
                }
            }
            print_new_content(&view, &mut cursor, &mut printed);
            if waiting {
                progress_bar
                    .get_or_insert_with(|| {
                        let progress_bar = ProgressBar::new_spinner();
                        progress_bar.set_style(progress_style.clone());
                        progress_bar.set_message("🤔 Thinking...");
                        progress_bar
                    })
                    .inc(1);
            }
            view.messages.len() > start
                && !view.is_loading
                && cursor >= view.messages.len()
        };
        if done {
            break;
        }

        select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = sleep(Duration::from_millis(100)) => {}
        }
    }

    if let Some(progress_bar) = progress_bar {
        progress_bar.finish_and_clear();
    }
}

fn print_new_content(view: &ChatView, cursor: &mut usize, printed: &mut usize) {
    while let Some(message) = view.messages.get(*cursor) {
        if message.role == Role::User {
            *cursor += 1;
            continue;
        }
        if message.is_error {
            println!("{}⚠️  {}", BAR_CHAR.bright_red(), message.content.red());
            *cursor += 1;
            continue;
        }

        if *printed == 0 {
            print!("{}🤖 ", BAR_CHAR.bright_cyan());
        }
        let new_text = message.content.get(*printed..).unwrap_or_default();
        print!("{}", new_text.bright_white());
        *printed += new_text.len();
        if message.is_streaming {
            std::io::stdout().flush().ok();
            return;
        }

        println!();
        if !message.sources.is_empty() {
            println!(
                "{}{}",
                BAR_CHAR.bright_cyan(),
                format!("sources: {}", message.sources.join(", ")).dimmed()
            );
        }
        if message.has_mindmap {
            println!(
                "{}{}",
                BAR_CHAR.bright_cyan(),
                "a mind map is attached, see /mindmap".dimmed()
            );
        }
        *cursor += 1;
        *printed = 0;
    }
}

fn print_models(session: &Session) {
    let selected = session.model().map(|m| m.id);
    for model in MODELS {
        let marker = if selected == Some(model.id) { "*" } else { " " };
        let capabilities: Vec<_> = model
            .capabilities
            .iter()
            .map(|c| format!("{c:?}").to_lowercase())
            .collect();
        println!(
            "{marker} {} {}",
            model.id.bright_white(),
            format!(
                "({}, {}, {}{})",
                model.vendor,
                model.context,
                capabilities.join("/"),
                if model.free { ", free" } else { "" }
            )
            .dimmed()
        );
    }
}

async fn show_mindmap(
    session: &Session,
    mindmap_rx: &mut mpsc::UnboundedReceiver<String>,
) {
    let view = session.view();
    let Some(message) = view.messages.iter().rev().find(|m| m.has_mindmap)
    else {
        println!("no mind map in this conversation");
        return;
    };
    session.view_mindmap(&message.id);
    match timeout(Duration::from_secs(1), mindmap_rx.recv()).await {
        Ok(Some(mermaid_code)) => {
            let bar = BAR_CHAR.bright_magenta();
            for line in mermaid_code.lines() {
                println!("{bar}{line}");
            }
        }
        _ => warn!("mind map of message {} is unavailable", message.id),
    }
}

fn export(view: &ChatView) {
    match serde_json::to_string_pretty(&view.messages) {
        Ok(json) => println!("{json}"),
        Err(err) => error!("cannot export the conversation: {err}"),
    }
}

async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<String> {
    let mut line = String::new();

    match reader.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_line_keeps_buffered_lines() {
        let mut input: &[u8] = b"/help\n/models\nlast";
        assert_eq!(read_line(&mut input).await.as_deref(), Some("/help\n"));
        assert_eq!(read_line(&mut input).await.as_deref(), Some("/models\n"));
        assert_eq!(read_line(&mut input).await.as_deref(), Some("last"));
        assert_eq!(read_line(&mut input).await, None);
    }

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(
            parse_command("  what is the wall thickness?\n"),
            Command::Submit(Mode::Chat, "what is the wall thickness?")
        );
        assert_eq!(parse_command("   \n"), Command::Empty);
    }

    #[test]
    fn test_mode_commands() {
        assert_eq!(
            parse_command("/advanced compare rev A and B"),
            Command::Submit(Mode::Advanced, "compare rev A and B")
        );
        assert_eq!(
            parse_command("/hybrid  tolerances"),
            Command::Submit(Mode::Hybrid, "tolerances")
        );
        assert_eq!(
            parse_command("/vision\twhat is shown?"),
            Command::Submit(Mode::Vision, "what is shown?")
        );
        assert_eq!(
            parse_command("/vision"),
            Command::Invalid("usage: /vision <query>".to_owned())
        );
    }

    #[test]
    fn test_other_commands() {
        assert_eq!(parse_command("/attach doc-42"), Command::Attach("doc-42"));
        assert_eq!(parse_command("/detach"), Command::Detach);
        assert_eq!(parse_command("/model"), Command::Model(None));
        assert_eq!(
            parse_command("/model gemini-2.5-pro"),
            Command::Model(Some("gemini-2.5-pro"))
        );
        assert_eq!(parse_command("/models"), Command::Models);
        assert_eq!(parse_command("/mindmap"), Command::Mindmap);
        assert_eq!(parse_command("/export"), Command::Export);
        assert_eq!(parse_command("/new"), Command::New);
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert_eq!(
            parse_command("/frobnicate"),
            Command::Invalid("unknown command: /frobnicate".to_owned())
        );
    }
}
