use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::completion::GeminiClient;
use crate::core::{AppConfig, init_tracing};
use crate::pdf::extractor_for;
use crate::session::{ConversationController, Sender, Session, UploadController, UploadFile};
use crate::view::{TYPING_INDICATOR, ViewModel};

const HELP: &str = "Commands: /upload <path to pdf>, /quit. Anything else is sent as a message.";

/// What the terminal has shown so far
#[derive(Default)]
struct Printed {
    messages: usize,
    error: Option<String>,
}

/// Print whatever the transcript gained since the last call and the
/// error banner when it changes.
fn print_new(session: &Session, printed: &mut Printed) {
    let view = ViewModel::from_snapshot(&session.snapshot());
    for message in view.messages.iter().skip(printed.messages) {
        match message.sender {
            // The user already sees what they typed
            Sender::User => {}
            Sender::Ai => println!("{}", message.text),
        }
    }
    printed.messages = view.messages.len();
    if view.error != printed.error {
        if let Some(error) = &view.error {
            println!("[!] {}", error);
        }
        printed.error = view.error;
    }
}

pub async fn run() -> Result<()> {
    init_tracing(&format!("{}=warn", env!("CARGO_CRATE_NAME")));

    let config = AppConfig::default();
    let session = Session::new();
    let upload = UploadController::new(
        session.clone(),
        extractor_for(config.extractor_url.as_deref()),
    );
    let conversation = ConversationController::new(
        session.clone(),
        Arc::new(GeminiClient::new(
            &config.completion_api_hostname,
            &config.completion_api_key,
            &config.completion_model,
        )),
        config.generation.clone(),
    );

    let mut rl = DefaultEditor::new()?;
    let mut printed = Printed::default();
    println!("{}", HELP);

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line == "/quit" {
                    break;
                }
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Some(path) = line.strip_prefix("/upload") {
                    let path = path.trim();
                    if path.is_empty() {
                        println!("{}", HELP);
                        continue;
                    }
                    println!("Processing...");
                    // Failures land in the error banner
                    let _ = upload.submit_upload(UploadFile::from_path(Path::new(path))).await;
                } else {
                    println!("{}", TYPING_INDICATOR);
                    let _ = conversation.send_message(line).await;
                }
                print_new(&session, &mut printed);
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
