//! Interactive chat command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::{ChatSession, OpenAIChatModel, Retriever};
use console::style;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::debug;

/// What to do with one line of user input.
#[derive(Debug, PartialEq)]
enum ChatInput<'a> {
    Exit,
    Skip,
    Question(&'a str),
}

fn classify(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        ChatInput::Skip
    } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        ChatInput::Exit
    } else {
        ChatInput::Question(line)
    }
}

/// Run the interactive chat command.
pub async fn run_chat(
    model: Option<String>,
    source: Option<String>,
    compress: bool,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Query) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docchat doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let prompts = super::load_prompts(&settings)?;
    let orchestrator = Orchestrator::new(settings.clone())?;
    let mut retriever = Retriever::new(
        orchestrator.vector_store(),
        orchestrator.embedder(),
        &settings.retrieval,
    )
    .with_source(source);
    if compress || settings.retrieval.compress {
        retriever = retriever.with_compressor(super::compressor(&settings, prompts.clone())?);
    }

    let model = model.unwrap_or_else(|| settings.chat.model.clone());
    let chat_model = Arc::new(OpenAIChatModel::from_settings(
        &settings.openai,
        &model,
        settings.chat.temperature,
    )?);

    let mut session = ChatSession::new(retriever, chat_model, prompts, &settings.chat);

    println!("\n{}", style("docchat").bold().cyan());
    println!("{}\n", style("Ask about your documents, or type 'exit' to quit.").dim());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        let question = match classify(&line) {
            ChatInput::Exit => break,
            ChatInput::Skip => continue,
            ChatInput::Question(q) => q,
        };

        let spinner = Output::spinner("Thinking...");
        let result = session.ask(question).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                if let Some(standalone) = &response.standalone_question {
                    debug!("Standalone question: {}", standalone);
                }
                println!("\n{} {}\n", style("Assistant:").cyan().bold(), response.answer);
                Output::sources(&response.sources);
            }
            Err(e) => Output::error(&format!("Error: {}", e)),
        }
    }

    Output::info(&format!(
        "Goodbye! ({} question(s) this session)",
        session.history().len()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_input() {
        assert_eq!(classify("exit\n"), ChatInput::Exit);
        assert_eq!(classify("  EXIT "), ChatInput::Exit);
        assert_eq!(classify("Quit"), ChatInput::Exit);
        assert_eq!(classify("   \n"), ChatInput::Skip);
        assert_eq!(
            classify("what about exit interviews?\n"),
            ChatInput::Question("what about exit interviews?")
        );
    }
}
