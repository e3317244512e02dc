mod config;

use crate::config::Config;
use anyhow::{Context, Result};
use clap::Parser;
use interview_core::prompt_loader::load_prompt_set;
use interview_core::{
    Continuation, ExperienceLevel, FeedbackResult, InterviewRole, InterviewService,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::time::ChronoLocal;

/// Run a mock interview in the terminal.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Role to interview for: software_engineer, data_scientist, product_manager or general
    #[arg(short, long, default_value = "general")]
    role: String,

    /// Experience level: junior, mid or senior
    #[arg(short, long, default_value = "mid")]
    level: String,

    /// Name the interviewer should address you by
    #[arg(short, long)]
    name: Option<String>,

    /// Use the built-in offline interviewer instead of a hosted model
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let config = Config::from_env(args.offline).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let role: InterviewRole = args.role.parse()?;
    let level: ExperienceLevel = args.level.parse()?;

    let prompts = load_prompt_set(config.provider.prompts_dir.as_deref())
        .context("Failed to load interviewer prompts")?;
    let model = config
        .provider
        .build_model()
        .context("Failed to build completion model")?;
    let service = InterviewService::new(model, prompts, config.interview);

    let started = service.start(role, level, args.name).await;
    let session_id = started.session.session_id().to_string();
    tracing::info!("Started interview session {}", session_id);

    println!("Mock interview: {} ({})", role.display_name(), level);
    println!("Type your answers and press Enter. Type 'quit' to finish early.\n");
    println!("Interviewer: {}\n", started.opening.utterance);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                let answer = line.trim();
                if answer.is_empty() {
                    continue;
                }
                if matches!(answer, "quit" | "exit") {
                    break;
                }

                let reply = service.submit_turn(&session_id, answer).await?;
                println!(
                    "\nInterviewer [{}, question {}]: {}\n",
                    reply.stage, reply.question_number, reply.text_response
                );
                if reply.continuation == Continuation::End {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    service.end_session(&session_id).await?;
    println!("Generating feedback...\n");
    let feedback = service.get_feedback(&session_id).await?;
    print_feedback(&feedback);
    Ok(())
}

fn print_feedback(feedback: &FeedbackResult) {
    println!("Overall score: {}/100", feedback.overall_score);
    print_list("Strengths", &feedback.strengths);
    print_list("Areas for improvement", &feedback.areas_for_improvement);
    print_list("Recommendations", &feedback.recommendations);
    if let Some(error) = &feedback.detailed_feedback.error {
        println!("\nFeedback could not be generated: {error}");
    } else if !feedback.detailed_feedback.summary.is_empty() {
        println!("\n{}", feedback.detailed_feedback.summary);
    }
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("\n{title}:");
    for item in items {
        println!("  - {item}");
    }
}
