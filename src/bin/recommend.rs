//! One-shot terminal client: reads a profile from YAML, prints recommendation
//! cards, then asks any questions given after the profile path.
//!
//! Usage: recommend <profile.yaml> [question ...]
use anyhow::{Context, Result, bail};
use colored::*;
use std::fs;

use course_advisor::AdvisorService;
use course_advisor::config::Config;
use course_advisor::models::Role;
use course_advisor::profile::ProfileForm;
use course_advisor::render;
use course_advisor::session::Session;

#[tokio::main]
async fn main() -> Result<()> {
    // Minimal stderr tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(profile_path) = args.next() else {
        bail!("usage: recommend <profile.yaml> [question ...]");
    };
    let questions: Vec<String> = args.collect();

    let config = Config::load();
    let service = AdvisorService::new(&config)?;

    let contents = fs::read_to_string(&profile_path)
        .with_context(|| format!("Failed to read profile {profile_path}"))?;
    let form: ProfileForm = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse profile {profile_path}"))?;

    let mut session = Session::new(form, config.advisor.on_recommendation_failure);

    eprintln!("{}", "연수 정보를 분석하고 있습니다...".dimmed());
    match session
        .request_recommendations(service.recommender.as_ref())
        .await
    {
        Ok(set) => print!("{}", render::terminal_cards(&set)),
        Err(e) => eprintln!("{} {}", "오류가 발생했습니다:".red().bold(), e),
    }

    for question in questions {
        println!("{}", render::terminal_chat_line(Role::User, &question));
        match session.ask(service.chat.as_ref(), &question).await {
            Ok(reply) => println!("{}", render::terminal_chat_line(Role::Assistant, &reply.content)),
            Err(e) => eprintln!("{} {}", "오류가 발생했습니다:".red().bold(), e),
        }
    }

    Ok(())
}
