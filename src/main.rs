// picksy - rhythm practice mascot for the terminal
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use picksy::cli::{Args, Command};
use picksy::config::AppConfig;
use picksy::error::PicksyError;
use picksy::metrics::gather_metrics;
use picksy::rhythm::{intervals_from_hits, RhythmTutor};
use picksy::session::PicksySession;
use picksy::utils::logging;
use std::io::Write;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

type InputLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let config = AppConfig::load(args.config.as_deref())?;

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting picksy v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Dispatch
    match args.command() {
        Command::Chat => {
            let session = PicksySession::from_config(&config, args.offline)?;
            chat(&session).await?;
        }
        Command::Ask { text } => {
            let session = PicksySession::from_config(&config, args.offline)?;
            let reply = session.respond(&text.join(" ")).await?;
            println!("{}", reply.text);
        }
        Command::Reset => {
            let session = PicksySession::from_config(&config, true)?;
            session.reset_conversation();
            println!("Conversation cleared.");
        }
        Command::Practice { level } => {
            practice(RhythmTutor::starting_at(&config.practice, level)).await?;
        }
    }

    if args.metrics {
        eprintln!("{}", gather_metrics());
    }

    Ok(())
}

async fn chat(session: &PicksySession) -> Result<()> {
    // Load models while the user types
    let loading = session.start_background_init();

    println!("Hi, I'm Picksy! Ask me anything about rhythm. Type 'exit' to leave.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("[{}] you> ", session.status().message);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        match input {
            "" => continue,
            "exit" | "quit" => break,
            "/retry" => {
                let ready = session.retry_models().await;
                println!("picksy> {}", if ready { "AI Ready" } else { "AI Limited" });
                continue;
            }
            _ => {}
        }

        match session.respond(input).await {
            Ok(reply) => println!("picksy> {}", reply.text),
            Err(PicksyError::Busy) => println!("picksy> One moment, still thinking..."),
            Err(e) => return Err(e.into()),
        }
    }

    loading.abort();
    Ok(())
}

async fn practice(mut tutor: RhythmTutor) -> Result<()> {
    println!("Welcome to Rhythm Tutor!");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(pattern) = tutor.current_pattern().map(<[f64]>::to_vec) {
        println!();
        println!("Level {} of {}", tutor.level(), tutor.levels());
        println!("Pattern: {}", describe(&pattern));
        println!(
            "Press Enter to start, then press Enter {} times in rhythm.",
            pattern.len()
        );

        if !wait_enter(&mut lines).await? {
            return Ok(());
        }
        println!("Go!");

        let start = Instant::now();
        let mut hits = Vec::with_capacity(pattern.len());
        while hits.len() < pattern.len() {
            if !wait_enter(&mut lines).await? {
                return Ok(());
            }
            hits.push(Instant::now());
        }

        let outcome = tutor.record_attempt(&intervals_from_hits(start, &hits));
        println!("Score: {}%", outcome.score as u32);
        if outcome.passed {
            println!("Great job! Next level...");
        } else {
            println!("Try again, same level.");
        }
    }

    println!("Congrats! Rhythm Master!");
    Ok(())
}

/// False when stdin is closed
async fn wait_enter(lines: &mut InputLines) -> Result<bool> {
    Ok(lines.next_line().await?.is_some())
}

fn describe(pattern: &[f64]) -> String {
    pattern
        .iter()
        .map(|interval| format!("{:.2}s", interval))
        .collect::<Vec<_>>()
        .join(" | ")
}
