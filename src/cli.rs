use crate::{
    control::{ClientSocket, Message, Opcode},
    daemon::Daemon,
    library, Database,
};
use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use std::{io::BufRead, path::PathBuf};

#[derive(Parser)]
#[command(name = "troubadour", version, about = "Personal audio-playback daemon")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Become the playback server; fails if one is already running
    Start,
    /// Toggle play/pause on the running server
    Play,
    /// Halt playback
    Stop,
    /// Advance the queue and play
    Next,
    /// Step back through history, or restart the current track
    Prev,
    /// Replay the current track from its start
    Rewind,
    /// Queue tracks by catalog id; `all` queues the last search's hits,
    /// no ids reads one id per stdin line
    Add { ids: Vec<String> },
    /// Queue random tracks from the catalog
    Random {
        #[arg(default_value_t = 1)]
        count: u32,
    },
    /// Scan directories into the catalog
    Index { dirs: Vec<PathBuf> },
    /// Full-text search over the catalog; results feed `add all`
    Search { terms: Vec<String> },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Start => Daemon::start(),
        Command::Play => send_one(Opcode::PlayPause),
        Command::Stop => send_one(Opcode::Stop),
        Command::Next => send_one(Opcode::Next),
        Command::Prev => send_one(Opcode::Prev),
        Command::Rewind => send_one(Opcode::Rewind),
        Command::Add { ids } => add(ids),
        Command::Random { count } => random(count),
        Command::Index { dirs } => index(dirs),
        Command::Search { terms } => search(terms),
    }
}

fn send_one(opcode: Opcode) -> Result<()> {
    ClientSocket::connect()?.send(Message::new(opcode))
}

fn add(args: Vec<String>) -> Result<()> {
    let ids = resolve_ids(args)?;
    ensure!(!ids.is_empty(), "nothing to queue");

    let client = ClientSocket::connect()?;
    for id in ids {
        client.send(Message::with_arg(Opcode::Add, id))?;
    }
    Ok(())
}

fn resolve_ids(args: Vec<String>) -> Result<Vec<i64>> {
    if args.len() == 1 && args[0] == "all" {
        return Database::open()?.saved_search_ids();
    }

    if args.is_empty() {
        let stdin = std::io::stdin();
        let mut ids = Vec::new();
        for line in stdin.lock().lines() {
            let line = line?;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                ids.push(parse_id(trimmed)?);
            }
        }
        return Ok(ids);
    }

    args.iter().map(|arg| parse_id(arg)).collect()
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .with_context(|| format!("not a track id: {raw}"))
}

fn random(count: u32) -> Result<()> {
    let db = Database::open()?;
    let client = ClientSocket::connect()?;
    for _ in 0..count {
        client.send(Message::with_arg(Opcode::Add, db.random_track()?))?;
    }
    Ok(())
}

fn index(dirs: Vec<PathBuf>) -> Result<()> {
    ensure!(!dirs.is_empty(), "nothing to index");

    let mut db = Database::open()?;
    let (indexed, skipped) = library::index_dirs(&mut db, &dirs)?;
    println!("indexed {indexed} tracks ({skipped} skipped)");
    Ok(())
}

fn search(terms: Vec<String>) -> Result<()> {
    ensure!(!terms.is_empty(), "no search terms");

    let mut db = Database::open()?;
    let hits = db.search(&terms.join(" "))?;
    if hits.is_empty() {
        println!("no matches");
        return Ok(());
    }

    for track in &hits {
        println!(
            "{:>6}  {} — {} ({}) [{}]",
            track.id,
            track.title,
            track.artist,
            track.album,
            track.duration_str(),
        );
    }
    println!("\nqueue these with: troubadour add all");
    Ok(())
}
