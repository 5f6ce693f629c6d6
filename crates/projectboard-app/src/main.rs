//! Command-line driver: opens a project's whiteboard from a local table
//! store, replays key chords against it and saves the result.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use projectboard_core::storage::Backend;
use projectboard_core::{
    FileBackend, KeyEvent, KeyOutcome, LoadOutcome, Modifiers, SaveOutcome, SessionConfig,
    ShortcutRegistry, WhiteboardSession,
};

/// Project whiteboard engine
#[derive(Parser, Debug)]
#[command(name = "projectboard")]
#[command(version, about, long_about = None)]
struct Args {
    /// Project whose whiteboard to open
    #[arg(long, value_name = "ID", required_unless_present = "list_shortcuts")]
    project: Option<String>,

    /// Directory holding the table files
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Session settings (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the keyboard shortcuts and exit
    #[arg(long)]
    list_shortcuts: bool,

    /// Key chords to replay, e.g. `r s ctrl+z ctrl+s`
    #[arg(value_name = "KEY")]
    keys: Vec<String>,
}

/// Totals from a replayed script.
#[derive(Debug, Default, PartialEq, Eq)]
struct ReplaySummary {
    handled: usize,
    ignored: usize,
    saves: usize,
}

/// Feed chords to the session, ticking after each one so deferred edit
/// focus resolves the way a frame loop would.
async fn replay<B: Backend>(
    session: &mut WhiteboardSession<B>,
    chords: &[String],
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    for chord in chords {
        let (modifiers, key) = Modifiers::parse_chord(chord);
        match session.handle_key_event(&KeyEvent::Pressed(key), modifiers) {
            KeyOutcome::Handled(command) => {
                log::debug!("{} -> {:?}", chord, command);
                summary.handled += 1;
            }
            KeyOutcome::SaveRequested => {
                let outcome = session.save().await.context("save failed")?;
                log::info!("{} -> {:?}", chord, outcome);
                summary.saves += 1;
            }
            KeyOutcome::Ignored => {
                log::debug!("{} ignored", chord);
                summary.ignored += 1;
            }
        }
        session.tick();
    }
    Ok(summary)
}

async fn run(args: Args, project: String) -> Result<()> {
    let config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    let backend = match args.data_dir {
        Some(dir) => FileBackend::new(dir)?,
        None => FileBackend::default_location()?,
    };
    log::info!("Using table store at {}", backend.base_path().display());

    let mut session = WhiteboardSession::new(config, std::sync::Arc::new(backend));
    match session.load(&project).await {
        Ok(LoadOutcome::Loaded) => println!("Loaded whiteboard for {}", project),
        Ok(_) => println!("Started {} from the section template", project),
        Err(e) => log::warn!("Continuing with template after load failure: {}", e),
    }

    let summary = replay(&mut session, &args.keys).await?;
    if session.has_unsaved_changes() {
        let outcome = session.save().await.context("final save failed")?;
        if outcome == SaveOutcome::Saved {
            println!("Saved whiteboard for {}", project);
        }
    }
    session.dispose();

    println!(
        "{} objects, {} keys handled, {} ignored, {} saves",
        session.surface().len(),
        summary.handled,
        summary.ignored,
        summary.saves
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_shortcuts {
        print!("{}", ShortcutRegistry::describe());
        return Ok(());
    }
    let project = args
        .project
        .clone()
        .context("--project is required")?;

    log::info!("Starting ProjectBoard");
    pollster::block_on(run(args, project))
}

#[cfg(test)]
mod tests {
    use super::*;
    use projectboard_core::MemoryBackend;
    use std::sync::Arc;

    fn chords(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_replay_counts() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = WhiteboardSession::new(SessionConfig::default(), backend);
        pollster::block_on(session.load("p1")).unwrap();
        let before = session.surface().len();

        let summary =
            pollster::block_on(replay(&mut session, &chords(&["r", "c", "ctrl+z", "ctrl+s"])))
                .unwrap();
        assert_eq!(
            summary,
            ReplaySummary {
                handled: 3,
                ignored: 0,
                saves: 1
            }
        );
        assert_eq!(session.surface().len(), before + 1);
        assert!(!session.has_unsaved_changes());
    }

    #[test]
    fn test_sticky_note_swallows_typing() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = WhiteboardSession::new(SessionConfig::default(), backend);
        let summary = pollster::block_on(replay(&mut session, &chords(&["s", "r", "escape", "r"])))
            .unwrap();
        assert_eq!(summary.ignored, 1);
        assert_eq!(session.surface().len(), 2);
    }

    #[test]
    fn test_file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let open = || {
            let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();
            WhiteboardSession::new(SessionConfig::default(), Arc::new(backend))
        };

        let mut first = open();
        pollster::block_on(first.load("p1")).unwrap();
        pollster::block_on(replay(&mut first, &chords(&["t"]))).unwrap();
        assert_eq!(pollster::block_on(first.save()).unwrap(), SaveOutcome::Saved);
        let saved = first.surface().len();

        let mut second = open();
        assert_eq!(
            pollster::block_on(second.load("p1")).unwrap(),
            LoadOutcome::Loaded
        );
        assert_eq!(second.surface().len(), saved);
    }
}
