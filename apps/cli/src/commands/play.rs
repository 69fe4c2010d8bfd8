use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use console::style;
use deckcast_core::{
    LaunchParams, PlayerConfig, PlayerHandle, PlayerSnapshot, RecordingController,
    RecordingEvent, format_duration,
    narration::{AudioFileStrategy, Narrator},
    playback::{HeadlessProbe, PlaybackMode, PlaybackStatus, PlayerBuilder},
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
    task::JoinHandle,
};
use tracing::warn;

use super::open_deck;
use crate::backends::{EspeakSynthesizer, FfmpegCapture, FfplayOutput};

pub struct PlayArgs {
    pub script: String,
    pub lang: Option<String>,
    pub record: bool,
    pub autoplay: bool,
    pub capture: bool,
    pub output_dir: PathBuf,
}

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Play,
    Stop,
    Next,
    Previous,
    GoTo(usize),
    Language(String),
    ToggleRecording,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let mut parts = line.split_whitespace();
    let input = match parts.next()? {
        "p" | "play" => Input::Play,
        "s" | "stop" => Input::Stop,
        "n" | "next" => Input::Next,
        "b" | "back" => Input::Previous,
        // pages are 1-based at the prompt
        "g" | "go" => Input::GoTo(parts.next()?.parse::<usize>().ok()?.checked_sub(1)?),
        "l" | "lang" => Input::Language(parts.next()?.to_string()),
        "r" | "rec" => Input::ToggleRecording,
        "h" | "help" | "?" => Input::Help,
        "q" | "quit" | "exit" => Input::Quit,
        _ => return None,
    };
    Some(input)
}

fn print_help() {
    println!(
        "{}",
        style("p play · s stop · n next · b back · g N go to page · l LANG language · r record · q quit").dim()
    );
}

fn print_snapshot(snapshot: &PlayerSnapshot) {
    let status = match snapshot.status {
        PlaybackStatus::Idle => style("idle").dim(),
        PlaybackStatus::Playing => style("playing").green(),
        PlaybackStatus::Completed => style("completed").cyan(),
        PlaybackStatus::Stopped => style("stopped").yellow(),
    };
    let recording = if snapshot.recording {
        style(" ● REC").red().bold().to_string()
    } else {
        String::new()
    };
    println!(
        "{} page {}/{} {} {}{}",
        status,
        snapshot.page_number(),
        snapshot.page_count,
        style(&snapshot.language).yellow(),
        style(format!("[{}]", format_duration(snapshot.elapsed))).dim(),
        recording
    );
}

/// Whether two snapshots differ in anything worth printing.
fn changed(a: &PlayerSnapshot, b: &PlayerSnapshot) -> bool {
    a.status != b.status
        || a.page_index != b.page_index
        || a.recording != b.recording
        || a.language != b.language
}

fn spawn_saver(
    mut recordings: mpsc::UnboundedReceiver<RecordingEvent>,
    output_dir: PathBuf,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = recordings.recv().await {
            match event {
                RecordingEvent::Completed(artifact) => match artifact.save_to(&output_dir).await {
                    Ok(path) => println!(
                        "{} Recording saved: {} {}",
                        style("✓").green().bold(),
                        style(path.display()).cyan(),
                        style(format!("[{} bytes]", artifact.len())).dim()
                    ),
                    Err(e) => eprintln!("{} {}", style("Failed to save recording:").red().bold(), e),
                },
                RecordingEvent::Failed(e) => {
                    eprintln!("{} {}", style("Recording failed:").red().bold(), e)
                }
            }
        }
    })
}

async fn apply(player: &PlayerHandle, input: Input) -> Result<bool> {
    let result = match input {
        Input::Play => player.play().await,
        Input::Stop => player.stop().await,
        Input::Next => player.next().await.map(|_| ()),
        Input::Previous => player.previous().await.map(|_| ()),
        Input::GoTo(index) => player.go_to(index).await.map(|_| ()),
        Input::Language(language) => player.set_language(language).await,
        Input::ToggleRecording => {
            if player.snapshot().recording {
                player.stop_recording().await
            } else {
                player.start_recording().await
            }
        }
        Input::Help => {
            print_help();
            Ok(())
        }
        Input::Quit => return Ok(false),
    };

    if let Err(e) = result {
        println!("{} {}", style("!").yellow().bold(), e);
    }
    Ok(true)
}

pub async fn run(config: &PlayerConfig, args: PlayArgs) -> Result<()> {
    let deck = open_deck(&args.script, config).await?;

    let synthesizer = EspeakSynthesizer::detect().await;
    if synthesizer.is_none() {
        warn!("espeak-ng not found, only pre-rendered narration will play");
    }
    let params = LaunchParams {
        script: Some(deck.id().to_string()),
        autoplay: args.autoplay,
        recording: args.record,
    };
    let mode = PlaybackMode::detect(&HeadlessProbe::from_env(synthesizer.is_some()), &params);

    let output = Arc::new(FfplayOutput::new());
    let narrator = match synthesizer {
        Some(synthesizer) => Narrator::with_fallback(output, Arc::new(synthesizer)),
        None => Narrator::new(vec![Arc::new(AudioFileStrategy::new(output))]),
    };

    let mut builder = PlayerBuilder::new(Arc::clone(&deck.timeline))
        .mode(mode)
        .config(config.playback.clone())
        .narrator(Arc::new(narrator));
    if let Some(lang) = args.lang {
        builder = builder.language(lang);
    }

    let mut saver = None;
    if args.capture {
        let (recorder, recordings) = RecordingController::new(
            Arc::new(FfmpegCapture::from_env()),
            config.recording.clone(),
            deck.id(),
        );
        builder = builder.recorder(Arc::new(recorder));
        saver = Some(spawn_saver(recordings, args.output_dir));
    }

    let (player, task) = builder.spawn();
    println!("{}", style("─".repeat(60)).dim());
    print_help();

    let mut snapshots = player.subscribe();
    let mut last = snapshots.borrow_and_update().clone();
    print_snapshot(&last);

    let started = if params.recording {
        player.play_and_record().await
    } else if params.autoplay {
        player.play().await
    } else {
        Ok(())
    };
    if let Err(e) = started {
        println!("{} {}", style("!").yellow().bold(), e);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match parse_input(line) {
                    Some(input) => {
                        if !apply(&player, input).await? {
                            break;
                        }
                    }
                    None => print_help(),
                }
            }
            update = snapshots.changed() => {
                if update.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if changed(&last, &snapshot) {
                    print_snapshot(&snapshot);
                    last = snapshot;
                }
            }
        }
    }

    player.shutdown();
    task.await?;
    // the recorder is dropped with the player, which closes the channel
    if let Some(saver) = saver {
        saver.await?;
    }
    Ok(())
}
