use std::{path::PathBuf, sync::Arc, time::Instant};

use anyhow::Result;
use console::style;
use deckcast_core::{
    AutomationDriver, LaunchParams, PlayerConfig, RecordingController, SignalBoard,
    completion_deadline, expected_runtime, format_duration,
    playback::{HeadlessProbe, PlaybackMode, PlayerBuilder},
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::open_deck;
use crate::backends::FfmpegCapture;

pub struct RecordArgs {
    pub script: String,
    pub lang: Option<String>,
    pub capture: bool,
    pub output_dir: PathBuf,
}

fn create_page_bar(pages: usize) -> ProgressBar {
    let pb = ProgressBar::new(pages as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/dim}] page {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("━╸ "),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}

pub async fn run(config: &PlayerConfig, args: RecordArgs) -> Result<()> {
    let deck = open_deck(&args.script, config).await?;
    let total_start = Instant::now();

    let params = LaunchParams::for_recording(deck.id());
    let mode = PlaybackMode::detect(&HeadlessProbe::from_env(false), &params);
    info!(mode = ?mode, launch = %params.to_query(), "launching unattended run");

    let board = Arc::new(SignalBoard::new());
    let mut builder = PlayerBuilder::new(Arc::clone(&deck.timeline))
        .mode(mode)
        .config(config.playback.clone())
        .progress(board.clone());
    if let Some(lang) = args.lang {
        builder = builder.language(lang);
    }

    let mut recordings = None;
    if args.capture {
        let (recorder, events) = RecordingController::new(
            Arc::new(FfmpegCapture::from_env()),
            config.recording.clone(),
            deck.id(),
        );
        builder = builder.recorder(Arc::new(recorder));
        recordings = Some(events);
    }
    let (player, task) = builder.spawn();

    let expected = expected_runtime(&deck.timeline, &config.playback, args.capture);
    let deadline = completion_deadline(
        expected,
        config.automation.buffer(),
        config.automation.max_wait(),
    );
    println!(
        "{} Recording {} {}",
        style("●").red().bold(),
        style(deck.id()).bold(),
        style(format!(
            "[runtime {}, deadline {}]",
            format_duration(expected),
            format_duration(deadline)
        ))
        .dim()
    );

    let pb = create_page_bar(deck.timeline.len());
    let driver = AutomationDriver::new(config.automation.clone(), &args.output_dir)
        .playback(config.playback.clone());
    let outcome = driver
        .run(&player, &board, &deck.timeline, recordings.as_mut(), |progress| {
            pb.set_position(progress.page as u64);
            pb.set_message(format_duration(progress.elapsed));
        })
        .await;
    pb.finish_and_clear();

    player.shutdown();
    task.await?;
    let report = outcome?;

    let status = if report.completed {
        style("✓").green().bold()
    } else {
        style("!").yellow().bold()
    };
    println!(
        "{} Played {}/{} pages {}",
        status,
        report.last_page,
        report.page_count,
        style(format!("[{}]", format_duration(report.elapsed))).dim()
    );
    if report.timed_out {
        println!(
            "{} Playback did not finish within {}",
            style("!").yellow().bold(),
            format_duration(report.deadline)
        );
    }

    if let Some(path) = &report.artifact {
        println!(
            "\n{} {} {}",
            style("Saved:").dim(),
            style(path.display()).cyan(),
            style(format!("[{} bytes]", report.artifact_bytes)).dim()
        );
    }

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    Ok(())
}
