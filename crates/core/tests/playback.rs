mod support;

use std::{sync::Arc, time::Duration};

use deckcast_core::{
    narration::Narrator,
    playback::{
        PlaybackError, PlaybackMode, PlaybackStatus, PlayerBuilder, PlayerHandle, SignalBoard,
    },
    recording::{CaptureSettings, RecordingController, RecordingError, RecordingEvent},
    timeline::PageTimeline,
};
use serde_json::json;
use support::{
    FakeCapture, FakeSynth, Progress, SynthBehavior, TimedSink, assert_near, timeline,
    timeline_from,
};

async fn wait_for_status(player: &PlayerHandle, status: PlaybackStatus) {
    let mut snapshots = player.subscribe();
    snapshots
        .wait_for(|s| s.status == status)
        .await
        .expect("player went away");
}

fn mixed_timeline() -> Arc<PageTimeline> {
    timeline_from(vec![
        json!({ "id": "intro", "duration": 2, "read_srt": "Welcome" }),
        json!({
            "id": "trend",
            "content": [
                { "type": "line", "showtime": 1 },
                { "type": "bar", "showtime": 2 },
            ],
        }),
        json!({ "id": "outro", "read_srt": "Bye" }),
    ])
}

#[tokio::test(start_paused = true)]
async fn automated_run_follows_computed_durations() {
    let synth = Arc::new(FakeSynth::speaking(100));
    let sink = Arc::new(TimedSink::new());
    let (player, _task) = PlayerBuilder::new(mixed_timeline())
        .mode(PlaybackMode::Automated)
        .narrator(Arc::new(Narrator::synthesis_only(synth.clone())))
        .progress(sink.clone())
        .spawn();

    player.play().await.unwrap();
    wait_for_status(&player, PlaybackStatus::Completed).await;

    let times = sink.page_times();
    assert_eq!(times.iter().map(|(n, _)| *n).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_near(times[0].1, 0);
    assert_near(times[1].1, 2_100);
    assert_near(times[2].1, 5_200);

    let completions = sink.completions();
    assert_eq!(completions.len(), 1);
    assert_near(completions[0], 7_300);

    assert!(synth.calls().is_empty());
    let snapshot = player.snapshot();
    assert_eq!(snapshot.page_index, 2);
    assert!(!snapshot.is_playing());
}

#[tokio::test(start_paused = true)]
async fn automated_runs_are_reproducible() {
    let mut runs = Vec::new();
    for _ in 0..2 {
        let sink = Arc::new(TimedSink::new());
        let (player, _task) = PlayerBuilder::new(mixed_timeline())
            .mode(PlaybackMode::Automated)
            .progress(sink.clone())
            .spawn();
        player.play().await.unwrap();
        wait_for_status(&player, PlaybackStatus::Completed).await;
        runs.push(sink.events());
    }
    assert_eq!(runs[0], runs[1]);
}

#[tokio::test(start_paused = true)]
async fn narration_ending_early_advances_the_page() {
    let synth = Arc::new(FakeSynth::speaking(1_000));
    let sink = Arc::new(TimedSink::new());
    let (player, _task) = PlayerBuilder::new(timeline(&[2.0, 2.0]))
        .narrator(Arc::new(Narrator::synthesis_only(synth.clone())))
        .progress(sink.clone())
        .spawn();

    player.play().await.unwrap();
    wait_for_status(&player, PlaybackStatus::Completed).await;

    let times = sink.page_times();
    assert_near(times[1].1, 1_100);
    assert_near(sink.completions()[0], 2_200);

    let spoken: Vec<_> = synth.calls().into_iter().map(|c| c.text).collect();
    assert_eq!(spoken, vec!["Page 0", "Page 1"]);
    assert_eq!(synth.calls()[0].language, "en-US");
}

#[tokio::test(start_paused = true)]
async fn silent_cover_page_keeps_its_duration() {
    let synth = Arc::new(FakeSynth::speaking(100));
    let sink = Arc::new(TimedSink::new());
    let deck = timeline_from(vec![
        json!({ "id": "cover", "layout": "cover", "duration": 5 }),
        json!({ "id": "body", "duration": 5, "read_srt": "Findings" }),
    ]);
    let (player, _task) = PlayerBuilder::new(deck)
        .narrator(Arc::new(Narrator::synthesis_only(synth.clone())))
        .progress(sink.clone())
        .spawn();

    player.play().await.unwrap();
    wait_for_status(&player, PlaybackStatus::Completed).await;

    let times = sink.page_times();
    assert_eq!(times.iter().map(|(n, _)| *n).collect::<Vec<_>>(), vec![1, 2]);
    assert_near(times[1].1, 5_100);
    // the body page still ends when its narration does
    assert_near(sink.completions()[0], 5_300);

    let spoken: Vec<_> = synth.calls().into_iter().map(|c| c.text).collect();
    assert_eq!(spoken, vec!["Findings"]);
}

#[tokio::test(start_paused = true)]
async fn page_timer_cuts_off_slow_narration() {
    let synth = Arc::new(FakeSynth::speaking(10_000));
    let sink = Arc::new(TimedSink::new());
    let (player, _task) = PlayerBuilder::new(timeline(&[1.0, 1.0, 1.0]))
        .narrator(Arc::new(Narrator::synthesis_only(synth.clone())))
        .progress(sink.clone())
        .spawn();

    player.play().await.unwrap();
    wait_for_status(&player, PlaybackStatus::Completed).await;

    let times = sink.page_times();
    assert_near(times[1].1, 1_100);
    assert_near(times[2].1, 2_200);
    assert_eq!(synth.calls().len(), 3);
    assert_eq!(synth.max_active(), 1);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(synth.active(), 0);
}

#[tokio::test(start_paused = true)]
async fn narration_failure_signals_completion_and_moves_on() {
    let synth = Arc::new(FakeSynth::new(SynthBehavior::Fail));
    let sink = Arc::new(TimedSink::new());
    let (player, _task) = PlayerBuilder::new(timeline(&[5.0, 5.0]))
        .narrator(Arc::new(Narrator::synthesis_only(synth.clone())))
        .progress(sink.clone())
        .spawn();

    player.play().await.unwrap();
    wait_for_status(&player, PlaybackStatus::Completed).await;

    assert_eq!(sink.pages(), vec![1, 2]);
    let completions = sink.completions();
    assert_eq!(completions.len(), 1);
    assert_near(completions[0], 100);
    assert_eq!(synth.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_everything_mid_session() {
    let synth = Arc::new(FakeSynth::speaking(10_000));
    let board = Arc::new(SignalBoard::new());
    let (recorder, mut recordings) = RecordingController::new(
        Arc::new(FakeCapture::new()),
        CaptureSettings::default(),
        "unused",
    );
    let (player, _task) = PlayerBuilder::new(timeline(&[1.0; 5]))
        .narrator(Arc::new(Narrator::synthesis_only(synth.clone())))
        .recorder(Arc::new(recorder))
        .progress(board.clone())
        .spawn();

    player.play_and_record().await.unwrap();
    assert!(player.snapshot().recording);

    // recording settle (500ms) plus one page
    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(board.current_page(), 2);

    player.stop().await.unwrap();
    let snapshot = player.snapshot();
    assert_eq!(snapshot.status, PlaybackStatus::Stopped);
    assert_eq!(snapshot.page_index, 1);
    assert!(board.playback_completed());

    let Some(RecordingEvent::Completed(artifact)) = recordings.recv().await else {
        panic!("expected the recording to finalize");
    };
    assert_eq!(artifact.label, "deck");

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(board.current_page(), 2);
    assert_eq!(player.snapshot().page_index, 1);
    assert_eq!(synth.active(), 0);
    assert!(recordings.try_recv().is_err());
    assert_eq!(board.completion_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn navigation_replaces_the_pending_page_timer() {
    let sink = Arc::new(TimedSink::new());
    let (player, _task) = PlayerBuilder::new(timeline(&[1.0; 4]))
        .mode(PlaybackMode::Automated)
        .progress(sink.clone())
        .spawn();

    player.play().await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(player.go_to(2).await.unwrap(), 2);
    wait_for_status(&player, PlaybackStatus::Completed).await;

    assert_eq!(sink.pages(), vec![1, 3, 4]);
    let times = sink.page_times();
    assert_near(times[1].1, 500);
    assert_near(times[2].1, 1_600);
}

#[tokio::test(start_paused = true)]
async fn out_of_range_navigation_is_ignored() {
    let (player, _task) = PlayerBuilder::new(timeline(&[1.0, 1.0]))
        .mode(PlaybackMode::Automated)
        .spawn();

    assert_eq!(player.previous().await.unwrap(), 0);
    assert_eq!(player.go_to(7).await.unwrap(), 0);
    assert_eq!(player.next().await.unwrap(), 1);
    assert_eq!(player.next().await.unwrap(), 1);
    assert_eq!(player.snapshot().status, PlaybackStatus::Idle);

    // play resumes from the selected page
    player.play().await.unwrap();
    assert_eq!(player.snapshot().page_index, 1);
}

#[tokio::test(start_paused = true)]
async fn language_is_locked_while_playing() {
    let synth = Arc::new(FakeSynth::speaking(100));
    let (player, _task) = PlayerBuilder::new(timeline(&[5.0]))
        .narrator(Arc::new(Narrator::synthesis_only(synth.clone())))
        .spawn();

    player.set_language("zh-CN").await.unwrap();
    assert_eq!(player.snapshot().language, "zh-CN");

    player.play().await.unwrap();
    assert!(matches!(
        player.set_language("en-US").await,
        Err(PlaybackError::LanguageLocked)
    ));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(synth.calls()[0].language, "zh-CN");
    assert_eq!(synth.calls()[0].voice.as_deref(), Some("cmn"));

    player.stop().await.unwrap();
    player.set_language("en-US").await.unwrap();
    assert_eq!(player.snapshot().language, "en-US");
}

#[tokio::test(start_paused = true)]
async fn completion_stops_an_auto_started_recording() {
    let (recorder, mut recordings) =
        RecordingController::new(Arc::new(FakeCapture::new()), CaptureSettings::default(), "x");
    let recorder = Arc::new(recorder);
    let (player, _task) = PlayerBuilder::new(timeline(&[1.0, 1.0]))
        .mode(PlaybackMode::Automated)
        .recorder(recorder.clone())
        .spawn();

    player.play_and_record().await.unwrap();
    wait_for_status(&player, PlaybackStatus::Completed).await;

    assert!(matches!(
        recordings.recv().await,
        Some(RecordingEvent::Completed(_))
    ));
    assert!(!recorder.is_recording());
}

#[tokio::test(start_paused = true)]
async fn completion_leaves_a_manual_recording_running() {
    let (recorder, mut recordings) =
        RecordingController::new(Arc::new(FakeCapture::new()), CaptureSettings::default(), "x");
    let recorder = Arc::new(recorder);
    let (player, _task) = PlayerBuilder::new(timeline(&[1.0, 1.0]))
        .mode(PlaybackMode::Automated)
        .recorder(recorder.clone())
        .spawn();

    player.start_recording().await.unwrap();
    player.play().await.unwrap();
    assert!(matches!(
        player.start_recording().await,
        Err(PlaybackError::RecordingLocked)
    ));
    wait_for_status(&player, PlaybackStatus::Completed).await;

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(recorder.is_recording());
    assert!(recordings.try_recv().is_err());

    player.stop_recording().await.unwrap();
    assert!(matches!(
        recordings.recv().await,
        Some(RecordingEvent::Completed(_))
    ));
    assert!(!recorder.is_recording());
}

#[tokio::test(start_paused = true)]
async fn shutdown_tears_the_session_down() {
    let synth = Arc::new(FakeSynth::speaking(10_000));
    let (recorder, mut recordings) =
        RecordingController::new(Arc::new(FakeCapture::new()), CaptureSettings::default(), "x");
    let (player, task) = PlayerBuilder::new(timeline(&[30.0, 30.0]))
        .narrator(Arc::new(Narrator::synthesis_only(synth.clone())))
        .recorder(Arc::new(recorder))
        .spawn();

    player.play_and_record().await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(synth.active(), 1);

    player.shutdown();
    task.await.unwrap();

    assert_eq!(player.snapshot().status, PlaybackStatus::Stopped);
    assert!(matches!(
        recordings.recv().await,
        Some(RecordingEvent::Completed(_))
    ));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(synth.active(), 0);
    assert!(matches!(player.play().await, Err(PlaybackError::Closed)));
}

#[tokio::test(start_paused = true)]
async fn loading_a_new_script_resets_the_player() {
    let sink = Arc::new(TimedSink::new());
    let (player, _task) = PlayerBuilder::new(timeline(&[1.0, 1.0, 1.0]))
        .mode(PlaybackMode::Automated)
        .progress(sink.clone())
        .spawn();

    player.play().await.unwrap();
    tokio::time::sleep(Duration::from_millis(1_500)).await;

    let replacement = timeline_from(vec![json!({ "id": "only", "duration": 1, "read_srt": "Solo" })]);
    player.load_timeline(replacement).await.unwrap();

    let snapshot = player.snapshot();
    assert_eq!(snapshot.status, PlaybackStatus::Idle);
    assert_eq!(snapshot.page_index, 0);
    assert_eq!(snapshot.page_count, 1);
    assert_eq!(snapshot.session, None);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(sink.pages(), vec![1, 2]);

    player.play().await.unwrap();
    wait_for_status(&player, PlaybackStatus::Completed).await;
    assert_eq!(sink.pages(), vec![1, 2, 1]);
    assert_eq!(
        sink.events()
            .into_iter()
            .filter(|(_, e)| *e == Progress::Session)
            .count(),
        2
    );
}

#[tokio::test(start_paused = true)]
async fn rejected_play_requests_leave_the_player_idle() {
    let (player, _task) = PlayerBuilder::new(timeline_from(vec![]))
        .mode(PlaybackMode::Automated)
        .spawn();
    assert!(matches!(player.play().await, Err(PlaybackError::EmptyTimeline)));

    let board = Arc::new(SignalBoard::new());
    let (player, _task) = PlayerBuilder::new(timeline(&[1.0]))
        .mode(PlaybackMode::Automated)
        .progress(board.clone())
        .spawn();
    assert!(matches!(
        player.play_and_record().await,
        Err(PlaybackError::NoRecorder)
    ));
    assert_eq!(player.snapshot().status, PlaybackStatus::Idle);

    player.play().await.unwrap();
    assert!(matches!(player.play().await, Err(PlaybackError::AlreadyPlaying)));

    let (recorder, _recordings) = RecordingController::new(
        Arc::new(FakeCapture::denied()),
        CaptureSettings::default(),
        "x",
    );
    let board = Arc::new(SignalBoard::new());
    let (player, _task) = PlayerBuilder::new(timeline(&[1.0]))
        .mode(PlaybackMode::Automated)
        .recorder(Arc::new(recorder))
        .progress(board.clone())
        .spawn();
    assert!(matches!(
        player.play_and_record().await,
        Err(PlaybackError::Recording(RecordingError::PermissionDenied(_)))
    ));
    let snapshot = player.snapshot();
    assert_eq!(snapshot.status, PlaybackStatus::Idle);
    assert!(!snapshot.recording);
    assert_eq!(board.session(), None);
    assert_eq!(board.current_page(), 0);
}
