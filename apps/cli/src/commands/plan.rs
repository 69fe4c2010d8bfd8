use anyhow::Result;
use console::style;
use deckcast_core::{
    PlayerConfig, completion_deadline, expected_runtime, format_duration, format_timeline,
    format_validation_report,
};

use super::open_deck;

pub async fn run(config: &PlayerConfig, script: &str) -> Result<()> {
    let deck = open_deck(script, config).await?;

    println!("{}", style("─".repeat(60)).dim());
    print!("{}", format_validation_report(&deck.loaded.report));
    println!("{}", style("─".repeat(60)).dim());
    print!("{}", format_timeline(&deck.timeline));

    let expected = expected_runtime(&deck.timeline, &config.playback, true);
    let deadline = completion_deadline(
        expected,
        config.automation.buffer(),
        config.automation.max_wait(),
    );
    println!(
        "\n{} {}   {} {}\n",
        style("Runtime:").dim(),
        style(format_duration(expected)).cyan().bold(),
        style("Recording deadline:").dim(),
        style(format_duration(deadline)).cyan()
    );

    Ok(())
}
