use anyhow::{Result, bail};
use console::style;
use deckcast_core::{PageTimeline, PlayerConfig, ScriptSource, format_duration};

pub async fn run(config: &PlayerConfig, check: bool) -> Result<()> {
    let scripts_dir = &config.paths.scripts_dir;
    let entries = ScriptSource::list(scripts_dir).await?;
    if entries.is_empty() {
        println!(
            "{} No scripts in {}",
            style("!").yellow().bold(),
            style(scripts_dir.display()).cyan()
        );
        return Ok(());
    }

    println!(
        "{} {} script(s) in {}\n",
        style("●").cyan().bold(),
        entries.len(),
        style(scripts_dir.display()).dim()
    );

    let mut failed = 0;
    for (i, entry) in entries.iter().enumerate() {
        if !check {
            println!("  {:>2}. {}", i + 1, style(&entry.name).bold());
            continue;
        }

        match ScriptSource::File(entry.path.clone()).load().await {
            Ok(loaded) => {
                let timeline =
                    PageTimeline::from_loaded(&loaded, &config.paths.audio_dir, &config.durations);
                println!(
                    "  {:>2}. {} {} {}",
                    i + 1,
                    style("✓").green().bold(),
                    style(&entry.name).bold(),
                    style(format!(
                        "[{} pages, {}, {} warning(s)]",
                        timeline.len(),
                        format_duration(timeline.total_duration()),
                        loaded.report.warnings.len()
                    ))
                    .dim()
                );
            }
            Err(e) => {
                failed += 1;
                println!(
                    "  {:>2}. {} {}\n{}",
                    i + 1,
                    style("✗").red().bold(),
                    style(&entry.name).bold(),
                    style(e).red()
                );
            }
        }
    }

    if check {
        println!(
            "\n{} {}/{} passed\n",
            style("Validation:").dim(),
            entries.len() - failed,
            entries.len()
        );
        if failed > 0 {
            bail!("{failed} script(s) failed validation");
        }
    }
    Ok(())
}
