pub mod list;
pub mod plan;
pub mod play;
pub mod record;

use anyhow::Result;
use console::style;
use deckcast_core::{Deck, PlayerConfig};

use crate::create_spinner;

/// Load a deck behind a spinner.
pub(crate) async fn open_deck(identifier: &str, config: &PlayerConfig) -> Result<Deck> {
    let spinner = create_spinner(&format!("Loading {identifier}..."));
    match Deck::open(identifier, config).await {
        Ok(deck) => {
            spinner.finish_with_message(format!(
                "{} Loaded {} {}",
                style("✓").green().bold(),
                style(deck.timeline.title()).bold(),
                style(format!("[{} pages]", deck.timeline.len())).dim()
            ));
            Ok(deck)
        }
        Err(e) => {
            spinner.finish_with_message(format!("{} Failed to load {identifier}", style("✗").red().bold()));
            Err(e.into())
        }
    }
}
