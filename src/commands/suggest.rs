use chrono::NaiveDate;
use clap::Args;

use itinera::config::Config;
use itinera::suggest::SuggestionClient;

use super::{open_target, AppController, OutputFormat};

/// Ask the generation API for activity ideas
#[derive(Args)]
pub struct SuggestCommand {
    /// Trip ID or share URL
    target: String,

    /// What you are into, e.g. "temples, street food"
    #[arg(long)]
    interests: String,

    /// Add the suggestions to this day (YYYY-MM-DD)
    #[arg(long)]
    accept: Option<NaiveDate>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl SuggestCommand {
    pub async fn run(
        &self,
        controller: &mut AppController,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let client = SuggestionClient::from_config(&config.suggest);
        if !client.is_enabled() {
            return Err("No API key configured. Set ITINERA_API_KEY or suggest.api_key.".into());
        }

        open_target(controller, &self.target).await?;
        let Some(trip) = controller.current_trip() else {
            return Err(format!("Trip not found: {}", self.target).into());
        };
        let destination = trip.destination.clone();

        let suggestions = client.suggest(&destination, &self.interests).await;
        if suggestions.is_empty() {
            println!("No suggestions");
            return Ok(());
        }

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&suggestions)?);
            }
            OutputFormat::Text => {
                println!("Suggestions for {}:", destination);
                for item in &suggestions {
                    println!("  {}", item);
                }
            }
        }

        if let Some(date) = self.accept {
            let count = suggestions.len();
            controller
                .edit(|editor| editor.add_suggested_items(date, suggestions))
                .await?;
            println!("Added {} suggestion(s) to {}", count, date);
        }
        Ok(())
    }
}
