use chrono::NaiveDate;
use clap::{Args, Subcommand};
use std::io::{self, Write};

use itinera::models::Trip;

use super::{open_target, AppController, OutputFormat};

#[derive(Args)]
pub struct TripCommand {
    #[command(subcommand)]
    pub command: TripSubcommand,
}

#[derive(Subcommand)]
pub enum TripSubcommand {
    /// Create a new trip
    Create {
        /// Title of the trip
        title: String,

        /// Where the trip goes
        #[arg(long)]
        destination: String,

        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
    },

    /// List all trips
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a trip's itinerary
    Show {
        /// Trip ID or share URL
        target: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a trip
    Delete {
        /// Trip ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Replace a trip's memo
    Memo {
        /// Trip ID or share URL
        target: String,

        /// New memo text
        text: String,
    },
}

impl TripCommand {
    pub async fn run(
        &self,
        controller: &mut AppController,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            TripSubcommand::Create {
                title,
                destination,
                start,
                end,
            } => {
                let trip = Trip::new(title.trim(), destination.trim(), *start, *end)?;

                if !controller.add_trip(trip.clone()) {
                    return Err(format!("Trip already exists: {}", trip.id).into());
                }
                println!("Created trip {}:", trip.id);
                println!("{}", trip);
                Ok(())
            }

            TripSubcommand::List { format } => {
                let trips = controller.trips();

                if trips.is_empty() {
                    println!("No trips found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(trips)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<15}  {:<24}  {:<16}  {:<23}  ITEMS",
                            "ID", "TITLE", "DESTINATION", "DATES"
                        );
                        println!("{}", "-".repeat(90));
                        for trip in trips.iter() {
                            println!(
                                "{:<15}  {:<24}  {:<16}  {} - {}  {}",
                                trip.id,
                                truncate(&trip.title, 24),
                                truncate(&trip.destination, 16),
                                trip.start_date,
                                trip.end_date,
                                trip.item_count()
                            );
                        }
                        println!("\nTotal: {} trip(s)", trips.len());
                    }
                }
                Ok(())
            }

            TripSubcommand::Show { target, format } => {
                open_target(controller, target).await?;
                let Some(trip) = controller.current_trip() else {
                    return Err(format!("Trip not found: {}", target).into());
                };

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(trip)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", trip);
                        if controller.is_read_only() {
                            println!("(read-only shared snapshot)");
                        }
                    }
                }
                Ok(())
            }

            TripSubcommand::Delete { id, force } => {
                let Some(trip) = controller.trips().get(id) else {
                    return Err(format!("Trip not found: {}", id).into());
                };
                let title = trip.title.clone();

                // Confirm deletion unless --force is used
                if !force {
                    print!("Delete trip '{}'? [y/N] ", title);
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                controller.delete_trip(id);
                println!("Deleted trip: {}", title);
                Ok(())
            }

            TripSubcommand::Memo { target, text } => {
                open_target(controller, target).await?;
                let updated = controller.edit(|editor| editor.set_memo(text.as_str())).await?;
                println!("Updated memo for '{}'", updated.title);
                Ok(())
            }
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Kyoto", 10), "Kyoto");
        assert_eq!(truncate("Autumn leaves in Kyoto", 10), "Autumn ...");
        assert_eq!(truncate("京都の紅葉を見に行く旅", 8), "京都の紅葉...");
    }
}
