use chrono::NaiveDate;
use clap::{Args, Subcommand};

use itinera::editor::NewItem;

use super::{open_target, AppController};

#[derive(Args)]
pub struct ItemCommand {
    #[command(subcommand)]
    pub command: ItemSubcommand,
}

#[derive(Subcommand)]
pub enum ItemSubcommand {
    /// Add an activity to a day
    Add {
        /// Trip ID or share URL
        target: String,

        /// Day of the trip (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Time of day (HH:MM)
        #[arg(long)]
        time: String,

        /// What happens
        #[arg(long)]
        title: String,

        /// Details
        #[arg(long)]
        description: Option<String>,

        /// Related URL
        #[arg(long)]
        link: Option<String>,
    },

    /// Remove an activity from a day
    Delete {
        /// Trip ID or share URL
        target: String,

        /// Day of the trip (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Item ID
        item_id: String,
    },
}

impl ItemCommand {
    pub async fn run(
        &self,
        controller: &mut AppController,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ItemSubcommand::Add {
                target,
                date,
                time,
                title,
                description,
                link,
            } => {
                open_target(controller, target).await?;

                let mut item = NewItem::new(time.as_str(), title.as_str());
                if let Some(description) = description {
                    item = item.with_description(description.as_str());
                }
                if let Some(link) = link {
                    item = item.with_link(link.as_str());
                }

                let updated = controller
                    .edit(|editor| editor.add_item(*date, item))
                    .await?;

                println!("Added to {} on {}:", updated.title, date);
                if let Some(day) = updated.day(*date) {
                    for item in &day.items {
                        println!("  [{}] {}", item.id, item);
                    }
                }
                Ok(())
            }

            ItemSubcommand::Delete {
                target,
                date,
                item_id,
            } => {
                open_target(controller, target).await?;

                let updated = controller
                    .edit(|editor| editor.delete_item(*date, item_id))
                    .await?;

                println!("Removed item {} from {} on {}", item_id, updated.title, date);
                Ok(())
            }
        }
    }
}
