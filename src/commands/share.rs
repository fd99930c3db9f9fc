use clap::Args;

use itinera::config::Config;
use itinera::share::{encode, share_url};

use super::AppController;

/// Print a link that shares a trip
#[derive(Args)]
pub struct ShareCommand {
    /// Trip ID
    id: String,

    /// Embed a read-only copy in the link instead of publishing it
    #[arg(long)]
    snapshot: bool,
}

impl ShareCommand {
    pub async fn run(
        &self,
        controller: &AppController,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let Some(trip) = controller.trips().get(&self.id) else {
            return Err(format!("Trip not found: {}", self.id).into());
        };

        let token = if self.snapshot {
            encode(trip)?
        } else {
            controller.publish(&trip.id).await?;
            trip.id.clone()
        };

        println!("{}", share_url(&config.share_base_url.value, &token));
        Ok(())
    }
}
