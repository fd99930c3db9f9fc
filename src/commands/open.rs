use clap::Args;

use itinera::controller::{SharedTrip, View};
use itinera::share::parse_fragment;

use super::{open_target, AppController, OutputFormat};

/// Open a share link
#[derive(Args)]
pub struct OpenCommand {
    /// Share URL or `#/share/<token>` fragment
    url: String,

    /// Keep printing the trip whenever it changes (shared trips only)
    #[arg(long, short)]
    watch: bool,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl OpenCommand {
    pub async fn run(
        &self,
        controller: &mut AppController,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if parse_fragment(&self.url).is_none() {
            return Err(format!("Not a share link: {}", self.url).into());
        }

        open_target(controller, &self.url).await?;
        self.print(controller)?;

        if !self.watch {
            return Ok(());
        }
        if !matches!(controller.view(), View::Shared(SharedTrip::Remote { .. })) {
            println!("Snapshot links do not change; nothing to watch.");
            return Ok(());
        }

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                _ = controller.wait_remote_update() => self.print(controller)?,
            }
        }

        controller.back();
        Ok(())
    }

    fn print(&self, controller: &AppController) -> Result<(), Box<dyn std::error::Error>> {
        let Some(trip) = controller.current_trip() else {
            println!("Shared trip was removed");
            return Ok(());
        };

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(trip)?),
            OutputFormat::Text => {
                println!("{}", trip);
                if controller.is_read_only() {
                    println!("(read-only shared snapshot)");
                }
            }
        }
        Ok(())
    }
}
