mod config_cmd;
mod item;
mod open;
mod share;
mod suggest;
mod trip;

pub use config_cmd::ConfigCommand;
pub use item::ItemCommand;
pub use open::OpenCommand;
pub use share::ShareCommand;
pub use suggest::SuggestCommand;
pub use trip::TripCommand;

use clap::ValueEnum;
use std::time::Duration;

use itinera::config::Config;
use itinera::controller::{Controller, SharedTrip, View};
use itinera::remote::HttpDocumentClient;
use itinera::share::parse_fragment;
use itinera::store::{FileKeyValueStore, TripStore};

/// How long to wait for the first value of a shared trip.
const REMOTE_WAIT: Duration = Duration::from_secs(10);

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub type AppController = Controller<FileKeyValueStore, HttpDocumentClient>;

pub fn controller(config: &Config) -> AppController {
    let store = TripStore::new(FileKeyValueStore::new(config.data_dir.value.clone()));
    let remote = HttpDocumentClient::new(config.remote.server_url.clone());
    Controller::new(store, remote)
}

/// Returns the fragment part of a share URL, or the input if it has none.
fn fragment_of(target: &str) -> &str {
    target.find('#').map(|i| &target[i..]).unwrap_or(target)
}

/// Points the controller at a local trip id or a share URL.
///
/// Shared trips backed by the document server are awaited until their
/// first value arrives.
pub async fn open_target(
    controller: &mut AppController,
    target: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if parse_fragment(target).is_none() {
        if !controller.select_trip(target) {
            return Err(format!("Trip not found: {}", target).into());
        }
        return Ok(());
    }

    if let Some(notice) = controller.navigate(fragment_of(target)) {
        return Err(notice.to_string().into());
    }

    if let View::Shared(SharedTrip::Remote { trip_id, trip, .. }) = controller.view() {
        if trip.is_none() {
            let trip_id = trip_id.clone();
            if tokio::time::timeout(REMOTE_WAIT, controller.wait_remote_update())
                .await
                .is_err()
            {
                return Err(format!(
                    "Timed out waiting for shared trip {} from {}",
                    trip_id,
                    controller.remote().server_url()
                )
                .into());
            }
        }
    }

    if controller.current_trip().is_none() {
        return Err("Shared trip not found".into());
    }
    Ok(())
}
