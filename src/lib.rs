pub mod alert;
pub mod config;
pub mod feed;
pub mod flash;
pub mod models;
pub mod poller;
pub mod session;
pub mod sound;
pub mod timer;
mod tray;

use tauri::RunEvent;

pub use config::MonitorConfig;
pub use models::{EarthquakeEvent, EventId};
pub use poller::{Outcome, Poller};
pub use session::{Collaborators, Session};

fn init_tracing() {
    // Respects RUST_LOG, defaults to info.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_tracing();
    tauri::Builder::default()
        .setup(|app| {
            tray::install(app)?;
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app, event| {
            if let RunEvent::Exit = event {
                tray::shutdown(app);
            }
        });
}
