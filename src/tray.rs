use std::process::{Command, Stdio};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use notify_rust::Notification;
use tauri::image::Image;
use tauri::menu::{Menu, MenuItem, PredefinedMenuItem};
use tauri::tray::TrayIcon;
use tauri::{App, AppHandle, Manager, Runtime};

use crate::alert::{Notifier, SoundPlayer, StatusDisplay};
use crate::config::MonitorConfig;
use crate::feed::HttpFeed;
use crate::session::{Collaborators, Session};
use crate::timer::TokioScheduler;

const TRAY_ID: &str = "main";
const CHECK_ID: &str = "check";
const SOUND_ID: &str = "sound";
const ABOUT_ID: &str = "about";
const QUIT_ID: &str = "quit";

const ICON_SIZE: u32 = 32;
const ICON_RGB: [u8; 3] = [245, 166, 35];

struct MonitorState<R: Runtime> {
    session: Arc<Session<HttpFeed>>,
    sound_item: MenuItem<R>,
}

/// Desktop notifications over the freedesktop notification service.
pub struct DesktopNotifier {
    app_name: String,
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) {
        tracing::debug!("notification: {title}");
        if let Err(err) = Notification::new()
            .appname(&self.app_name)
            .summary(title)
            .body(body)
            .icon("dialog-warning-symbolic")
            .show()
        {
            tracing::warn!("failed to show notification: {err}");
        }
    }
}

/// Plays sound-theme events through libcanberra's command line player.
pub struct ThemeSoundPlayer;

impl SoundPlayer for ThemeSoundPlayer {
    fn play(&self, sound_name: &str, description: &str) {
        let spawned = Command::new("canberra-gtk-play")
            .arg("--id")
            .arg(sound_name)
            .arg("--description")
            .arg(description)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            // reap in the background so the player never lingers as a zombie
            Ok(mut child) => {
                std::thread::spawn(move || {
                    let _ = child.wait();
                });
            }
            Err(err) => tracing::warn!(sound = sound_name, "failed to play theme sound: {err}"),
        }
    }
}

/// The tray icon stands in for the panel widget: its title is the label and
/// the icon alpha carries the opacity. Tray titles have no alpha of their own.
pub struct TrayDisplay<R: Runtime> {
    tray: TrayIcon<R>,
}

impl<R: Runtime> StatusDisplay for TrayDisplay<R> {
    fn set_label(&self, text: &str) {
        if let Err(err) = self.tray.set_title(Some(text)) {
            tracing::warn!("failed to update tray title: {err}");
        }
        if let Err(err) = self.tray.set_tooltip(Some(text)) {
            tracing::warn!("failed to update tray tooltip: {err}");
        }
    }

    fn set_opacity(&self, opacity: u8) {
        if let Err(err) = self.tray.set_icon(Some(warning_icon(opacity))) {
            tracing::warn!("failed to update tray icon: {err}");
        }
    }
}

/// A filled warning triangle with every pixel's alpha scaled to `opacity`.
fn warning_icon(opacity: u8) -> Image<'static> {
    let size = ICON_SIZE as usize;
    let mut rgba = vec![0u8; size * size * 4];
    let center = (size as f32 - 1.0) / 2.0;
    for y in 3..size - 2 {
        let half_width = (y as f32 + 1.0) / 2.0 - 1.0;
        for x in 0..size {
            if (x as f32 - center).abs() > half_width {
                continue;
            }
            let offset = (y * size + x) * 4;
            rgba[offset..offset + 3].copy_from_slice(&ICON_RGB);
            rgba[offset + 3] = opacity;
        }
    }
    Image::new_owned(rgba, ICON_SIZE, ICON_SIZE)
}

pub fn install<R: Runtime>(app: &App<R>) -> anyhow::Result<()> {
    let config = MonitorConfig::default();
    let tray = app
        .tray_by_id(TRAY_ID)
        .ok_or_else(|| anyhow!("tray icon `{TRAY_ID}` missing from tauri.conf.json"))?;

    let runtime = tauri::async_runtime::block_on(async { tokio::runtime::Handle::current() });
    let feed = HttpFeed::from_config(&config).context("failed to build http client")?;
    let collaborators = Collaborators {
        notifier: Arc::new(DesktopNotifier {
            app_name: config.app_title.clone(),
        }),
        display: Arc::new(TrayDisplay { tray: tray.clone() }),
        sound: Arc::new(ThemeSoundPlayer),
        scheduler: Arc::new(TokioScheduler::new(runtime.clone())),
    };
    let session = Session::new(config, feed, collaborators, runtime)
        .context("invalid monitor configuration")?;

    let check_item =
        MenuItem::with_id(app, CHECK_ID, "Check Latest Earthquake", true, None::<&str>)?;
    let sound_item = MenuItem::with_id(
        app,
        SOUND_ID,
        session.sound_menu_label(),
        true,
        None::<&str>,
    )?;
    let about_item =
        MenuItem::with_id(app, ABOUT_ID, "About Earthquake Alarm", true, None::<&str>)?;
    let separator = PredefinedMenuItem::separator(app)?;
    let quit_item = MenuItem::with_id(app, QUIT_ID, "Quit", true, None::<&str>)?;
    let menu = Menu::with_items(
        app,
        &[&check_item, &sound_item, &about_item, &separator, &quit_item],
    )?;
    tray.set_menu(Some(menu))?;

    app.on_menu_event(handle_menu_event::<R>);
    app.manage(MonitorState {
        session: session.clone(),
        sound_item,
    });

    tauri::async_runtime::spawn(async move {
        session.start().await;
    });
    Ok(())
}

fn handle_menu_event<R: Runtime>(app: &AppHandle<R>, event: tauri::menu::MenuEvent) {
    let Some(state) = app.try_state::<MonitorState<R>>() else {
        return;
    };
    match event.id().0.as_str() {
        CHECK_ID => {
            let session = state.session.clone();
            tauri::async_runtime::spawn(async move {
                session.check(true).await;
            });
        }
        SOUND_ID => {
            let label = state.session.cycle_sound();
            if let Err(err) = state.sound_item.set_text(label) {
                tracing::warn!("failed to update sound menu label: {err}");
            }
        }
        ABOUT_ID => state.session.about(),
        QUIT_ID => app.exit(0),
        other => tracing::debug!("unhandled menu event {other}"),
    }
}

/// Stops the session's timers before the tray and the HTTP client go away.
pub fn shutdown<R: Runtime>(app: &AppHandle<R>) {
    if let Some(state) = app.try_state::<MonitorState<R>>() {
        state.session.shutdown();
    }
    let _ = app.remove_tray_by_id(TRAY_ID);
}
