use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    io::{BufRead, BufReader, Read, Write},
    net::Shutdown,
    os::unix::net::{UnixListener, UnixStream},
    path::{Path, PathBuf},
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use crate::backend::{PanelBackend, Shell, Theming};
use crate::config::{FRAME_INTERVAL, MAX_REQUEST_BYTES, REPLY_TIMEOUT, SOCKET_NAME, Settings};
use crate::transitions::TransitionController;
use crate::tween::select_tweener;
use crate::types::{AnimationAction, AnimationDestination, FadeParams};

/// UI events the shell reports to the daemon, one JSON object per request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ShellEvent {
    OverviewShowing,
    OverviewHidden,
    WindowMaximized,
    WindowUnmaximized,
    ScreenLocked,
    ScreenUnlocked,
    ReloadSettings,
    Status,
}

impl ShellEvent {
    pub fn from_name(name: &str) -> Result<Self> {
        serde_json::from_value(serde_json::json!({ "event": name }))
            .with_context(|| format!("unknown event: {name}"))
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Status(StatusReport),
    Ack { ok: bool },
    Error { error: String },
}

#[derive(Debug, Serialize)]
pub struct AnimationReport {
    pub action: AnimationAction,
    pub destination: AnimationDestination,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub transparent: bool,
    pub blank: bool,
    pub animation: Option<AnimationReport>,
    pub background_alpha: f64,
    pub corner_alpha: u8,
    pub styled: bool,
    pub overview_shown: bool,
    pub window_maximized: bool,
    pub transition: &'static str,
}

/// Owns the controller and maps shell events onto fades.
pub struct PanelDaemon {
    controller: TransitionController<Settings, PanelBackend>,
    settings_path: PathBuf,
    window_maximized: bool,
}

impl PanelDaemon {
    pub fn new(settings: Settings, settings_path: PathBuf) -> Self {
        let backend = PanelBackend::new(&settings);
        let tweener = select_tweener(settings.force_animation, settings.enable_animations);
        Self {
            controller: TransitionController::new(settings, backend, tweener),
            settings_path,
            window_maximized: false,
        }
    }

    pub fn handle(&mut self, event: ShellEvent) -> Result<Reply> {
        match event {
            ShellEvent::OverviewShowing | ShellEvent::ScreenLocked => {
                self.controller.backend_mut().set_overview_shown(true);
                self.controller.fade_to_blank(FadeParams::default());
            }
            ShellEvent::OverviewHidden | ShellEvent::ScreenUnlocked => {
                self.controller.backend_mut().set_overview_shown(false);
                self.restore(FadeParams::default());
            }
            ShellEvent::WindowMaximized => {
                self.window_maximized = true;
                self.controller.fade_to_maximum(FadeParams::default());
            }
            ShellEvent::WindowUnmaximized => {
                self.window_maximized = false;
                if !self.controller.backend().overview_shown() {
                    self.controller.fade_out(FadeParams::default());
                }
            }
            ShellEvent::ReloadSettings => self.reload_settings()?,
            ShellEvent::Status => return Ok(Reply::Status(self.status())),
        }
        Ok(Reply::Ack { ok: true })
    }

    pub fn advance(&mut self, dt: Duration) {
        self.controller.advance(dt);
    }

    pub fn is_animating(&self) -> bool {
        self.controller.is_animating()
    }

    pub fn status(&self) -> StatusReport {
        let transparency = self.controller.transparency();
        let backend = self.controller.backend();
        StatusReport {
            transparent: transparency.is_transparent(),
            blank: transparency.is_blank(),
            animation: self
                .controller
                .animation()
                .current()
                .map(|(action, destination)| AnimationReport {
                    action,
                    destination,
                }),
            background_alpha: backend.background_alpha(),
            corner_alpha: backend.corner_alpha(),
            styled: backend.is_styled(),
            overview_shown: backend.overview_shown(),
            window_maximized: self.window_maximized,
            transition: self.controller.transition().id,
        }
    }

    pub fn shutdown(self) {
        let (_settings, backend) = self.controller.shutdown();
        tracing::info!(alpha = backend.background_alpha(), "panel daemon stopped");
    }

    fn restore(&mut self, params: FadeParams) {
        if self.window_maximized {
            self.controller.fade_to_maximum(params);
        } else {
            self.controller.fade_to_minimum(params);
        }
    }

    fn reload_settings(&mut self) -> Result<()> {
        let settings = Settings::load_or_default(&self.settings_path)?;
        let previous = self.controller.settings();
        if previous.force_animation != settings.force_animation
            || previous.enable_animations != settings.enable_animations
        {
            tracing::warn!("tween engine selection changes take effect on restart");
        }

        self.controller.backend_mut().update_opacities(&settings);
        *self.controller.settings_mut() = settings;
        self.controller.update_transition_type();
        tracing::info!(path = %self.settings_path.display(), "settings reloaded");

        if self.controller.transparency().is_blank() {
            return Ok(());
        }
        let params = FadeParams::default().time(Duration::ZERO).interruptible();
        if self.window_maximized {
            self.controller.fade_to_maximum(params);
        } else {
            self.controller.fade_out(params);
        }
        Ok(())
    }
}

pub fn run_daemon(settings_path: PathBuf) -> Result<()> {
    let settings = Settings::load_or_default(&settings_path)?;
    let socket_path = runtime_socket_path(SOCKET_NAME);
    let listener = bind_listener(&socket_path)?;
    tracing::info!(socket = %socket_path.display(), "panel daemon listening");

    let (tx, rx) = mpsc::channel::<DaemonMsg>();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else {
                continue;
            };
            if let Err(err) = serve_client(stream, &tx) {
                tracing::warn!("client error: {err:#}");
            }
        }
    });

    let mut daemon = PanelDaemon::new(settings, settings_path);
    let mut last_tick = Instant::now();
    loop {
        let msg = if daemon.is_animating() {
            match rx.recv_timeout(FRAME_INTERVAL) {
                Ok(msg) => Some(msg),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(msg) => Some(msg),
                Err(_) => break,
            }
        };

        let now = Instant::now();
        daemon.advance(now.duration_since(last_tick));
        last_tick = now;

        let Some(DaemonMsg::Event { event, reply }) = msg else {
            continue;
        };
        let response = daemon.handle(event).unwrap_or_else(|err| {
            tracing::warn!(?event, "event failed: {err:#}");
            Reply::Error {
                error: format!("{err:#}"),
            }
        });
        let _ = reply.send(response);
    }

    tracing::error!("listener thread exited");
    daemon.shutdown();
    Ok(())
}

pub fn send_event(event: ShellEvent) -> Result<String> {
    let socket_path = runtime_socket_path(SOCKET_NAME);
    let mut stream = UnixStream::connect(&socket_path)
        .with_context(|| format!("connect {}", socket_path.display()))?;
    let mut request = serde_json::to_string(&event).context("encode event")?;
    request.push('\n');
    stream.write_all(request.as_bytes()).context("send event")?;
    stream.shutdown(Shutdown::Write).context("finish request")?;

    let mut reply = String::new();
    stream.read_to_string(&mut reply).context("read reply")?;
    Ok(reply.trim_end().to_string())
}

fn runtime_socket_path(name: &str) -> PathBuf {
    let runtime_dir = std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"));
    runtime_dir.join(name)
}

fn bind_listener(path: &Path) -> Result<UnixListener> {
    if UnixStream::connect(path).is_ok() {
        return Err(anyhow::anyhow!("panelfade daemon already running"));
    }
    let _ = std::fs::remove_file(path);
    let listener =
        UnixListener::bind(path).with_context(|| format!("bind {}", path.display()))?;
    Ok(listener)
}

enum DaemonMsg {
    Event {
        event: ShellEvent,
        reply: mpsc::Sender<Reply>,
    },
}

fn serve_client(stream: UnixStream, tx: &mpsc::Sender<DaemonMsg>) -> Result<()> {
    stream
        .set_read_timeout(Some(REPLY_TIMEOUT))
        .context("set read timeout")?;
    let mut line = String::new();
    BufReader::new((&stream).take(MAX_REQUEST_BYTES))
        .read_line(&mut line)
        .context("read request")?;

    let reply = match serde_json::from_str::<ShellEvent>(line.trim()) {
        Ok(event) => {
            tracing::info!(?event, "shell event");
            dispatch(tx, event)?
        }
        Err(err) => Reply::Error {
            error: format!("bad request: {err}"),
        },
    };

    let mut text = serde_json::to_string(&reply).context("encode reply")?;
    text.push('\n');
    (&stream).write_all(text.as_bytes()).context("write reply")?;
    Ok(())
}

fn dispatch(tx: &mpsc::Sender<DaemonMsg>, event: ShellEvent) -> Result<Reply> {
    let (reply_tx, reply_rx) = mpsc::channel();
    tx.send(DaemonMsg::Event {
        event,
        reply: reply_tx,
    })
    .map_err(|_| anyhow::anyhow!("daemon loop stopped"))?;
    reply_rx
        .recv_timeout(REPLY_TIMEOUT)
        .context("wait for daemon reply")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn instant_settings() -> Settings {
        Settings {
            transition_speed: 0,
            maximized_opacity: 240,
            unmaximized_opacity: 80,
            ..Settings::default()
        }
    }

    fn daemon(settings: Settings) -> PanelDaemon {
        let path = std::env::temp_dir().join("panelfade-test-absent/settings.json");
        PanelDaemon::new(settings, path)
    }

    #[test]
    fn event_names_parse() {
        assert_eq!(
            ShellEvent::from_name("overview-showing").unwrap(),
            ShellEvent::OverviewShowing
        );
        assert_eq!(
            ShellEvent::from_name("reload-settings").unwrap(),
            ShellEvent::ReloadSettings
        );
        assert!(ShellEvent::from_name("overview").is_err());
    }

    #[test]
    fn events_serialize_as_tagged_objects() {
        let text = serde_json::to_string(&ShellEvent::WindowUnmaximized).unwrap();
        assert_eq!(text, r#"{"event":"window-unmaximized"}"#);
    }

    #[test]
    fn overview_cycle_blanks_then_restores() {
        let mut daemon = daemon(instant_settings());
        daemon.handle(ShellEvent::WindowMaximized).unwrap();
        assert_eq!(daemon.status().background_alpha, 240.0);

        daemon.handle(ShellEvent::OverviewShowing).unwrap();
        let status = daemon.status();
        assert!(status.blank && status.transparent && status.overview_shown);
        assert_eq!(status.background_alpha, 0.0);
        assert_eq!(status.corner_alpha, 0);

        daemon.handle(ShellEvent::OverviewHidden).unwrap();
        let status = daemon.status();
        assert!(!status.blank && !status.transparent);
        assert_eq!(status.background_alpha, 240.0);
        assert!(status.animation.is_none());
    }

    #[test]
    fn unmaximize_fades_out_unless_overview_is_up() {
        let mut daemon = daemon(instant_settings());
        daemon.handle(ShellEvent::WindowMaximized).unwrap();
        daemon.handle(ShellEvent::ScreenLocked).unwrap();
        daemon.handle(ShellEvent::WindowUnmaximized).unwrap();
        assert_eq!(daemon.status().background_alpha, 0.0);

        daemon.handle(ShellEvent::ScreenUnlocked).unwrap();
        let status = daemon.status();
        assert!(status.transparent && !status.blank);
        assert_eq!(status.background_alpha, 80.0);
    }

    #[test]
    fn animated_fade_runs_on_advance() {
        let settings = Settings {
            transition_speed: 100,
            ..instant_settings()
        };
        let mut daemon = daemon(settings);
        daemon.handle(ShellEvent::WindowUnmaximized).unwrap();
        assert!(daemon.is_animating());
        assert!(daemon.status().animation.is_some());

        daemon.advance(Duration::from_millis(100));
        assert!(!daemon.is_animating());
        assert_eq!(daemon.status().background_alpha, 80.0);
        assert!(daemon.status().animation.is_none());
    }

    #[test]
    fn disabled_desktop_animations_finish_on_next_frame() {
        let settings = Settings {
            transition_speed: 5000,
            enable_animations: false,
            ..instant_settings()
        };
        let mut daemon = daemon(settings);
        daemon.handle(ShellEvent::WindowUnmaximized).unwrap();
        daemon.advance(Duration::ZERO);
        assert!(!daemon.is_animating());
        assert_eq!(daemon.status().background_alpha, 80.0);
    }

    #[test]
    fn status_reply_serializes() {
        let mut daemon = daemon(instant_settings());
        let reply = daemon.handle(ShellEvent::Status).unwrap();
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["transition"], "linear");
        assert_eq!(value["window_maximized"], false);
        assert!(value["animation"].is_null());

        let ack = serde_json::to_value(daemon.handle(ShellEvent::WindowMaximized).unwrap()).unwrap();
        assert_eq!(ack, serde_json::json!({ "ok": true }));
    }

    #[test]
    fn reload_applies_new_opacity_and_curve() {
        let path = std::env::temp_dir().join(format!("panelfade-reload-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{"transition-speed": 0, "unmaximized-opacity": 30, "transition-type": 9}"#,
        )
        .unwrap();
        let mut daemon = PanelDaemon::new(instant_settings(), path.clone());
        daemon.handle(ShellEvent::WindowUnmaximized).unwrap();
        assert_eq!(daemon.status().background_alpha, 80.0);

        daemon.handle(ShellEvent::ReloadSettings).unwrap();
        let _ = fs::remove_file(&path);

        let status = daemon.status();
        assert_eq!(status.background_alpha, 30.0);
        assert_eq!(status.corner_alpha, 30);
        assert_eq!(status.transition, "Elastic");
    }

    #[test]
    fn reload_during_fade_sticks() {
        let path = std::env::temp_dir().join(format!("panelfade-midfade-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{"transition-speed": 1000, "unmaximized-opacity": 30, "maximized-opacity": 240}"#,
        )
        .unwrap();
        let settings = Settings {
            transition_speed: 1000,
            ..instant_settings()
        };
        let mut daemon = PanelDaemon::new(settings, path.clone());
        daemon.handle(ShellEvent::WindowUnmaximized).unwrap();
        daemon.advance(Duration::from_millis(100));

        daemon.handle(ShellEvent::ReloadSettings).unwrap();
        let _ = fs::remove_file(&path);
        assert!(!daemon.is_animating());

        daemon.advance(Duration::from_secs(2));
        let status = daemon.status();
        assert_eq!(status.background_alpha, 30.0);
        assert_eq!(status.corner_alpha, 30);
        assert!(status.animation.is_none());
    }

    #[test]
    fn reload_while_blank_keeps_panel_hidden() {
        let path = std::env::temp_dir().join(format!("panelfade-blank-{}.json", std::process::id()));
        fs::write(&path, r#"{"transition-speed": 0, "transition-type": 3}"#).unwrap();
        let mut daemon = PanelDaemon::new(instant_settings(), path.clone());
        daemon.handle(ShellEvent::OverviewShowing).unwrap();

        daemon.handle(ShellEvent::ReloadSettings).unwrap();
        let _ = fs::remove_file(&path);

        let status = daemon.status();
        assert_eq!(status.transition, "Quad");
        assert!(status.blank);
        assert_eq!(status.background_alpha, 0.0);
    }

    #[test]
    fn oversized_request_is_cut_off() {
        let (mut client, server) = UnixStream::pair().unwrap();
        client
            .write_all(&vec![b'x'; MAX_REQUEST_BYTES as usize])
            .unwrap();
        let (tx, rx) = mpsc::channel();
        serve_client(server, &tx).unwrap();

        let mut reply = String::new();
        client.read_to_string(&mut reply).unwrap();
        assert!(reply.contains("bad request"), "{reply}");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn broken_settings_reload_is_an_error() {
        let path = std::env::temp_dir().join(format!("panelfade-bad-{}.json", std::process::id()));
        fs::write(&path, "{\"hide-corners\": 3}").unwrap();
        let mut daemon = PanelDaemon::new(instant_settings(), path.clone());
        let result = daemon.handle(ShellEvent::ReloadSettings);
        let _ = fs::remove_file(&path);
        assert!(result.is_err());
    }
}
