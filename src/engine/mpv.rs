// SPDX-License-Identifier: MIT

use super::{Engine, EngineState};
use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// mpv driven over its JSON IPC socket.
///
/// The process is launched with every native end-of-file affordance disabled
/// (no OSC, no keep-open screen, no OSD): the session controller advances to
/// the next video before mpv would ever show one.
pub struct MpvEngine {
    socket_path: PathBuf,
    process: Option<Child>,
}

impl MpvEngine {
    pub fn new() -> Self {
        Self {
            socket_path: Self::socket_path(),
            process: None,
        }
    }

    /// Instance-specific socket under XDG state, owner-only permissions.
    fn socket_path() -> PathBuf {
        let state_dir = std::env::var("XDG_STATE_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".local").join("state"))
            })
            .unwrap_or_else(std::env::temp_dir);

        let app_dir = state_dir.join("tickertv");
        if !app_dir.exists() {
            if let Err(e) = fs::create_dir_all(&app_dir) {
                warn!("Failed to create state directory: {}", e);
                let uid = unsafe { libc::getuid() };
                return std::env::temp_dir()
                    .join(format!("tickertv-mpv-{}-{}.sock", uid, std::process::id()));
            }
            if let Err(e) = fs::set_permissions(&app_dir, fs::Permissions::from_mode(0o700)) {
                warn!("Failed to set permissions on state directory: {}", e);
            }
        }

        app_dir.join(format!("mpv-{}.sock", std::process::id()))
    }

    pub fn is_mpv_installed() -> bool {
        Command::new("mpv")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn send_command(&self, command: Value) -> Result<Value> {
        let mut socket = UnixStream::connect(&self.socket_path).with_context(|| {
            format!("Failed to connect to mpv socket at {:?}", self.socket_path)
        })?;
        socket.set_read_timeout(Some(Duration::from_secs(2)))?;

        let command_str = serde_json::to_string(&command)?;
        socket.write_all(command_str.as_bytes())?;
        socket.write_all(b"\n")?;

        // mpv interleaves async events on the same socket; skip them until the
        // command reply (the line carrying "error") arrives.
        let mut reader = BufReader::new(socket);
        loop {
            let mut response = String::new();
            let read = reader.read_line(&mut response)?;
            if read == 0 {
                return Err(anyhow::anyhow!("mpv closed the IPC socket"));
            }

            let parsed: Value = serde_json::from_str(&response)
                .with_context(|| format!("Failed to parse mpv response: {}", response))?;

            if parsed.get("event").is_some() {
                continue;
            }

            if let Some(error) = parsed.get("error").and_then(|e| e.as_str())
                && error != "success"
            {
                return Err(anyhow::anyhow!("mpv command failed: {}", error));
            }

            return Ok(parsed);
        }
    }

    fn get_property(&self, name: &str) -> Result<Value> {
        let response = self.send_command(json!({
            "command": ["get_property", name]
        }))?;
        Ok(response.get("data").cloned().unwrap_or(Value::Null))
    }

    fn get_bool(&self, name: &str) -> bool {
        self.get_property(name)
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn set_property(&self, name: &str, value: Value) -> Result<()> {
        self.send_command(json!({
            "command": ["set_property", name, value]
        }))?;
        Ok(())
    }

    fn is_socket_ready(&self) -> bool {
        self.socket_path.exists()
            && self
                .send_command(json!({ "command": ["get_property", "mpv-version"] }))
                .is_ok()
    }

    /// Launch mpv idle with the IPC socket and wait until it responds.
    pub async fn launch(&mut self) -> Result<()> {
        if self.is_socket_ready() {
            debug!("mpv already running at {:?}", self.socket_path);
            return Ok(());
        }

        if self.socket_path.exists() {
            let _ = fs::remove_file(&self.socket_path);
        }

        let mut cmd = Command::new("mpv");
        cmd.arg(format!("--input-ipc-server={}", self.socket_path.display()))
            .arg("--idle=yes")
            .arg("--force-window=yes")
            // No end-of-file screen: the controller advances before eof.
            .arg("--keep-open=no")
            .arg("--osc=no")
            .arg("--osd-level=0")
            .arg("--no-terminal")
            .arg("--really-quiet")
            .arg("--title=TickerTV")
            .arg("--geometry=1280x720")
            .arg("--autofit-larger=90%x90%")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null());

        debug!("Starting mpv with IPC socket at {:?}", self.socket_path);
        let mut child = cmd.spawn().context("Failed to start mpv. Is mpv installed?")?;

        for attempt in 0..20 {
            sleep(Duration::from_millis(250)).await;

            match child.try_wait() {
                Ok(Some(status)) => {
                    error!("mpv exited during startup with status {:?}", status);
                    return Err(anyhow::anyhow!(
                        "mpv exited during startup with status {:?}",
                        status
                    ));
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to check mpv process status: {}", e),
            }

            if self.is_socket_ready() {
                debug!("mpv IPC socket ready after {} ms", (attempt + 1) * 250);
                self.process = Some(child);
                return Ok(());
            }
        }

        let _ = child.kill();
        let _ = child.wait();
        Err(anyhow::anyhow!("mpv IPC socket failed to appear within 5s"))
    }

    pub fn shutdown(&mut self) {
        if self.socket_path.exists() {
            let _ = self.send_command(json!({ "command": ["quit"] }));
        }
        if let Some(mut child) = self.process.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if self.socket_path.exists() {
            let _ = fs::remove_file(&self.socket_path);
        }
    }
}

impl Default for MpvEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for MpvEngine {
    fn load(&mut self, video_id: &str) -> Result<()> {
        debug!("Loading video {}", video_id);
        // ytdl:// lets mpv resolve the opaque id through yt-dlp.
        self.send_command(json!({
            "command": ["loadfile", format!("ytdl://{}", video_id), "replace"]
        }))?;
        self.set_property("pause", json!(false))?;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.set_property("pause", json!(false))
    }

    fn pause(&mut self) -> Result<()> {
        self.set_property("pause", json!(true))
    }

    fn seek_to(&mut self, seconds: f64) -> Result<()> {
        self.send_command(json!({
            "command": ["seek", seconds, "absolute"]
        }))?;
        Ok(())
    }

    fn set_volume(&mut self, percent: i64) -> Result<()> {
        self.set_property("volume", json!(percent))
    }

    fn current_time(&mut self) -> Result<f64> {
        let value = self.get_property("time-pos")?;
        Ok(value.as_f64().unwrap_or(0.0))
    }

    fn duration(&mut self) -> Result<f64> {
        let value = self.get_property("duration")?;
        Ok(value.as_f64().unwrap_or(0.0))
    }

    fn state(&mut self) -> Result<EngineState> {
        if !self.is_socket_ready() {
            return Ok(EngineState::Unstarted);
        }

        if self.get_bool("idle-active") {
            return Ok(EngineState::Unstarted);
        }
        if self.get_bool("eof-reached") {
            return Ok(EngineState::Ended);
        }
        if self.get_bool("paused-for-cache") {
            return Ok(EngineState::Buffering);
        }
        if self.get_bool("pause") {
            return Ok(EngineState::Paused);
        }

        // A file is loaded and unpaused; before the first frame decodes there
        // is no time-pos yet.
        match self.get_property("time-pos") {
            Ok(Value::Number(_)) => Ok(EngineState::Playing),
            _ => Ok(EngineState::Cued),
        }
    }
}

impl Drop for MpvEngine {
    fn drop(&mut self) {
        if let Some(mut child) = self.process.take() {
            match child.try_wait() {
                Ok(Some(_)) => {}
                _ => {
                    debug!("Terminating mpv on cleanup");
                    let _ = child.kill();
                    let _ = child.wait();
                }
            }
        }
        if self.socket_path.exists() {
            let _ = fs::remove_file(&self.socket_path);
        }
    }
}
