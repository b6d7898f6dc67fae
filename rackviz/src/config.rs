//! Settings file: endpoint URL plus the fixed counts and timings of the scene.
//! Stored under XDG config dir: $XDG_CONFIG_HOME/rackviz/config.json (fallback ~/.config/rackviz/config.json)

use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};
use tracing::warn;

use crate::scene::builder::Layout;

const MIN_POLL_MS: u64 = 100;
const MIN_FRAME_MS: u64 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub server_count: usize,
    pub bar_count: usize,
    pub particle_count: usize,
    pub poll_interval_ms: u64,
    pub resize_quiet_ms: u64,
    pub frame_interval_ms: u64,
}

impl Default for VizConfig {
    fn default() -> Self {
        let layout = Layout::default();
        Self {
            url: None,
            server_count: layout.server_count,
            bar_count: layout.bar_count,
            particle_count: layout.particle_count,
            poll_interval_ms: 1000,
            resize_quiet_ms: 250,
            frame_interval_ms: 33,
        }
    }
}

impl VizConfig {
    /// Bring hand-edited values back into a range the scene can work with.
    pub fn sanitized(mut self) -> Self {
        self.server_count = self.server_count.max(1);
        self.bar_count = self.bar_count.max(1);
        self.poll_interval_ms = self.poll_interval_ms.max(MIN_POLL_MS);
        self.frame_interval_ms = self.frame_interval_ms.max(MIN_FRAME_MS);
        self
    }

    pub fn layout(&self) -> Layout {
        Layout {
            server_count: self.server_count,
            bar_count: self.bar_count,
            particle_count: self.particle_count,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn resize_quiet(&self) -> Duration {
        Duration::from_millis(self.resize_quiet_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("rackviz")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rackviz")
    }
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Missing file → defaults. Unreadable or malformed file → defaults plus a warning.
pub fn load_config(path: &Path) -> VizConfig {
    let cfg = match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring malformed config");
            VizConfig::default()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => VizConfig::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read config");
            VizConfig::default()
        }
    };
    cfg.sanitized()
}

pub fn save_config(path: &Path, cfg: &VizConfig) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(cfg)?;
    fs::write(path, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let td = tempfile::tempdir().unwrap();
        let cfg = load_config(&td.path().join("nope.json"));
        assert_eq!(cfg, VizConfig::default());
        assert_eq!(cfg.poll_interval(), Duration::from_secs(1));
        assert_eq!(cfg.resize_quiet(), Duration::from_millis(250));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let td = tempfile::tempdir().unwrap();
        let p = td.path().join("config.json");
        fs::write(&p, r#"{"particle_count": 50, "url": "http://box:5000"}"#).unwrap();
        let cfg = load_config(&p);
        assert_eq!(cfg.particle_count, 50);
        assert_eq!(cfg.url.as_deref(), Some("http://box:5000"));
        assert_eq!(cfg.server_count, 8);
    }

    #[test]
    fn malformed_file_falls_back() {
        let td = tempfile::tempdir().unwrap();
        let p = td.path().join("config.json");
        fs::write(&p, "{ not json").unwrap();
        assert_eq!(load_config(&p), VizConfig::default());
    }

    #[test]
    fn sanitize_bounds_values() {
        let cfg = VizConfig {
            server_count: 0,
            bar_count: 0,
            poll_interval_ms: 1,
            frame_interval_ms: 0,
            ..VizConfig::default()
        }
        .sanitized();
        assert_eq!(cfg.server_count, 1);
        assert_eq!(cfg.bar_count, 1);
        assert_eq!(cfg.poll_interval_ms, MIN_POLL_MS);
        assert_eq!(cfg.frame_interval_ms, MIN_FRAME_MS);
    }

    #[test]
    fn save_then_load() {
        let td = tempfile::tempdir().unwrap();
        let p = td.path().join("nested").join("config.json");
        let cfg = VizConfig {
            url: Some("ws://agent:5000/ws".into()),
            ..VizConfig::default()
        };
        save_config(&p, &cfg).unwrap();
        assert_eq!(load_config(&p), cfg);
    }
}
