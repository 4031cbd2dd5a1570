use std::env;
use std::fs;
use std::path::PathBuf;

/// Filesystem layout for everything the service persists.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub knowledge_dir: PathBuf,
    pub log_dir: PathBuf,
    pub requests_path: PathBuf,
    pub audit_log_path: PathBuf,
    pub team_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let data_dir = discover_data_dir();
        Self::rooted_at(data_dir)
    }

    /// Build a layout under an explicit root. Tests point this at a tempdir.
    pub fn rooted_at(data_dir: PathBuf) -> Self {
        let knowledge_dir = data_dir.join("knowledge");
        let log_dir = data_dir.join("logs");
        let requests_path = data_dir.join("consultation_requests.json");
        let audit_log_path = data_dir.join("consultation_logs.json");
        let team_path = data_dir.join("team_members.json");

        for dir in [&data_dir, &knowledge_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            data_dir,
            knowledge_dir,
            log_dir,
            requests_path,
            audit_log_path,
            team_path,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("RELAY_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if cfg!(debug_assertions) {
        return env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("data");
    }

    if cfg!(target_os = "windows") {
        let base = env::var("LOCALAPPDATA")
            .unwrap_or_else(|_| env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string()));
        return PathBuf::from(base).join("Relay");
    }

    if cfg!(target_os = "macos") {
        return home_dir()
            .join("Library")
            .join("Application Support")
            .join("Relay");
    }

    let xdg = env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
        home_dir()
            .join(".local/share")
            .to_string_lossy()
            .to_string()
    });
    PathBuf::from(xdg).join("relay")
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
