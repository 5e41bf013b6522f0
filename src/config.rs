//! Runtime configuration from the environment.
//!
//! - `HOST` (default `0.0.0.0`) and `PORT` (default `8080`): bind address.
//! - `KARATE_DATA_DIR`: application-data directory for the JSON documents.
//!   Defaults to `$XDG_DATA_HOME/karate-tournament`, then `$HOME/.local/share/karate-tournament`,
//!   then `./data`.
//! - `STATIC_DIR` (default `static`): files served under `/static`.

use std::path::PathBuf;

const APP_DIR_NAME: &str = "karate-tournament";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: PathBuf::from("data"),
            static_dir: PathBuf::from("static"),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = non_empty("HOST").unwrap_or_else(default_host);
        let port = match non_empty("PORT") {
            Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT '{}', using {}", raw, default_port());
                default_port()
            }),
            None => default_port(),
        };
        let data_dir = non_empty("KARATE_DATA_DIR")
            .map(PathBuf::from)
            .or_else(|| non_empty("XDG_DATA_HOME").map(|d| PathBuf::from(d).join(APP_DIR_NAME)))
            .or_else(|| {
                non_empty("HOME").map(|h| PathBuf::from(h).join(".local/share").join(APP_DIR_NAME))
            })
            .unwrap_or_else(|| PathBuf::from("data"));
        let static_dir = non_empty("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("static"));

        Self {
            host,
            port,
            data_dir,
            static_dir,
        }
    }
}
