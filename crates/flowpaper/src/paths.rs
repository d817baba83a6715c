//! Resolves where flowpaper looks for its configuration file.
//!
//! Precedence: `--config PATH`, then `$FLOWPAPER_CONFIG_DIR/flowpaper.toml`,
//! then the platform config directory from `directories-next`.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "FLOWPAPER_CONFIG_DIR";
pub const CONFIG_FILE_NAME: &str = "flowpaper.toml";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "flowpaper";
const APPLICATION: &str = "flowpaper";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl AppPaths {
    /// Unlike the data directories of a daemon, nothing is created here; a
    /// missing config file simply means defaults.
    pub fn discover(explicit_file: Option<&Path>) -> Result<Self> {
        if let Some(file) = explicit_file {
            let config_dir = file
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            return Ok(Self {
                config_dir,
                config_file: file.to_path_buf(),
            });
        }

        let config_dir = match env_override(ENV_CONFIG_DIR) {
            Some(dir) => dir,
            None => ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
                .ok_or_else(|| anyhow!("failed to determine user directories"))?
                .config_dir()
                .to_path_buf(),
        };
        let config_file = config_dir.join(CONFIG_FILE_NAME);
        Ok(Self {
            config_dir,
            config_file,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    struct EnvGuard {
        key: &'static str,
        previous: Option<OsString>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &Path) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }

        fn clear(key: &'static str) -> Self {
            let previous = env::var_os(key);
            env::remove_var(key);
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = self.previous.take() {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    #[test]
    fn env_override_takes_precedence() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let config_dir = root.path().join("config");
        let _config_guard = EnvGuard::set(ENV_CONFIG_DIR, &config_dir);

        let paths = AppPaths::discover(None).unwrap();

        assert_eq!(paths.config_dir(), config_dir.as_path());
        assert_eq!(paths.config_file(), config_dir.join(CONFIG_FILE_NAME));
    }

    #[test]
    fn explicit_file_beats_env_override() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _config_guard = EnvGuard::set(ENV_CONFIG_DIR, &root.path().join("ignored"));
        let file = root.path().join("custom/flow.toml");

        let paths = AppPaths::discover(Some(&file)).unwrap();

        assert_eq!(paths.config_file(), file.as_path());
        assert_eq!(paths.config_dir(), root.path().join("custom"));
    }

    #[test]
    fn default_file_name_under_platform_dir() {
        let _guard = env_lock().lock().unwrap();
        let _config_guard = EnvGuard::clear(ENV_CONFIG_DIR);

        if let Ok(paths) = AppPaths::discover(None) {
            assert_eq!(
                paths.config_file().file_name().and_then(|name| name.to_str()),
                Some(CONFIG_FILE_NAME)
            );
        }
    }
}
