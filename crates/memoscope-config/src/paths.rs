use std::path::PathBuf;

/// XDG app name used for the config directory.
pub const APP_NAME: &str = "memoscope";

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory (`~/.config/memoscope` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Default config file path. `None` when no home directory can be resolved.
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_lives_in_config_dir() {
        if let (Some(dir), Some(file)) = (config_dir(), config_file()) {
            assert_eq!(file.parent(), Some(dir.as_path()));
            assert!(file.ends_with(CONFIG_FILE_NAME));
        }
    }
}
