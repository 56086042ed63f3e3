use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the config file to load.
///
/// Priority:
/// 1. `--config` flag / `WAKER_CONFIG` env var (passed in as `explicit`)
/// 2. `config.yaml` in the current directory
/// 3. `config.yaml` next to the executable
/// 4. Fall back to `./config.yaml` so the not-found error names it
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    resolve_from(explicit, &cwd, exe_dir.as_deref())
}

fn resolve_from(explicit: Option<&Path>, cwd: &Path, exe_dir: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let local = cwd.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return local;
    }

    if let Some(dir) = exe_dir {
        let beside = dir.join(CONFIG_FILE_NAME);
        if beside.is_file() {
            return beside;
        }
    }

    local
}
