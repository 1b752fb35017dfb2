use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Home directory of the current user; `dirs` falls back to the password
/// database when `HOME` is unset.
fn user_home() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("cannot resolve home directory"))
}

/// Expand a leading `~` and make the path absolute (relative to the cwd).
fn expand(raw: &str) -> Result<PathBuf> {
    let p = if raw == "~" {
        user_home()?
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        user_home()?.join(rest)
    } else {
        PathBuf::from(raw)
    };

    if p.is_absolute() {
        Ok(p)
    } else {
        Ok(std::env::current_dir()
            .context("failed to read current directory")?
            .join(p))
    }
}

/// Resolve the service home directory.
///
/// `configured = None` falls back to `<user home>/<default_subdir>`.
/// With `create`, the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let dir = match configured {
        Some(raw) => expand(raw.trim())?,
        None => user_home()?.join(default_subdir),
    };

    if create {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create home_dir {}", dir.display()))?;
    }
    Ok(dir)
}

/// Resolve `file` against `base_dir` unless it is already absolute.
pub fn resolve_against(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
