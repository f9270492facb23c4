use std::path::{Path, PathBuf};

use anyhow::Context;
use directories::UserDirs;
use git_version::git_version;
use smithay::utils::{Logical, Point, Rectangle};

pub mod id;
pub mod signals;
pub mod spawning;

pub fn version() -> String {
    format!(
        "{} ({})",
        env!("CARGO_PKG_VERSION"),
        git_version!(fallback = "unknown commit"),
    )
}

pub fn expand_home(path: &Path) -> anyhow::Result<Option<PathBuf>> {
    if let Ok(rest) = path.strip_prefix("~") {
        let dirs = UserDirs::new().context("error retrieving home directory")?;
        Ok(Some([dirs.home_dir(), rest].iter().collect()))
    } else {
        Ok(None)
    }
}

pub fn center(rect: Rectangle<i32, Logical>) -> Point<i32, Logical> {
    rect.loc + rect.size.downscale(2).to_point()
}

/// Clamps `value` into `[min, max]`, preferring `min` when the range is empty.
pub fn clamp_preferring_min(value: i32, min: i32, max: i32) -> i32 {
    value.min(max).max(min)
}
