use std::path::{Path, PathBuf};
use thiserror::Error;

/// Entries past this are ignored.
pub const MAX_ROSTER_ENTRIES: usize = 100;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read roster {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("roster {0} lists no devices")]
    Empty(PathBuf),
}

pub fn load_roster(path: &Path) -> Result<Vec<String>, RosterError> {
    let content = std::fs::read_to_string(path).map_err(|source| RosterError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let roster = parse_roster(&content);
    if roster.is_empty() {
        return Err(RosterError::Empty(path.to_path_buf()));
    }
    log::info!("Loaded {} devices from {}", roster.len(), path.display());
    Ok(roster)
}

/// One phone number per line; the first blank line ends the list.
pub fn parse_roster(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .take_while(|line| !line.is_empty())
        .take(MAX_ROSTER_ENTRIES)
        .map(String::from)
        .collect()
}
