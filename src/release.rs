//! Release naming and retention

use chrono::{DateTime, Utc};
use std::fmt;

/// Format of release directory names, in UTC
pub const RELEASE_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// A release, named after the moment it was cut
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    name: String,
}

impl Release {
    /// Release named after the current UTC time
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            name: time.format(RELEASE_FORMAT).to_string(),
        }
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name of the uploaded archive
    pub fn archive_name(&self) -> String {
        format!("{}.tar.bz2", self.name)
    }

    /// Directory of this release under `base`
    pub fn dir(&self, base: &str) -> String {
        format!("{}/{}", base, self.name)
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Pick the release directories to delete.
///
/// `listing` is the sorted directory listing of the releases path, one
/// entry per whitespace-separated word. Pruning only happens when more
/// than one release is kept, so the previous and current releases both
/// survive; the oldest entries beyond `keep` are returned.
pub fn releases_to_prune(listing: &str, keep: u32) -> Vec<&str> {
    if keep <= 1 {
        return Vec::new();
    }
    let releases: Vec<&str> = listing.split_whitespace().collect();
    let keep = keep as usize;
    if releases.len() <= keep {
        return Vec::new();
    }
    let delete_num = releases.len() - keep;
    releases[..delete_num].to_vec()
}
