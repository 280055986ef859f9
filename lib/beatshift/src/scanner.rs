//! Local library scanner: walks a directory and produces one descriptor per audio file.

use lofty::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{
    error::{Error, Result},
    traits::LibraryScanner,
};

pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "m4a", "aac", "ogg", "opus", "wav", "wma", "aiff", "alac",
];

pub struct FileScanner {
    source: PathBuf,
    ignore: Option<Regex>,
}

impl FileScanner {
    /// `ignore` is matched against each path relative to `source`; matching
    /// directories are skipped entirely.
    pub fn new(source: impl Into<PathBuf>, ignore: Option<&str>) -> Result<Self> {
        let ignore = ignore.map(Regex::new).transpose()?;
        Ok(Self {
            source: source.into(),
            ignore,
        })
    }

    fn check_source(&self) -> Result<()> {
        if !self.source.exists() {
            return Err(Error::SourceUnavailable {
                path: self.source.clone(),
                reason: "path does not exist".to_string(),
            });
        }
        if !self.source.is_dir() {
            return Err(Error::SourceUnavailable {
                path: self.source.clone(),
                reason: "not a directory".to_string(),
            });
        }
        Ok(())
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        let Some(ignore) = &self.ignore else {
            return false;
        };
        match entry.path().strip_prefix(&self.source) {
            Ok(relative) if !relative.as_os_str().is_empty() => {
                ignore.is_match(&relative.to_string_lossy())
            }
            _ => false,
        }
    }

    fn is_audio_file(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

/// `"<artist> - <title>"` from the file's tags, or the file stem when either is missing.
pub fn descriptor_for(path: &Path) -> String {
    let from_tags = lofty::read_from_path(path).ok().and_then(|tagged| {
        let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;
        let artist = tag.artist()?;
        let title = tag.title()?;
        let (artist, title) = (artist.trim(), title.trim());
        if artist.is_empty() || title.is_empty() {
            None
        } else {
            Some(format!("{artist} - {title}"))
        }
    });

    from_tags.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().trim().to_string())
            .unwrap_or_default()
    })
}

impl LibraryScanner for FileScanner {
    fn scan(&self) -> Result<Vec<String>> {
        self.check_source()?;

        let walker = WalkDir::new(&self.source)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_ignored(e));

        let mut descriptors = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() && Self::is_audio_file(entry.path()) => {
                    let descriptor = descriptor_for(entry.path());
                    debug!("{} -> {}", entry.path().display(), descriptor);
                    descriptors.push(descriptor);
                }
                Ok(_) => {}
                Err(e) => warn!("Error accessing entry: {}", e),
            }
        }

        Ok(descriptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, relative: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn untagged_files_use_their_stem() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Metrik - Freefall VIP.mp3");

        let descriptors = FileScanner::new(dir.path(), None).unwrap().scan().unwrap();

        assert_eq!(descriptors, vec!["Metrik - Freefall VIP".to_string()]);
    }

    #[test]
    fn walks_recursively_in_name_order_and_skips_non_audio() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b/Noisia - Stigma.flac");
        touch(dir.path(), "a/Camo & Krooked - Ember.MP3");
        touch(dir.path(), "a/cover.jpg");
        touch(dir.path(), "notes.txt");

        let descriptors = FileScanner::new(dir.path(), None).unwrap().scan().unwrap();

        assert_eq!(
            descriptors,
            vec![
                "Camo & Krooked - Ember".to_string(),
                "Noisia - Stigma".to_string()
            ]
        );
    }

    #[test]
    fn ignore_pattern_skips_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "keep/Noisia - Stigma.mp3");
        touch(dir.path(), "samples/Kick 01.wav");
        touch(dir.path(), "keep/Noisia - Stigma (preview).mp3");

        let scanner = FileScanner::new(dir.path(), Some(r"^samples|\(preview\)")).unwrap();

        assert_eq!(scanner.scan().unwrap(), vec!["Noisia - Stigma".to_string()]);
    }

    #[test]
    fn missing_source_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = FileScanner::new(dir.path().join("nope"), None).unwrap();

        assert!(matches!(
            scanner.scan(),
            Err(Error::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn file_source_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "track.mp3");
        let scanner = FileScanner::new(dir.path().join("track.mp3"), None).unwrap();

        assert!(matches!(
            scanner.scan(),
            Err(Error::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn invalid_ignore_pattern_is_rejected() {
        assert!(matches!(
            FileScanner::new("/music", Some("([")),
            Err(Error::InvalidPattern(_))
        ));
    }
}
