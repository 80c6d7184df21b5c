//! Utility functions for file discovery and collision-free naming

use crate::config::FileCollisionAction;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Find the first `name (n).ext` variant of `file_name` that `is_taken` rejects.
///
/// Returns `file_name` itself when it is free, `None` when every attempt is taken.
///
/// # Examples
///
/// ```
/// use photo_sorter::utils::unique_file_name;
///
/// let taken = ["IMG_0001.jpg", "IMG_0001 (1).jpg"];
/// let name = unique_file_name("IMG_0001.jpg", |n| taken.contains(&n));
/// assert_eq!(name.as_deref(), Some("IMG_0001 (2).jpg"));
/// ```
pub fn unique_file_name(file_name: &str, is_taken: impl Fn(&str) -> bool) -> Option<String> {
    if !is_taken(file_name) {
        return Some(file_name.to_string());
    }

    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let extension = path.extension().and_then(|e| e.to_str());

    (1..=MAX_RENAME_ATTEMPTS)
        .map(|i| match extension {
            Some(ext) => format!("{} ({}).{}", stem, i, ext),
            None => format!("{} ({})", stem, i),
        })
        .find(|candidate| !is_taken(candidate))
}

/// Get a unique path for a file, handling collisions with existing files
///
/// # Arguments
///
/// * `path` - The desired file path
/// * `action` - How to handle file collisions
///
/// # Returns
///
/// Returns the final path to use. For Rename action, this may have a suffix added.
/// For Skip action, returns an error if the file already exists.
/// For Overwrite action, returns the original path unchanged.
///
/// # Examples
///
/// ```
/// use photo_sorter::utils::get_unique_path;
/// use photo_sorter::config::FileCollisionAction;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/photo-sorter-doc/IMG_0001.jpg");
/// let unique = get_unique_path(path, FileCollisionAction::Rename).unwrap();
/// // If IMG_0001.jpg exists, returns IMG_0001 (1).jpg
/// // If that exists too, returns IMG_0001 (2).jpg, etc.
/// ```
pub fn get_unique_path(path: &Path, action: FileCollisionAction) -> Result<PathBuf> {
    match action {
        FileCollisionAction::Overwrite => Ok(path.to_path_buf()),
        FileCollisionAction::Skip => {
            if path.exists() {
                return Err(Error::FileCollision {
                    path: path.to_path_buf(),
                    reason: "file already exists and collision action is Skip".to_string(),
                });
            }
            Ok(path.to_path_buf())
        }
        FileCollisionAction::Rename => {
            if !path.exists() {
                return Ok(path.to_path_buf());
            }

            let file_name = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
                Error::InvalidPath {
                    path: path.to_path_buf(),
                    reason: "cannot extract file name".to_string(),
                }
            })?;
            let parent = path.parent().ok_or_else(|| Error::InvalidPath {
                path: path.to_path_buf(),
                reason: "cannot extract parent directory".to_string(),
            })?;

            unique_file_name(file_name, |candidate| parent.join(candidate).exists())
                .map(|name| parent.join(name))
                .ok_or_else(|| Error::FileCollision {
                    path: path.to_path_buf(),
                    reason: format!(
                        "could not find unique filename after {MAX_RENAME_ATTEMPTS} attempts"
                    ),
                })
        }
    }
}

/// Recursively collect image files under `root` with a known extension.
///
/// Extensions are compared case-insensitively and without a leading dot.
/// The result is sorted so repeated runs partition identically.
pub fn discover_images(root: &Path, known_extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::InvalidPath {
            path: root.to_path_buf(),
            reason: "input directory does not exist".to_string(),
        });
    }

    let extensions: Vec<&str> = known_extensions
        .iter()
        .map(|ext| ext.trim().trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .collect();

    let mut images = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => Error::Io(io),
            None => Error::InvalidPath {
                path: root.to_path_buf(),
                reason: "filesystem loop while walking input directory".to_string(),
            },
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let known = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|k| k.eq_ignore_ascii_case(ext)));
        if known {
            images.push(entry.into_path());
        }
    }
    images.sort();
    Ok(images)
}
