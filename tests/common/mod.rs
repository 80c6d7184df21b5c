//! Common test utilities for photo-sorter integration tests
//!
//! The pipeline is driven against a shell script standing in for exiftool. It
//! reads the `-@` argument file and reports, for each listed image, the file's
//! contents as its `DateTimeOriginal` (no tag when the file is empty). Images
//! named `*hang*` make it stall and `*corrupt*` make it fail with an error on
//! stderr.

#![allow(dead_code)]

use photo_sorter::config::{Config, FileCollisionAction};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Flags written to the test args template
pub const ARGS_TEMPLATE: &str = "-json\n-long\n-D\n-e\n-charset\nfilename=utf8\n";

const FAKE_EXIFTOOL: &str = r#"#!/bin/sh
args="$2"
first=1
failed=0
count=0
printf '['
while IFS= read -r line; do
  case "$line" in -*|*=*|'') continue ;; esac
  case "$line" in
    *hang*) exec sleep 30 ;;
    *corrupt*) echo "Error: File format error - $line" >&2; failed=1; continue ;;
  esac
  date=$(cat "$line")
  [ "$first" -eq 1 ] || printf ','
  first=0
  count=$((count + 1))
  if [ -n "$date" ]; then
    printf '{"SourceFile": "%s", "DateTimeOriginal": {"id": 36867, "val": "%s"}}\n' "$line" "$date"
  else
    printf '{"SourceFile": "%s", "FileType": {"id": 0, "val": "JPEG"}}\n' "$line"
  fi
done < "$args"
printf ']\n'
if [ "$failed" -eq 1 ]; then
  echo "    1 files could not be read" >&2
else
  echo "    $count image files read" >&2
fi
"#;

/// Scratch layout for one test: input images, output tree, temp dir and tool
pub struct Sandbox {
    _dir: TempDir,
    /// Directory holding the source images
    pub input: PathBuf,
    /// Root of the sorted output tree
    pub output: PathBuf,
    /// Directory for argument files
    pub temp: PathBuf,
    /// Path of the fake exiftool script
    pub tool: PathBuf,
    /// Path of the args template
    pub template: PathBuf,
}

impl Sandbox {
    /// Create the directories, the args template and the fake tool
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let input = root.join("in");
        let output = root.join("out");
        let temp = root.join("tmp");
        fs::create_dir_all(&input).unwrap();
        fs::create_dir_all(&temp).unwrap();

        let template = root.join("input.arg");
        fs::write(&template, ARGS_TEMPLATE).unwrap();

        let tool = root.join("fake-exiftool");
        fs::write(&tool, FAKE_EXIFTOOL).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        Self {
            _dir: dir,
            input,
            output,
            temp,
            tool,
            template,
        }
    }

    /// Config pointing at the fake tool with a short timeout
    pub fn config(&self, chunk_size: u16, parallelism: usize) -> Config {
        let mut config = Config::default();
        config.tool.exiftool_path = Some(self.tool.clone());
        config.tool.search_path = false;
        config.tool.args_template = self.template.clone();
        config.tool.temp_dir = self.temp.clone();
        config.tool.timeout = Duration::from_secs(2);
        config.batch.chunk_size = chunk_size;
        config.batch.parallelism = Some(parallelism);
        config.distribution.output_dir = self.output.clone();
        config.distribution.file_collision = FileCollisionAction::Rename;
        config
    }

    /// Write an image whose reported capture date is `date` (empty for none)
    pub fn image(&self, relative: &str, date: &str) -> PathBuf {
        let path = self.input.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, date).unwrap();
        path
    }

    /// Argument files currently present in the temp dir
    pub fn leftover_args_files(&self) -> Vec<PathBuf> {
        list_files(&self.temp)
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("input.arg.tmp_"))
            })
            .collect()
    }
}

/// Sorted file names directly inside `dir` (empty if it does not exist)
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = list_files(dir)
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
        .collect();
    names.sort();
    names
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect(),
        Err(_) => Vec::new(),
    }
}
