//! Shared helpers for the integration tests.
//!
//! `fixtures/xkb` is a small Xkb database laid out like xkeyboard-config,
//! and `fixtures/keysymdef.h` lists every keysym it uses.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use xkbrev::{DatabasePaths, LayoutRequest};

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

pub fn xkb_root() -> PathBuf {
    fixtures_dir().join("xkb")
}

pub fn keysymdef() -> PathBuf {
    fixtures_dir().join("keysymdef.h")
}

pub fn fixture_paths() -> DatabasePaths {
    DatabasePaths::new(xkb_root(), keysymdef())
}

pub fn request(layout: &str, variant: Option<&str>, options: &[&str]) -> LayoutRequest {
    let mut request = LayoutRequest::new("pc105", layout);
    if let Some(variant) = variant {
        request = request.with_variant(variant);
    }
    for option in options {
        request = request.with_option(option);
    }
    request
}

/// Write a throwaway database; each entry is `(relative path, contents)`
pub fn temp_database(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (path, contents) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).expect("Failed to write fixture");
    }
    dir
}

/// Body of one `[section]` of an XRDP keymap, without the header
pub fn xrdp_section<'a>(document: &'a str, name: &str) -> Vec<&'a str> {
    let header = format!("[{}]", name);
    document
        .lines()
        .skip_while(|line| *line != header)
        .skip(1)
        .take_while(|line| !line.is_empty())
        .collect()
}

/// Value of `Key<scancode>` in one section
pub fn xrdp_entry<'a>(document: &'a str, section: &str, scancode: u32) -> Option<&'a str> {
    let prefix = format!("Key{}=", scancode);
    xrdp_section(document, section)
        .into_iter()
        .find_map(|line| line.strip_prefix(prefix.as_str()))
}
