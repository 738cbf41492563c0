//! FFmpeg discovery hints.
//!
//! `ffmpeg-sys-next` does the actual probing. This script only explains what
//! to set when the usual locations are empty, since a failed link is far
//! less readable than a warning.

use std::env;
use std::path::{Path, PathBuf};

const WATCHED_VARIABLES: &[&str] = &["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET", "PKG_CONFIG_PATH"];

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    match env::var("CARGO_CFG_TARGET_OS").unwrap_or_default().as_str() {
        "windows" => hint_vcpkg(),
        "macos" => hint_homebrew(),
        _ => {}
    }
}

fn hint_vcpkg() {
    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        warn("FFMPEG_DIR is not set. Install FFmpeg with vcpkg and point FFMPEG_DIR at it.");
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let install = PathBuf::from(vcpkg_root).join("installed").join(triplet);
    if install.join("include").join("libavcodec").is_dir() {
        warn(&format!(
            "Found FFmpeg under {}; set FFMPEG_DIR to that path to pin it.",
            install.display()
        ));
    } else {
        warn(&format!("No FFmpeg headers under {}.", install.display()));
    }
}

fn hint_homebrew() {
    let prefixes = [Path::new("/opt/homebrew/opt/ffmpeg"), Path::new("/usr/local/opt/ffmpeg")];
    let found = prefixes.iter().find(|prefix| prefix.join("lib").is_dir());
    if let Some(prefix) = found {
        if env::var_os("PKG_CONFIG_PATH").is_none() {
            warn(&format!(
                "Homebrew FFmpeg at {}; export PKG_CONFIG_PATH={}/lib/pkgconfig if linking fails.",
                prefix.display(),
                prefix.display()
            ));
        }
    }
}

fn warn(message: &str) {
    println!("cargo:warning={message}");
}
