#![allow(clippy::all)]

use std::env;
use std::path::{Path, PathBuf};

const MIN_VERSION: &str = "1.5.0";

/// Expected location of a `whisper.cpp` checkout (a git submodule in a
/// real deployment of this crate; not vendored into this exercise's tree)
/// used only when no system `libwhisper` can be located.
const VENDORED_CHECKOUT: &str = "vendor/whisper.cpp";

fn main() {
    println!("cargo:rerun-if-env-changed=WHISPER_INCLUDE_DIR");
    println!("cargo:rerun-if-env-changed=WHISPER_LIB_DIR");
    println!("cargo:rerun-if-env-changed=WHISPER_BUNDLE_DIR");
    println!("cargo:rerun-if-changed={VENDORED_CHECKOUT}");

    if let Some((include, lib)) = bundled_paths() {
        println!("cargo:rustc-link-search=native={}", lib.display());
        println!("cargo:rustc-link-lib=whisper");
        println!("cargo:include={}", include.display());
        return;
    }

    if let Ok(whisper) = pkg_config::Config::new()
        .atleast_version(MIN_VERSION)
        .probe("whisper")
    {
        for path in &whisper.link_paths {
            println!("cargo:rustc-link-search=native={}", path.display());
        }
        for lib in &whisper.libs {
            println!("cargo:rustc-link-lib={lib}");
        }
        return;
    }

    if let Some(lib_dir) = env::var_os("WHISPER_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", PathBuf::from(lib_dir).display());
        println!("cargo:rustc-link-lib=whisper");
        return;
    }

    if Path::new(VENDORED_CHECKOUT).join("include/whisper.h").exists() {
        compile_vendored();
        return;
    }

    panic!(
        "no system `whisper` found via pkg-config, WHISPER_LIB_DIR/WHISPER_BUNDLE_DIR not set, \
         and no vendored checkout at {VENDORED_CHECKOUT}. Install libwhisper (e.g. via your \
         package manager or the upstream ggerganov/whisper.cpp build), point WHISPER_LIB_DIR/\
         WHISPER_INCLUDE_DIR at it, or initialize the whisper.cpp submodule at {VENDORED_CHECKOUT}."
    );
}

fn bundled_paths() -> Option<(PathBuf, PathBuf)> {
    let root = env::var_os("WHISPER_BUNDLE_DIR").map(PathBuf::from)?;
    let include = root.join("include");
    let lib = root.join("lib");
    if include.join("whisper.h").exists() && lib.exists() {
        Some((include, lib))
    } else {
        None
    }
}

/// Compile the vendored `whisper.cpp`/`ggml` sources directly into this
/// crate, the path taken when no packaged `libwhisper` is available
/// (mirrors `whisper-rs`'s bundled-build mode).
fn compile_vendored() {
    let root = Path::new(VENDORED_CHECKOUT);
    cc::Build::new()
        .cpp(true)
        .std("c++17")
        .include(root.join("include"))
        .include(root.join("ggml/include"))
        .file(root.join("src/whisper.cpp"))
        .warnings(false)
        .compile("vellum-whisper-vendored");
}
