use crate::*;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn install() -> Installation {
    Installation {
        libdir: "../lib".to_string(),
        includedir: "../include".to_string(),
        compdir: "../lib/cmake/renormalize".to_string(),
        libname: "renormalize".to_string(),
        version: "1.2.3".to_string(),
        bindir: ".".to_string(),
        ldflags: "-L<LIBDIR> -lrenormalize -Wl,-rpath,<LIBDIR>".to_string(),
        cflags: "-I<INCLUDEDIR>".to_string(),
    }
}

// -------------------- Choice parsing --------------------

#[test]
fn choices_parse_case_insensitively() -> Result<()> {
    assert_eq!("libdir".parse::<Show>()?, Show::LibDir);
    assert_eq!("LDFLAGS".parse::<Show>()?, Show::LdFlags);
    assert_eq!("IncludeDir".parse::<Show>()?, Show::IncludeDir);
    Ok(())
}

#[test]
fn every_choice_parses_from_its_name() -> Result<()> {
    for choice in Show::ALL {
        assert_eq!(choice.to_string().parse::<Show>()?, choice);
        assert!(Show::CHOICES.contains(choice.name()));
    }
    Ok(())
}

#[test]
fn unknown_choice_is_rejected() {
    let err = "libraries".parse::<Show>().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidChoice(ref s) if s == "libraries"));
    assert!(err.to_string().contains("libdir, includedir"));
}

// -------------------- Resolution --------------------

#[test]
fn names_are_returned_verbatim() {
    let exe_dir = Path::new("/opt/renormalize/bin");
    assert_eq!(install().lookup(Show::LibName, exe_dir), "renormalize");
    assert_eq!(install().lookup(Show::Version, exe_dir), "1.2.3");
}

#[test]
fn directories_resolve_against_the_executable() {
    // Nothing under this prefix exists, so resolution is purely lexical.
    let exe_dir = Path::new("/nonexistent-prefix/bin");
    let install = install();
    assert_eq!(install.lookup(Show::LibDir, exe_dir), "/nonexistent-prefix/lib");
    assert_eq!(
        install.lookup(Show::CompDir, exe_dir),
        "/nonexistent-prefix/lib/cmake/renormalize"
    );
    assert_eq!(install.lookup(Show::BinDir, exe_dir), "/nonexistent-prefix/bin");
}

#[test]
fn flags_get_every_placeholder_replaced() {
    let exe_dir = Path::new("/nonexistent-prefix/bin");
    let install = install();
    assert_eq!(
        install.lookup(Show::LdFlags, exe_dir),
        "-L/nonexistent-prefix/lib -lrenormalize -Wl,-rpath,/nonexistent-prefix/lib"
    );
    assert_eq!(
        install.lookup(Show::CFlags, exe_dir),
        "-I/nonexistent-prefix/include"
    );
}

#[test]
fn existing_directories_are_canonicalized() -> Result<()> {
    let dir = tempdir()?;
    fs::create_dir_all(dir.path().join("bin"))?;
    fs::create_dir_all(dir.path().join("lib"))?;

    let resolved = installation_path(&dir.path().join("bin"), "../lib");
    assert_eq!(resolved, dir.path().join("lib").canonicalize()?);
    Ok(())
}

#[test]
fn lexical_normalization_keeps_leading_parents() {
    assert_eq!(
        installation_path(Path::new("no-such-dir/bin"), "../../../lib"),
        PathBuf::from("../lib")
    );
    assert_eq!(
        installation_path(Path::new("/"), "../lib/./x"),
        PathBuf::from("/lib/x")
    );
}

#[test]
fn executable_dir_contains_the_test_binary() -> Result<()> {
    let dir = executable_dir()?;
    let exe = std::env::current_exe()?.canonicalize()?;
    assert_eq!(exe.parent(), Some(dir.as_path()));
    Ok(())
}

// -------------------- Environment --------------------

#[test]
fn env_or_falls_back_to_default() {
    assert_eq!(
        env_or("RENORMALIZE_TEST_SURELY_UNSET_VARIABLE", "fallback"),
        "fallback"
    );
}
