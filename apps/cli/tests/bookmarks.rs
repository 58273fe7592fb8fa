use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn bookmarks_toggle_list_next_and_clear() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let store = dir.path().join("bookmarks.db");
    let file = dir.path().join("page.html");
    fs::write(&file, "one\ntwo\nthree\nfour\nfive")?;
    let file = fs::canonicalize(&file)?;
    let file_arg = file.to_str().unwrap();
    let store_arg = store.to_str().unwrap();

    for line in ["2", "4"] {
        Command::cargo_bin("htmlpad-cli")?
            .args(["bookmarks", "--store", store_arg, "toggle", file_arg, line])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "Bookmark set at {}:{line}",
                file.display()
            )));
    }

    Command::cargo_bin("htmlpad-cli")?
        .args(["bookmarks", "--store", store_arg, "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{}: 2, 4", file.display())));

    Command::cargo_bin("htmlpad-cli")?
        .args(["bookmarks", "--store", store_arg, "next", file_arg, "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{}:2", file.display())));

    Command::cargo_bin("htmlpad-cli")?
        .args(["bookmarks", "--store", store_arg, "toggle", file_arg, "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bookmark removed"));

    Command::cargo_bin("htmlpad-cli")?
        .args(["bookmarks", "--store", store_arg, "clear", file_arg])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared bookmarks"));

    Command::cargo_bin("htmlpad-cli")?
        .args(["bookmarks", "--store", store_arg, "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No bookmarks."));

    Ok(())
}

#[test]
fn bookmarks_reject_missing_files_and_zero_lines() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let store = dir.path().join("bookmarks.db");
    let file = dir.path().join("page.html");
    fs::write(&file, "x")?;

    Command::cargo_bin("htmlpad-cli")?
        .args([
            "bookmarks",
            "--store",
            store.to_str().unwrap(),
            "toggle",
            file.to_str().unwrap(),
            "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("one-based"));

    Command::cargo_bin("htmlpad-cli")?
        .args([
            "bookmarks",
            "--store",
            store.to_str().unwrap(),
            "toggle",
            dir.path().join("missing.html").to_str().unwrap(),
            "1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));

    Ok(())
}
