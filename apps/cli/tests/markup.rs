use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn tags_lists_every_token_with_its_kind() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("page.html");
    fs::write(&file, "<div><p>hi</p><br/></div>")?;

    Command::cargo_bin("htmlpad-cli")?
        .args(["tags", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("0..5\tdiv\topen")
                .and(predicate::str::contains("10..14\tp\tclose"))
                .and(predicate::str::contains("14..19\tbr\tself-closing"))
                .and(predicate::str::contains("5 tags")),
        );

    Ok(())
}

#[test]
fn tags_json_output_is_an_array() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("page.html");
    fs::write(&file, "<b>x</b>")?;

    let output = Command::cargo_bin("htmlpad-cli")?
        .args(["tags", "--json", file.to_str().unwrap()])
        .output()?;
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let entries = value.as_array().expect("array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["kind"], "close");
    assert_eq!(entries[1]["start"], 4);

    Ok(())
}

#[test]
fn match_by_offset_reports_both_spans() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("page.html");
    fs::write(&file, "<div><p>hi</p></div>")?;

    Command::cargo_bin("htmlpad-cli")?
        .args(["match", file.to_str().unwrap(), "--offset", "6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pair <p>: 5..8 10..14"));

    Ok(())
}

#[test]
fn match_by_line_and_column_is_one_based() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("page.html");
    fs::write(&file, "<ul>\n<li>a</li>\n</ul>")?;

    Command::cargo_bin("htmlpad-cli")?
        .args([
            "match",
            file.to_str().unwrap(),
            "--line",
            "3",
            "--column",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("pair <ul>: 0..4 16..21"));

    Ok(())
}

#[test]
fn match_reports_unmatched_and_missing_tags() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("page.html");
    fs::write(&file, "<br> text")?;

    Command::cargo_bin("htmlpad-cli")?
        .args(["match", file.to_str().unwrap(), "--offset", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no partner for <br> at 0..4"));

    Command::cargo_bin("htmlpad-cli")?
        .args(["match", file.to_str().unwrap(), "--offset", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no tag at cursor"));

    Command::cargo_bin("htmlpad-cli")?
        .args(["match", file.to_str().unwrap(), "--offset", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("past the end of the document"));

    Ok(())
}

#[test]
fn audit_walks_directories_and_fails_on_errors() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("a.html"), "<h1>T</h1>\n<img src=\"x.png\">")?;
    fs::write(dir.path().join("b.htm"), "<h1>Fine</h1>")?;
    fs::write(dir.path().join("notes.txt"), "<img>")?;

    Command::cargo_bin("htmlpad-cli")?
        .args(["audit", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stdout(
            predicate::str::contains("a.html:2:1: error: img element has no alt attribute")
                .and(predicate::str::contains("Checked 2 files: 1 findings (1 errors)")),
        )
        .stderr(predicate::str::contains("1 error-level findings"));

    Ok(())
}

#[test]
fn audit_succeeds_when_only_warnings_are_found() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("page.html");
    fs::write(&file, "<h2>Intro</h2><img alt=\"\" src=\"y.png\"><div role=\"banana\"></div>")?;

    Command::cargo_bin("htmlpad-cli")?
        .args(["audit", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("warning: first heading is h2, expected h1")
                .and(predicate::str::contains("unknown ARIA role \"banana\""))
                .and(predicate::str::contains("(0 errors)")),
        );

    Ok(())
}
