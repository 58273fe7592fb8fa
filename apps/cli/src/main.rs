use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use htmlpad_core::{DocumentOptions, HtmlDocument};
use htmlpad_markup::{MatchOutcome, Severity};
use htmlpad_settings::{BookmarkStore, Preferences, PreferencesStore, SnippetStore};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "htmlpad-cli",
    about = "Markup utilities for HtmlPad editors",
    author,
    version
)]
struct Cli {
    /// 偏好設定檔；略過時使用預設值。 / Preferences file (defaults are used when omitted).
    #[arg(long, global = true, value_name = "PATH")]
    preferences: Option<PathBuf>,
    /// 日誌層級，`RUST_LOG` 優先。 / Log level; `RUST_LOG` takes precedence.
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出文件中的標籤。 / List the tags found in a document.
    Tags(TagsArgs),
    /// 尋找游標下的標籤配對。 / Find the tag under a cursor and its partner.
    Match(MatchArgs),
    /// 列出可折疊區段。 / List foldable regions, optionally showing a collapsed view.
    Folds(FoldsArgs),
    /// 檢查標題、替代文字與 ARIA。 / Check headings, alt text, ARIA and tag balance.
    Audit(AuditArgs),
    /// 管理書籤。 / Manage persisted bookmarks.
    Bookmarks(BookmarksArgs),
    /// 展開或列出程式碼片段。 / Expand a built-in snippet, or list them.
    Snippet(SnippetArgs),
}

#[derive(Args)]
struct TagsArgs {
    file: PathBuf,
    /// 以 JSON 輸出。 / Emit JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct MatchArgs {
    file: PathBuf,
    /// 字元位移（從 0 起算）。 / Character offset (zero-based).
    #[arg(long, conflicts_with_all = ["line", "column"])]
    offset: Option<usize>,
    /// 行號（從 1 起算）。 / Line number (one-based).
    #[arg(long, requires = "column")]
    line: Option<usize>,
    /// 欄號（從 1 起算）。 / Column number (one-based).
    #[arg(long, requires = "line")]
    column: Option<usize>,
}

#[derive(Args)]
struct FoldsArgs {
    file: PathBuf,
    /// 折疊指定縮排層級後顯示。 / Collapse regions at this indentation level and print the view.
    #[arg(long, value_name = "LEVEL", conflicts_with = "collapse_all")]
    collapse_level: Option<usize>,
    /// 折疊全部後顯示。 / Collapse every region and print the view.
    #[arg(long)]
    collapse_all: bool,
}

#[derive(Args)]
struct AuditArgs {
    /// 檔案或資料夾；資料夾會遞迴尋找 .html/.htm。 / Files or directories (searched for .html/.htm).
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct BookmarksArgs {
    /// 書籤儲存檔。 / Bookmark store file.
    #[arg(long, value_name = "PATH")]
    store: PathBuf,
    #[command(subcommand)]
    action: BookmarkAction,
}

#[derive(Args)]
struct SnippetArgs {
    /// 觸發字；略過時列出全部。 / Trigger word; lists every snippet when omitted.
    trigger: Option<String>,
    /// 後續行的縮排空白數。 / Spaces prepended to continuation lines.
    #[arg(long, default_value_t = 0)]
    indent: usize,
    /// 以 JSON 輸出展開結果與游標。 / Emit the expansion and caret offset as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum BookmarkAction {
    /// 列出所有書籤。 / List every bookmark.
    List,
    /// 切換書籤（行號從 1 起算）。 / Toggle a bookmark (one-based line).
    Toggle { file: PathBuf, line: usize },
    /// 跳至下一個書籤。 / Print the next bookmark after a line, wrapping around.
    Next { file: PathBuf, line: usize },
    /// 清除檔案的書籤。 / Remove every bookmark of a file.
    Clear { file: PathBuf },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        preferences,
        log_level,
        command,
    } = Cli::parse();
    let preferences = load_preferences(preferences.as_deref())?;
    init_logging(log_level.as_deref().unwrap_or(&preferences.logging.level));
    let options = preferences.editor.document_options();

    match command {
        Commands::Tags(args) => execute_tags(args, options),
        Commands::Match(args) => execute_match(args, options),
        Commands::Folds(args) => execute_folds(args, options),
        Commands::Audit(args) => execute_audit(args, options),
        Commands::Bookmarks(args) => execute_bookmarks(args, options),
        Commands::Snippet(args) => execute_snippet(args),
    }
}

fn load_preferences(path: Option<&Path>) -> Result<Preferences> {
    match path {
        Some(path) => Ok(PreferencesStore::load(path)?.preferences().clone()),
        None => {
            let mut preferences = Preferences::default();
            preferences.sanitize();
            Ok(preferences)
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_document(path: &Path, options: DocumentOptions) -> Result<HtmlDocument> {
    HtmlDocument::open(path, options).with_context(|| format!("failed to open {}", path.display()))
}

fn execute_tags(args: TagsArgs, options: DocumentOptions) -> Result<()> {
    let doc = open_document(&args.file, options)?;
    let tokens = doc.tags().tokens();
    if args.json {
        let entries: Vec<_> = tokens
            .iter()
            .map(|token| {
                json!({
                    "start": token.start_offset,
                    "end": token.end_offset,
                    "name": token.name,
                    "kind": token.kind().label(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for token in tokens {
        println!(
            "{}..{}\t{}\t{}",
            token.start_offset,
            token.end_offset,
            token.name,
            token.kind().label()
        );
    }
    println!("{} tags", tokens.len());
    Ok(())
}

fn execute_match(args: MatchArgs, options: DocumentOptions) -> Result<()> {
    let doc = open_document(&args.file, options)?;
    let offset = match (args.offset, args.line, args.column) {
        (Some(offset), _, _) => offset,
        (None, Some(line), Some(column)) => {
            if line == 0 || column == 0 {
                bail!("--line and --column are one-based");
            }
            doc.line_index()
                .offset_of(line - 1, column - 1)
                .ok_or_else(|| anyhow!("line {line}, column {column} is outside the document"))?
        }
        _ => bail!("provide --offset or both --line and --column"),
    };
    if offset > doc.char_len() {
        bail!(
            "offset {offset} is past the end of the document ({} characters)",
            doc.char_len()
        );
    }

    match doc.match_at(offset) {
        MatchOutcome::NoTagAtCursor => println!("no tag at cursor"),
        MatchOutcome::SelfClosing(token) => println!(
            "self-closing <{}> at {}..{}; no partner",
            token.name, token.start_offset, token.end_offset
        ),
        MatchOutcome::Unmatched(token) => println!(
            "no partner for {} at {}..{}",
            token.raw_text, token.start_offset, token.end_offset
        ),
        MatchOutcome::Paired { pair, .. } => println!(
            "pair <{}>: {}..{} {}..{}",
            pair.name(),
            pair.opening.start_offset,
            pair.opening.end_offset,
            pair.closing.start_offset,
            pair.closing.end_offset
        ),
    }
    Ok(())
}

fn execute_folds(args: FoldsArgs, options: DocumentOptions) -> Result<()> {
    let mut doc = open_document(&args.file, options)?;
    if doc.regions().is_empty() {
        println!("No foldable regions.");
        return Ok(());
    }

    for region in doc.regions().values() {
        println!(
            "{}-{}\tindent {}",
            region.start_line + 1,
            region.end_line + 1,
            region.indent
        );
    }

    let folded = if args.collapse_all {
        doc.fold_all()
    } else if let Some(level) = args.collapse_level {
        doc.fold_at_level(level)
    } else {
        return Ok(());
    };
    debug!(folded, "collapsed view");

    println!();
    let lines: Vec<&str> = doc.text().split('\n').collect();
    for line in doc.visible_lines() {
        let content = lines.get(line).copied().unwrap_or("").trim_end_matches('\r');
        match doc.folds().collapsed().find(|region| region.start_line == line) {
            Some(region) => println!(
                "{:>4} {} … ({} lines)",
                line + 1,
                content,
                region.hidden_len()
            ),
            None => println!("{:>4} {}", line + 1, content),
        }
    }
    Ok(())
}

fn execute_audit(args: AuditArgs, options: DocumentOptions) -> Result<()> {
    let targets = collect_markup_files(&args.paths);
    if targets.is_empty() {
        println!("No HTML files to audit.");
        return Ok(());
    }

    let mut errors = 0;
    let mut total = 0;
    let mut report = Vec::new();
    for path in &targets {
        let doc = match open_document(path, options) {
            Ok(doc) => doc,
            Err(err) => {
                eprintln!("warning: {err:#}");
                continue;
            }
        };
        for finding in doc.audit() {
            let line = doc.line_of_offset(finding.offset);
            let column = finding.offset - doc.line_index().line_start(line).unwrap_or(0);
            total += 1;
            if finding.severity() == Severity::Error {
                errors += 1;
            }
            if args.json {
                report.push(json!({
                    "path": path.display().to_string(),
                    "line": line + 1,
                    "column": column + 1,
                    "severity": finding.severity().label(),
                    "message": finding.message(),
                }));
            } else {
                println!(
                    "{}:{}:{}: {}: {}",
                    path.display(),
                    line + 1,
                    column + 1,
                    finding.severity().label(),
                    finding.message()
                );
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Checked {} files: {} findings ({} errors)",
            targets.len(),
            total,
            errors
        );
    }
    if errors > 0 {
        bail!("{errors} error-level findings");
    }
    Ok(())
}

fn collect_markup_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                match entry {
                    Ok(entry) => {
                        if entry.file_type().is_file() && is_markup_file(entry.path()) {
                            files.push(entry.path().to_path_buf());
                        }
                    }
                    Err(err) => {
                        eprintln!("warning: {}: {}", path.display(), err);
                    }
                }
            }
        } else {
            eprintln!("warning: {} does not exist", path.display());
        }
    }
    files
}

fn is_markup_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
        .unwrap_or(false)
}

fn execute_bookmarks(args: BookmarksArgs, options: DocumentOptions) -> Result<()> {
    let mut store = BookmarkStore::load(&args.store)
        .with_context(|| format!("failed to load bookmarks from {}", args.store.display()))?;

    match args.action {
        BookmarkAction::List => {
            if store.bookmarks().is_empty() {
                println!("No bookmarks.");
            }
            for (file, manager) in store.bookmarks().files() {
                let lines: Vec<String> = manager.iter().map(|line| (line + 1).to_string()).collect();
                println!("{}: {}", file.display(), lines.join(", "));
            }
        }
        BookmarkAction::Toggle { file, line } => {
            let line = one_based(line)?;
            let file = resolve_file(&file)?;
            let now_set = store.toggle(&file, line)?;
            let verb = if now_set { "set" } else { "removed" };
            println!("Bookmark {verb} at {}:{}", file.display(), line + 1);
        }
        BookmarkAction::Next { file, line } => {
            let line = one_based(line)?;
            let file = resolve_file(&file)?;
            let doc = open_document(&file, options)?;
            match store
                .bookmarks()
                .next_after(&file, line, doc.line_count())
            {
                Some(next) => println!("{}:{}", file.display(), next + 1),
                None => println!("No bookmarks in {}", file.display()),
            }
        }
        BookmarkAction::Clear { file } => {
            let file = resolve_file(&file)?;
            if store.clear_file(&file)? {
                println!("Cleared bookmarks for {}", file.display());
            } else {
                println!("No bookmarks for {}", file.display());
            }
        }
    }
    Ok(())
}

fn execute_snippet(args: SnippetArgs) -> Result<()> {
    let store = SnippetStore::builtin();
    let Some(trigger) = args.trigger else {
        for entry in store.entries() {
            println!(
                "{}\t{}",
                entry.trigger,
                entry.description.as_deref().unwrap_or("")
            );
        }
        return Ok(());
    };

    let snippet = store
        .find(&trigger, Some("html"))
        .ok_or_else(|| anyhow!("unknown snippet trigger \"{trigger}\""))?;
    let expansion = snippet.expand(&" ".repeat(args.indent));
    if args.json {
        let value = json!({ "text": expansion.text, "cursor": expansion.cursor });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", expansion.text);
    }
    Ok(())
}

fn one_based(line: usize) -> Result<usize> {
    line.checked_sub(1)
        .ok_or_else(|| anyhow!("line numbers are one-based"))
}

fn resolve_file(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).with_context(|| format!("{} does not exist", path.display()))
}
