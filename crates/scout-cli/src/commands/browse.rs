//! Browse command - a line-oriented interactive shell over a `Browser`.

use crate::app::{print_entries, wait_with_progress};
use scout_core::{BuildOutcome, Browser, Config, DirectoryEnumerator, FsEnumerator};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Results shown per listing or search
const PAGE_SIZE: usize = 50;

/// How long to wait for a search before giving up on printing it
const SEARCH_TIMEOUT: Duration = Duration::from_secs(60);

const HELP: &str = "\
Commands:
  cd <dir>      Change directory (relative or absolute)
  up            Go to the parent directory
  back          Go back in history
  forward       Go forward in history
  ls            List the current directory
  find <query>  Search (e.g. 'report ext:pdf', '*.rs', 'size:>1MB')
  index         Index the current directory if not already indexed
  reindex       Re-index the current directory from scratch
  pwd           Show the current directory and index status
  help          Show this help
  quit          Exit";

/// A parsed shell line.
#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Cd(String),
    Up,
    Back,
    Forward,
    List,
    Find(String),
    Index,
    Reindex,
    Pwd,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ShellCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_lowercase().as_str() {
            "" => ShellCommand::Empty,
            "cd" if rest.is_empty() => ShellCommand::Unknown("cd needs a directory".to_string()),
            "cd" => ShellCommand::Cd(rest.to_string()),
            "up" | ".." => ShellCommand::Up,
            "back" | "b" => ShellCommand::Back,
            "forward" | "f" => ShellCommand::Forward,
            "ls" | "dir" => ShellCommand::List,
            "find" | "search" | "/" => ShellCommand::Find(rest.to_string()),
            "index" => ShellCommand::Index,
            "reindex" => ShellCommand::Reindex,
            "pwd" => ShellCommand::Pwd,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => ShellCommand::Unknown(format!("Unknown command: {}", other)),
        }
    }
}

/// Run the browse command.
pub fn run(config: Config, root: Option<PathBuf>) -> anyhow::Result<()> {
    let enumerator: Arc<dyn DirectoryEnumerator> = Arc::new(FsEnumerator::new());
    let start = root.unwrap_or_else(|| config.root_path());
    let mut browser = Browser::open_at(&config, enumerator, start)?;

    println!("Scout - type 'help' for commands");
    show_results(&browser);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{}> ", browser.current_dir().display());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };

        match ShellCommand::parse(&line?) {
            ShellCommand::Empty => {}
            ShellCommand::Cd(dir) => match browser.navigate_to(&dir) {
                Ok(()) => show_results(&browser),
                Err(e) => eprintln!("{}", e),
            },
            ShellCommand::Up => {
                if browser.go_up() {
                    show_results(&browser);
                } else {
                    eprintln!("Already at the top");
                }
            }
            ShellCommand::Back => {
                if browser.go_back() {
                    show_results(&browser);
                } else {
                    eprintln!("Nothing to go back to");
                }
            }
            ShellCommand::Forward => {
                if browser.go_forward() {
                    show_results(&browser);
                } else {
                    eprintln!("Nothing to go forward to");
                }
            }
            ShellCommand::List => {
                browser.set_query("");
                show_results(&browser);
            }
            ShellCommand::Find(query) => {
                browser.set_query(&query);
                show_results(&browser);
            }
            ShellCommand::Index => {
                let progress = browser.store().subscribe_progress();
                let outcome = wait_with_progress(browser.ensure_index()?, &progress, false)?;
                report_build(&browser, outcome);
            }
            ShellCommand::Reindex => {
                let progress = browser.store().subscribe_progress();
                let outcome = wait_with_progress(browser.rebuild_index()?, &progress, false)?;
                report_build(&browser, outcome);
            }
            ShellCommand::Pwd => {
                println!("{}", browser.current_dir().display());
                match browser.store().indexed_root() {
                    Some(root) => println!(
                        "Index: {} ({} entries)",
                        root.display(),
                        browser.store().file_count()
                    ),
                    None => println!("Index: none"),
                }
            }
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => break,
            ShellCommand::Unknown(message) => eprintln!("{} (try 'help')", message),
        }
    }

    Ok(())
}

fn show_results(browser: &Browser) {
    match browser.search().wait_settled(SEARCH_TIMEOUT) {
        Some(update) => {
            if let Some(results) = update.state.results() {
                print_entries(results, PAGE_SIZE);
            }
            let status = update.status();
            if !status.is_empty() {
                println!("{}", status);
            }
        }
        None => eprintln!("{}", browser.state().status()),
    }
}

fn report_build(browser: &Browser, outcome: BuildOutcome) {
    match outcome {
        BuildOutcome::AlreadyIndexed(snapshot) => println!(
            "Already indexed: {} ({} entries)",
            snapshot.root().display(),
            snapshot.len()
        ),
        BuildOutcome::Published(_) => {
            println!("Index ready: {} entries", browser.store().file_count())
        }
        BuildOutcome::Cancelled | BuildOutcome::Superseded => {
            println!("Indexing was interrupted")
        }
        BuildOutcome::Failed(reason) => eprintln!("Indexing failed: {}", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ShellCommand::parse("cd docs"), ShellCommand::Cd("docs".into()));
        assert_eq!(
            ShellCommand::parse("  cd   My Documents "),
            ShellCommand::Cd("My Documents".into())
        );
        assert_eq!(ShellCommand::parse("UP"), ShellCommand::Up);
        assert_eq!(ShellCommand::parse("back"), ShellCommand::Back);
        assert_eq!(ShellCommand::parse("forward"), ShellCommand::Forward);
        assert_eq!(ShellCommand::parse("ls"), ShellCommand::List);
        assert_eq!(
            ShellCommand::parse("find report ext:pdf"),
            ShellCommand::Find("report ext:pdf".into())
        );
        assert_eq!(ShellCommand::parse("index"), ShellCommand::Index);
        assert_eq!(ShellCommand::parse("reindex"), ShellCommand::Reindex);
        assert_eq!(ShellCommand::parse("pwd"), ShellCommand::Pwd);
        assert_eq!(ShellCommand::parse("quit"), ShellCommand::Quit);
        assert_eq!(ShellCommand::parse("   "), ShellCommand::Empty);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(ShellCommand::parse("cd"), ShellCommand::Unknown(_)));
        assert!(matches!(
            ShellCommand::parse("rm -rf"),
            ShellCommand::Unknown(m) if m.contains("rm")
        ));
    }
}
