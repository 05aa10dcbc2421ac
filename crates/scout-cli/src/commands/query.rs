//! Query command - search for files.

use crate::app::{print_entries, App};
use crate::OutputFormat;
use scout_core::{fallback_search, Config, FallbackOptions, NeverCancel, SearchQuery};
use std::path::PathBuf;
use std::time::Instant;

/// Run the query command.
pub fn run(
    config: Config,
    pattern: &str,
    root: Option<PathBuf>,
    no_index: bool,
    limit: usize,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let root = app.resolve_root(root)?;
    let query = SearchQuery::parse(pattern);

    let start = Instant::now();
    let results = if no_index {
        let options = FallbackOptions {
            max_results: limit.min(app.store.max_results()),
            ..FallbackOptions::from_config(&app.config)
        };
        fallback_search(app.enumerator.as_ref(), &root, &query, &options, &NeverCancel)?
    } else {
        let snapshot = app.build_index(&root, matches!(output, OutputFormat::Json))?;
        snapshot.search(&query, limit.min(app.store.max_results()), &NeverCancel)?
    };
    let elapsed = start.elapsed();

    match output {
        OutputFormat::Text => {
            print_entries(&results, limit);

            eprintln!();
            eprintln!(
                "Found {} results in {:.3}ms{}",
                results.len(),
                elapsed.as_secs_f64() * 1000.0,
                if no_index { "" } else { " (indexed)" }
            );
        }
        OutputFormat::Json => {
            let json_results: Vec<serde_json::Value> = results
                .iter()
                .take(limit)
                .map(|entry| {
                    serde_json::json!({
                        "name": entry.name,
                        "path": entry.path,
                        "relative_path": entry.relative_path,
                        "is_dir": entry.is_dir,
                        "size": entry.size,
                        "modified": entry.modified.map(|t| t.to_rfc3339()),
                    })
                })
                .collect();

            println!("{}", serde_json::to_string_pretty(&json_results)?);
        }
    }

    Ok(())
}
