//! Index command - build the file index for a directory tree.

use crate::app::{format_size, App};
use scout_core::Config;
use std::path::PathBuf;
use std::time::Instant;

/// Run the index command.
pub fn run(config: Config, root: Option<PathBuf>) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let root = app.resolve_root(root)?;

    let start = Instant::now();
    let snapshot = app.build_index(&root, false)?;
    let elapsed = start.elapsed();
    let stats = snapshot.stats();

    println!();
    println!("Indexing complete!");
    println!("  Root:        {}", snapshot.root().display());
    println!("  Entries:     {}", stats.total_entries());
    println!("  Files:       {}", stats.total_files);
    println!("  Directories: {}", stats.total_dirs);
    println!("  Total size:  {}", format_size(stats.total_size));
    println!("  Time:        {:.2}s", elapsed.as_secs_f64());
    if elapsed.as_secs_f64() > 0.0 {
        println!(
            "  Rate:        {:.0} entries/sec",
            stats.total_entries() as f64 / elapsed.as_secs_f64()
        );
    }

    Ok(())
}
