//! Build automation tasks for speechdb
//!
//! This tool provides various automation tasks for the speechdb project, including:
//! - Generating the scraper's CLI reference from source code

use clap::Parser;
use speechdb_common::Language;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for speechdb", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the speechdb-ingest CLI reference in Markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs/reference")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn language_table() -> String {
    Language::ALL
        .iter()
        .map(|lang| {
            format!(
                "| `{}` | {} | `{}` |",
                lang.code(),
                lang.display_name(),
                lang.dataset_file_name()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    // Generate markdown from clap definitions
    let markdown = clap_markdown::help_markdown::<speechdb_ingest::Cli>();

    let content = format!(
        r#"# speechdb-ingest CLI Reference

This documentation is auto-generated from the CLI source code. Last updated: {}.

## Overview

`speechdb-ingest` incrementally scrapes the public speech archive into one CSV dataset per
language. Each run walks the listing newest-first and stops once it meets a stretch of
speeches the dataset already holds, so scheduled runs only fetch what is new.

## Languages

| Code | Language | Dataset |
|------|----------|---------|
{}

## Quick Start

```bash
# Scrape the Hindi archive into docs/data_hi.csv
speechdb-ingest

# Scrape the English archive into a custom directory
speechdb-ingest en --data-dir ./datasets
```

## Commands

{}

## Environment Variables

- `SPEECHDB_BASE_URL` - Archive base URL
- `SPEECHDB_DATA_DIR` - Dataset directory (default: `docs`)
- `SPEECHDB_USER_AGENT` - User agent sent with every request
- `SPEECHDB_TIMEOUT_SECS` - Per-request timeout (default: `30`)
- `SPEECHDB_MAX_RETRIES` - Retries after a failed request (default: `3`)
- `SPEECHDB_RETRY_DELAY_MS` - Pause between attempts (default: `2000`)
- `SPEECHDB_DUPLICATE_THRESHOLD` - Consecutive known speeches that end a run (default: `10`)
- `GITHUB_OUTPUT` - Receives `added_count=<n>` when set
- `LOG_LEVEL`, `LOG_FORMAT`, `LOG_OUTPUT`, `LOG_DIR`, `LOG_FILTER` - Logging

Command line flags take precedence over environment variables. A `.env` file in the working
directory is loaded first.

---

*This documentation is automatically generated from the CLI source code. To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        language_table(),
        markdown
    );

    // Create output directory if it doesn't exist
    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("✅ Generated CLI documentation at: {}", file_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Review the generated documentation");
    println!("  2. Commit it to version control");

    Ok(())
}
