//! Generate command CLI handler.

use crate::generator::{self, GenerateOptions, GenerateStats, GenerateYamlConfig, DEFAULT_ROWS};
use crate::parser::SqlDialect;
use crate::schema::load_schema;
use crate::writer::StatementWriter;
use anyhow::{bail, Context};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

#[allow(clippy::too_many_arguments)]
pub fn run(
    file: PathBuf,
    rows: Option<usize>,
    output: Option<PathBuf>,
    dialect: Option<String>,
    seed: Option<u64>,
    config: Option<PathBuf>,
    skip: Option<String>,
    progress: bool,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    if !file.exists() {
        bail!("input file does not exist: {}", file.display());
    }

    let start = Instant::now();

    // CLI flags take precedence over the config file
    let yaml = match config {
        Some(ref path) => {
            let yaml = GenerateYamlConfig::load(path)
                .with_context(|| format!("failed to load config: {}", path.display()))?;
            yaml.validate()?;
            yaml
        }
        None => GenerateYamlConfig::default(),
    };

    let dialect = match dialect {
        Some(d) => d
            .parse::<SqlDialect>()
            .map_err(|e| anyhow::anyhow!("{}", e))?,
        None => yaml.dialect.unwrap_or_default(),
    };

    let mut skip_tables = yaml.skipped_tables();
    if let Some(list) = skip {
        skip_tables.extend(
            list.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        );
    }

    let options = GenerateOptions {
        rows: rows.or(yaml.rows).unwrap_or(DEFAULT_ROWS),
        dialect,
        seed: seed.or(yaml.seed),
        skip_tables,
        registry: yaml.build_registry()?,
    };

    if progress {
        eprintln!("Loading schema from {}...", file.display());
    }

    let schema = load_schema(&file)?;

    if progress {
        eprintln!(
            "Found {} tables with {} columns",
            schema.len(),
            schema.column_count()
        );
        for name in &options.skip_tables {
            if schema.get_table(name).is_none() {
                eprintln!("  Warning: skipped table '{}' is not in the schema", name);
            }
        }
    }

    let generated = generator::generate(&schema, &options)?;

    if dry_run {
        if json {
            println!("{}", serde_json::to_string_pretty(&generated.stats)?);
        } else {
            print_stats(&generated.stats, true);
            eprintln!("\nDry run complete. No statements written.");
        }
        return Ok(());
    }

    let progress_bar = if progress && !json {
        let pb = ProgressBar::new(generated.statements.len() as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} statements",
        ) {
            pb.set_style(style.progress_chars("█▓▒░  "));
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let mut writer = StatementWriter::create(output.as_deref()).with_context(|| match output {
        Some(ref path) => format!("failed to create output file: {}", path.display()),
        None => "failed to open stdout".to_string(),
    })?;

    for stmt in &generated.statements {
        writer.write_statement(stmt)?;
        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }
    writer.flush()?;

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    if json {
        let stats_json = serde_json::to_string_pretty(&generated.stats)?;
        // Keep JSON off stdout when the statements go there
        if output.is_some() {
            println!("{}", stats_json);
        } else {
            eprintln!("{}", stats_json);
        }
    } else if progress {
        print_stats(&generated.stats, false);
        if let Some(ref path) = output {
            eprintln!("  Output: {}", path.display());
        }
        eprintln!("  Elapsed time: {:.3?}", start.elapsed());
    }

    Ok(())
}

fn print_stats(stats: &GenerateStats, per_table: bool) {
    eprintln!();
    eprintln!("Generate Statistics:");
    eprintln!("  Tables: {}", stats.tables);
    eprintln!(
        "  Columns: {} ({} generated, {} derived, {} auto-generated)",
        stats.columns, stats.generated_columns, stats.derived_columns, stats.auto_generated_columns
    );
    eprintln!("  References: {}", stats.references);
    eprintln!("  Rows per table: {}", stats.rows_per_table);
    eprintln!("  Statements: {}", stats.statements);
    eprintln!("  Seed: {}", stats.seed);
    if !stats.skipped_tables.is_empty() {
        eprintln!("  Skipped tables: {}", stats.skipped_tables.join(", "));
    }

    if per_table {
        eprintln!();
        eprintln!("Per-table breakdown:");
        for table in &stats.table_stats {
            let marker = if table.skipped { " [skipped]" } else { "" };
            eprintln!(
                "  {}{}: {} rows x {} columns",
                table.name, marker, table.rows, table.columns
            );
        }
    }
}
