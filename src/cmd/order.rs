//! Order command - show the column resolution order of a schema.

use crate::error::GenerateError;
use crate::generator::resolution_order;
use crate::schema::{load_schema, ColumnGraph};
use anyhow::{bail, Result};
use std::path::PathBuf;

/// Run the order command
pub fn run(file: PathBuf, check: bool) -> Result<()> {
    if !file.exists() {
        bail!("input file does not exist: {}", file.display());
    }

    eprintln!("Analyzing column references...");

    let schema = load_schema(&file)?;
    let graph = ColumnGraph::from_schema(&schema);

    if graph.is_empty() {
        eprintln!("No tables found in the file.");
        return Ok(());
    }

    let order = match resolution_order(&graph) {
        Ok(order) => order,
        Err(GenerateError::CyclicDependency { columns }) => {
            eprintln!("\nWarning: Circular references detected!");
            eprintln!("The following columns form a cycle:");
            eprintln!("  {}", columns.join(" -> "));
            eprintln!();
            if check {
                bail!("Check FAILED: values cannot be generated for cyclic references.");
            }
            bail!("cannot determine a resolution order for cyclic references");
        }
        Err(e) => return Err(e.into()),
    };

    if check {
        eprintln!("Check PASSED: every column can be resolved.");
        eprintln!(
            "  {} columns, {} references",
            graph.len(),
            graph.edge_count()
        );
        return Ok(());
    }

    println!("Resolution order ({} columns):", order.len());
    for (i, &id) in order.iter().enumerate() {
        let column = graph.column(id)?;
        let sources = graph
            .dependency_indexes(id)?
            .iter()
            .map(|&dep| graph.full_name(dep))
            .collect::<Result<Vec<_>, _>>()?;

        if column.is_auto_generated {
            println!("  {}. {} (auto-generated)", i + 1, column.full_name);
        } else if sources.is_empty() {
            println!("  {}. {} [{}]", i + 1, column.full_name, column.col_type);
        } else {
            println!(
                "  {}. {} <- {}",
                i + 1,
                column.full_name,
                sources.join(" + ")
            );
        }
    }

    Ok(())
}
