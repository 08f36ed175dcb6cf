//! Inspect and edit catalog headers

use anyhow::{Context, Result};
use colored::Colorize;
use pocat::Catalog;

use crate::cli::HeaderArgs;
use crate::config::Config;

pub fn run(args: HeaderArgs) -> Result<()> {
    match (args.field.as_deref(), args.set.as_deref()) {
        (Some(name), Some(value)) => set_field(&args, name, value),
        (Some(name), None) => show_field(&args, name),
        (None, _) => show_header(&args),
    }
}

fn show_header(args: &HeaderArgs) -> Result<()> {
    let header = Catalog::read_header(&args.file)
        .with_context(|| format!("Failed to read header of {}", args.file.display()))?;

    println!("{}", format!("[Header] {}", args.file.display()).green());
    for line in header.title() {
        println!("  # {}", line);
    }
    for author in header.authors() {
        println!("  {} {}", "author:".cyan(), author);
    }
    for (name, value) in header.fields() {
        println!("  {}: {}", name.cyan(), value);
    }

    Ok(())
}

fn show_field(args: &HeaderArgs, name: &str) -> Result<()> {
    let header = Catalog::read_header(&args.file)
        .with_context(|| format!("Failed to read header of {}", args.file.display()))?;

    let values: Vec<&str> = header.fields_named(name).collect();
    if values.is_empty() {
        anyhow::bail!("No header field {} in {}", name, args.file.display());
    }
    for value in values {
        println!("{}", value);
    }

    Ok(())
}

fn set_field(args: &HeaderArgs, name: &str, value: &str) -> Result<()> {
    let config = Config::load()?;
    let mut catalog = Catalog::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?
        .with_formatter(Box::new(config.wrap.wrapper()));

    catalog.header_mut().set_field(name, value);

    if catalog.sync(false)? {
        println!("{}", format!("[Header] Set {} = {}", name, value).green());
    } else {
        println!("{}", format!("[Header] {} already {}", name, value).yellow());
    }

    Ok(())
}
