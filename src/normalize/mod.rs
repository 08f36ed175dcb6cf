//! Rewrite catalogs with every field rendered afresh

use anyhow::{Context, Result};
use colored::Colorize;
use pocat::{Catalog, Wrapper};
use std::fs;
use std::path::Path;

use crate::cli::NormalizeArgs;
use crate::config::Config;
use crate::utils::{collect_catalogs, file_label, progress_bar};

fn wrapper_for(config: &Config, args: &NormalizeArgs) -> Wrapper {
    let mut wrap = config.wrap.clone();
    if let Some(width) = args.width {
        wrap.width = width;
    }
    if args.no_wrap {
        wrap.enabled = false;
    }
    if args.fine {
        wrap.fine = true;
    }
    wrap.wrapper()
}

/// Re-render one catalog; returns whether its text changed.
pub fn normalize_file(path: &Path, wrapper: Wrapper) -> Result<bool> {
    let before = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut catalog = Catalog::from_str(&path.to_string_lossy(), &before)?
        .with_formatter(Box::new(wrapper));
    catalog.sync(true)?;
    let after = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(before != after)
}

pub fn run(args: NormalizeArgs) -> Result<()> {
    let config = Config::load()?;
    let files = collect_catalogs(
        &args.paths,
        &config.catalog.extensions,
        args.recursive || config.catalog.recursive,
    )?;

    if files.is_empty() {
        println!("{}", "[WARN] No catalog files found".yellow());
        return Ok(());
    }

    let wrapper = wrapper_for(&config, &args);

    if let [path] = files.as_slice() {
        println!("{}", format!("[Normalize] {}", path.display()).green());
        let changed = normalize_file(path, wrapper)?;
        let status = if changed { "rewritten" } else { "unchanged" };
        println!("{}", format!("[OK] {} {}", path.display(), status).green());
        return Ok(());
    }

    println!(
        "{}",
        format!("[Normalize] Found {} catalog(s)", files.len()).green()
    );

    let pb = progress_bar(files.len());
    let mut changed_count = 0;
    let mut error_count = 0;

    for path in &files {
        pb.set_message(file_label(path));
        match normalize_file(path, wrapper) {
            Ok(true) => changed_count += 1,
            Ok(false) => {}
            Err(e) => {
                error_count += 1;
                pb.suspend(|| {
                    eprintln!("{}", format!("[ERROR] {}: {:#}", path.display(), e).red());
                });
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    println!(
        "{}",
        format!(
            "[OK] Rewrote {} of {} catalog(s), {} error(s)",
            changed_count,
            files.len(),
            error_count
        )
        .green()
    );

    if error_count > 0 {
        anyhow::bail!("{} catalog(s) could not be normalized", error_count);
    }

    Ok(())
}
