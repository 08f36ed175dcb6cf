//! Parse catalogs and report what they contain

use anyhow::Result;
use colored::Colorize;
use pocat::{Catalog, EntryState};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;

use crate::cli::CheckArgs;
use crate::config::Config;
use crate::utils::collect_catalogs;

#[derive(Debug, Default, Serialize)]
pub struct CatalogReport {
    pub path: String,
    pub entries: usize,
    pub active: usize,
    pub retired: usize,
    pub translated: usize,
    pub fuzzy: usize,
    pub untranslated: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn check_file(path: &Path) -> CatalogReport {
    let mut report = CatalogReport {
        path: path.display().to_string(),
        ..Default::default()
    };

    let catalog = match Catalog::open(path) {
        Ok(catalog) => catalog,
        Err(e) => {
            report.error = Some(e.to_string());
            return report;
        }
    };

    report.entries = catalog.len();
    report.active = catalog.retired_boundary();
    report.language = catalog.language();
    for entry in &catalog {
        match entry.state() {
            EntryState::Translated => report.translated += 1,
            EntryState::Fuzzy => report.fuzzy += 1,
            EntryState::Untranslated => report.untranslated += 1,
            EntryState::Retired => report.retired += 1,
        }
    }
    report
}

pub fn run(args: CheckArgs) -> Result<()> {
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

    let reports: Vec<CatalogReport> = files.par_iter().map(|path| check_file(path)).collect();
    let failed = reports.iter().filter(|r| r.error.is_some()).count();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!(
            "{}",
            format!("[Check] {} catalog(s)", reports.len()).green()
        );
        for report in &reports {
            match &report.error {
                Some(error) => println!("{}", format!("[ERROR] {}", error).red()),
                None => println!(
                    "  {}: {} entries ({} translated, {} fuzzy, {} untranslated, {} retired)",
                    report.path,
                    report.entries,
                    report.translated,
                    report.fuzzy,
                    report.untranslated,
                    report.retired
                ),
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} catalog(s) failed to parse", failed);
    }

    if !args.json {
        println!("{}", "[OK] All catalogs parsed".green());
    }

    Ok(())
}
