// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flatscan — photographed document pages in, scanned PDF out.
//
// Entry point. Initialises logging, resolves settings, runs the enhancer,
// and reports failures in plain language.

mod cli;
mod report;

use std::process::ExitCode;

use clap::Parser;
use flatscan_core::error::Result;
use flatscan_core::human_errors::{Severity, humanize_error};
use flatscan_document::ScanEnhancer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, InputKind, classify_inputs};
use report::RunReport;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("flatscan v{}", env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "Run failed");
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            match human.severity {
                Severity::ActionRequired => ExitCode::from(2),
                Severity::Permanent | Severity::Transient => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.resolve_config()?;
    let enhancer = ScanEnhancer::new(config)?;

    let document = match classify_inputs(&cli.inputs)? {
        InputKind::Pdf(path) => {
            info!(path = %path.display(), "Reading PDF");
            let data = std::fs::read(&path)?;
            enhancer.enhance_pdf(&data)?
        }
        InputKind::Images(paths) => {
            info!(images = paths.len(), "Reading page images");
            enhancer.enhance_image_files(&paths)?
        }
    };

    document.write_pdf(&cli.output)?;

    if let Some(dir) = &cli.pages_dir {
        let written = document.save_pages(dir)?;
        info!(pages = written.len(), dir = %dir.display(), "Binary pages saved");
    }
    if let Some(path) = &cli.report {
        RunReport::new(&cli.inputs, &cli.output, enhancer.config(), &document).write(path)?;
        info!(path = %path.display(), "Report written");
    }

    Ok(())
}
