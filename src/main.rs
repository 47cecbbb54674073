use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use framekit::{
    batch::{FrameBatch, PNG_ONLY},
    clean::clean_dirs,
    compose::{OutlineSettings, Outliner},
    config::{Cli, Command},
    keying::{ChromaKeyer, KeyerSettings},
    pack::pack_frames,
    removal::CommandRemover,
    traits::FrameProcessor,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match Cli::parse().command {
        Command::RemoveBg {
            source,
            dest,
            command,
        } => {
            let remover = CommandRemover::from_command_line(&command)?;
            run_stage(FrameBatch::new(remover, source, dest))
        }
        Command::Key {
            source,
            dest,
            color,
            tolerance,
            smooth,
            erosion,
        } => {
            let keyer = ChromaKeyer::new(KeyerSettings::new(color, tolerance, smooth, erosion));
            run_stage(FrameBatch::new(keyer, source, dest))
        }
        Command::Outline {
            source,
            dest,
            width,
            color,
        } => {
            let outliner = Outliner::new(OutlineSettings::new(width, color));
            run_stage(FrameBatch::new(outliner, source, dest).with_extensions(PNG_ONLY))
        }
        Command::Pack { name, source, dest } => {
            let summary = pack_frames(&source, &dest, &name)?;
            println!(
                "packed {} frames into {}",
                summary.entries,
                summary.archive.display()
            );
            Ok(())
        }
        Command::Clean { dirs } => {
            let report = clean_dirs(dirs.iter().map(PathBuf::as_path));
            println!(
                "removed {} entries, {} failures",
                report.removed, report.failed
            );
            Ok(())
        }
    }
}

fn run_stage<P: FrameProcessor>(batch: FrameBatch<P>) -> Result<()> {
    let progress_bar = ProgressBar::new(0);
    progress_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec} {eta})",
        )?
        .progress_chars("#>-"),
    );

    let report = batch.run_with(|completed, total| {
        progress_bar.set_length(total as u64);
        progress_bar.set_position(completed as u64);
    })?;
    progress_bar.finish();

    println!(
        "{} written, {} skipped, {} failed of {} frames",
        report.written(),
        report.skipped(),
        report.failed(),
        report.total()
    );
    for (frame, reason) in report.failures() {
        eprintln!("  {}: {}", frame.display(), reason);
    }
    Ok(())
}
