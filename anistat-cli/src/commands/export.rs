use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use super::InputArgs;

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Destination file for the merged entry table
    #[arg(long, short)]
    pub output: PathBuf,
}

pub fn run(args: &ExportArgs, quiet: bool) -> anyhow::Result<()> {
    let analysis = args.input.analyze(quiet)?;

    let file = File::create(&args.output)
        .with_context(|| format!("Cannot create output file: {}", args.output.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &analysis.entries)
        .context("Cannot serialize entry table")?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    info!(entries = analysis.entries.len(), path = %args.output.display(), "Exported entry table");
    if !quiet {
        println!(
            "Exported {} entries to {}",
            analysis.entries.len(),
            args.output.display()
        );
    }
    Ok(())
}
