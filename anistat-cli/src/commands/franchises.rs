use std::fmt::Write;

use anyhow::Context;
use clap::Args;

use anistat_core::franchise::Franchise;

use super::{InputArgs, OutputFormat};

#[derive(Args, Debug)]
pub struct FranchisesArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Hide single-entry franchises
    #[arg(long)]
    pub skip_singletons: bool,
}

pub fn run(args: &FranchisesArgs, quiet: bool) -> anyhow::Result<()> {
    let analysis = args.input.analyze(quiet)?;
    let franchises: Vec<Franchise<'_>> = analysis
        .franchises()
        .context("Cannot assemble franchises")?
        .into_iter()
        .filter(|f| !args.skip_singletons || f.len() > 1)
        .collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&franchises)?),
        OutputFormat::Text => print!("{}", render_text(&franchises)),
    }
    Ok(())
}

fn render_text(franchises: &[Franchise<'_>]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} franchises", franchises.len());
    for franchise in franchises {
        let rep = franchise.representative();
        let _ = writeln!(
            out,
            "\n{} [{}] ({} entries)",
            franchise.title(),
            rep.id,
            franchise.len()
        );
        let (start, end) = franchise.air_span();
        if let Some(start) = start {
            let end = end.map_or_else(|| "ongoing".to_string(), |d| d.to_string());
            let _ = writeln!(out, "  aired {start} to {end}");
        }
        for member in franchise.members() {
            let aired = member
                .air_start
                .map_or_else(|| "unaired".to_string(), |d| d.to_string());
            let marker = if member.id == rep.id { '*' } else { '-' };
            let _ = writeln!(out, "  {marker} {:>8}  {aired:<10}  {}", member.id, member.title);
        }
    }
    out
}
