use std::fmt::Write;

use clap::Args;

use anistat_core::analyze::StatsReport;
use anistat_core::pipeline::Analysis;

use super::{InputArgs, OutputFormat, format_duration};

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Rows shown per table in text output
    #[arg(long, default_value = "10")]
    pub top: usize,
}

pub fn run(args: &AnalyzeArgs, quiet: bool) -> anyhow::Result<()> {
    let analysis = args.input.analyze(quiet)?;
    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&analysis.report)?);
        }
        OutputFormat::Text => print!("{}", render_text(&analysis, args.top)),
    }
    Ok(())
}

// ── Text rendering ───────────────────────────────────────────────────

fn render_text(analysis: &Analysis, top: usize) -> String {
    let report = &analysis.report;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Watch-list analysis for {} at {}",
        analysis.user,
        report.reference_time.format("%Y-%m-%d %H:%M %Z")
    );
    let _ = writeln!(
        out,
        "  Entries: {}  Franchises: {}",
        analysis.entries.len(),
        analysis.components.len()
    );
    out.push('\n');

    render_durations(&mut out, report);
    render_schedule(&mut out, report, top);
    render_scores(&mut out, report, top);
    render_tags(&mut out, report, top);

    if !report.failures.is_empty() {
        out.push_str("Unavailable\n");
        for failure in &report.failures {
            let _ = writeln!(out, "  {}: {}", failure.statistic, failure.message);
        }
    }
    out
}

fn render_durations(out: &mut String, report: &StatsReport) {
    out.push_str("Time\n");
    let _ = writeln!(out, "  Watched:    {}", format_duration(report.durations.watched));
    let _ = writeln!(out, "  To watch:   {}", format_duration(report.durations.to_watch));
    if let Some(ratio) = report.completion {
        let _ = writeln!(out, "  Completion: {:.1}%", ratio * 100.0);
    }
    out.push('\n');
}

fn render_schedule(out: &mut String, report: &StatsReport, top: usize) {
    let _ = writeln!(out, "Airing now ({})", report.air_schedule.len());
    for row in report.air_schedule.iter().take(top) {
        let next = row.next_episode.map_or_else(
            || "no further episode".to_string(),
            |t| t.format("%a %Y-%m-%d %H:%M").to_string(),
        );
        let progress = match (row.user_watched_episodes, row.episode_count) {
            (Some(w), Some(n)) => format!(" ({w}/{n})"),
            (Some(w), None) => format!(" ({w}/?)"),
            _ => String::new(),
        };
        let _ = writeln!(out, "  {next:<22} {}{progress}", row.title);
    }
    out.push('\n');

    let _ = writeln!(out, "Upcoming ({})", report.next_releases.len());
    for row in report.next_releases.iter().take(top) {
        let _ = writeln!(
            out,
            "  {} (in {} days)  {}",
            row.air_start, row.days_until, row.title
        );
    }
    out.push('\n');
}

fn render_scores(out: &mut String, report: &StatsReport, top: usize) {
    let _ = writeln!(out, "Scored by you and the catalog: {}", report.score_pairs.len());
    if let Some(trend) = &report.score_trend {
        let _ = writeln!(out, "  Score trend: {:+.3} per year of air date", trend.slope);
    }
    if let Some(bias) = &report.popularity_bias {
        let _ = writeln!(
            out,
            "  Conformity:  {:.1}% (raw {:.3})",
            bias.display_conformity() * 100.0,
            bias.conformity
        );
        for row in bias.rows.iter().take(top) {
            let _ = writeln!(
                out,
                "    {:+.2} {:<8} {} (you {:.1}, catalog {:.2})",
                row.difference,
                row.agreement.as_str(),
                row.title,
                row.user_score,
                row.catalog_score
            );
        }
    }
    out.push('\n');

    if !report.favorite_franchises.is_empty() {
        out.push_str("Favorite franchises\n");
        for row in report.favorite_franchises.iter().take(top) {
            let _ = writeln!(
                out,
                "  {:>5.2}  {} ({}/{} scored)",
                row.mean_user_score, row.title, row.scored_members, row.members
            );
        }
        out.push('\n');
    }
}

fn render_tags(out: &mut String, report: &StatsReport, top: usize) {
    for (dimension, groups) in &report.breakdowns {
        if groups.is_empty() {
            continue;
        }
        let _ = writeln!(out, "Mean score by {dimension}");
        for group in groups.iter().take(top) {
            let _ = writeln!(
                out,
                "  {:>5.2}  {} (n={})",
                group.mean_score, group.tag, group.count
            );
        }
        out.push('\n');
    }
    for (dimension, pairs) in &report.co_occurrence {
        if pairs.is_empty() {
            continue;
        }
        let _ = writeln!(out, "Frequent {dimension} pairs");
        for pair in pairs.iter().take(top) {
            let _ = writeln!(out, "  {:>4}  {} + {}", pair.count, pair.first, pair.second);
        }
        out.push('\n');
    }
}
