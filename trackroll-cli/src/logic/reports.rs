use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use trackroll_engine::{
    DayStats, Histogram, LeaderboardEntry, SegmentCost, SimulationConfig, SimulationResult,
    total_cost,
};

const BAR_WIDTH: usize = 40;

/// Optional sections shared by every report format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Show the top N users of the final standings.
    pub leaderboard: Option<usize>,
}

/// Format an integer with thousands separators.
pub fn group_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn mode_label(config: &SimulationConfig) -> &'static str {
    if config.is_segmented() {
        "Mixed Segments"
    } else {
        "Standard"
    }
}

pub fn timing_note(result: &SimulationResult, elapsed: Duration) -> String {
    format!(
        "Simulated {} users ({}) × {} days in {} ms.",
        group_thousands(result.config.users),
        mode_label(&result.config),
        result.config.days,
        elapsed.as_millis()
    )
}

fn cost_rows(result: &SimulationResult) -> Vec<SegmentCost> {
    let mut rows = result.segment_costs.clone();
    rows.push(total_cost(&result.segment_costs));
    rows
}

fn top_entries(result: &SimulationResult, options: ReportOptions) -> Option<Vec<LeaderboardEntry>> {
    options
        .leaderboard
        .map(|n| result.leaderboard().into_iter().take(n).collect())
}

pub fn generate_console_report(
    out: &mut dyn Write,
    result: &SimulationResult,
    options: ReportOptions,
    elapsed: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Milestone Statistics".bright_cyan().bold())?;
    writeln!(out, "{}", "=======================".cyan())?;
    writeln!(
        out,
        "{:>5} {:>9} {:>10} {:>9} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Day", "Users", "Mean", "Std", "Min", "25%", "Median", "75%", "Max"
    )?;
    for stats in &result.milestones {
        write_console_stats_row(out, stats)?;
    }
    if result.milestones.is_empty() {
        writeln!(out, "No milestone days fall within {} days.", result.config.days)?;
    }

    for stats in &result.milestones {
        if let Some(hist) = result.histogram_for_day(stats.day) {
            writeln!(out)?;
            writeln!(
                out,
                "{} {}",
                format!("📈 Day {}", stats.day).bright_yellow().bold(),
                format!("Mean: {:.0}", stats.mean).yellow()
            )?;
            write_text_histogram(out, &hist)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", "💰 Cost Forecast".bright_green().bold())?;
    writeln!(out, "{}", "================".green())?;
    if result.config.is_segmented() {
        writeln!(
            out,
            "{:<16} {:>10} {:>18} {:>12}",
            "Segment", "Users", "Total Prize Cost", "Avg $/User"
        )?;
        for row in cost_rows(result) {
            let line = format!(
                "{:<16} {:>10} {:>18} {:>12}",
                row.segment,
                group_thousands(row.users),
                format!("${:.2}", row.total_cost),
                format!("${:.2}", row.average_cost())
            );
            if row.segment == "TOTAL" {
                writeln!(out, "{}", line.bold())?;
            } else {
                writeln!(out, "{line}")?;
            }
        }
    } else {
        writeln!(out, "Cost forecast available only in segment mode.")?;
    }

    if let Some(entries) = top_entries(result, options) {
        writeln!(out)?;
        writeln!(out, "{}", "🏆 Leaderboard".bright_magenta().bold())?;
        writeln!(out, "{}", "==============".magenta())?;
        writeln!(out, "{:>5} {:>9} {:<16} {:>9}", "Rank", "User ID", "Segment", "Position")?;
        for entry in entries {
            writeln!(
                out,
                "{:>5} {:>9} {:<16} {:>9}",
                entry.rank,
                format!("#{}", entry.user_id),
                entry.segment,
                entry.position
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", timing_note(result, elapsed).dimmed())?;
    Ok(())
}

fn write_console_stats_row(out: &mut dyn Write, stats: &DayStats) -> Result<()> {
    writeln!(
        out,
        "{:>5} {:>9} {:>10.2} {:>9.2} {:>8} {:>8} {:>8} {:>8} {:>8}",
        stats.day,
        group_thousands(stats.users),
        stats.mean,
        stats.std,
        stats.min,
        stats.q1,
        stats.median,
        stats.q3,
        stats.max
    )?;
    Ok(())
}

/// Horizontal bar chart: one row per bucket, labelled with its range.
pub fn write_text_histogram(out: &mut dyn Write, hist: &Histogram) -> Result<()> {
    if hist.ticks.is_empty() {
        writeln!(out, "  (no data)")?;
        return Ok(());
    }
    let tallest = hist.max_count();
    for (index, &count) in hist.buckets.iter().enumerate() {
        let (lo, hi) = hist.bucket_bounds(index);
        let width = count * BAR_WIDTH / tallest;
        let bar = format!("{}{}", "█".repeat(width), " ".repeat(BAR_WIDTH - width));
        writeln!(out, "  {lo:>8.0}-{hi:<8.0} |{bar}| {count}")?;
    }
    let ticks: Vec<String> = hist.ticks.iter().map(|t| format!("{t:.0}")).collect();
    writeln!(out, "  ticks: {}", ticks.join(" "))?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    result: &SimulationResult,
    options: ReportOptions,
    elapsed: Duration,
) -> Result<()> {
    writeln!(out, "# Trackroll Simulation Results\n")?;
    writeln!(out, "- **Users**: {}", group_thousands(result.config.users))?;
    writeln!(out, "- **Mode**: {}", mode_label(&result.config))?;
    writeln!(out, "- **Days**: {}", result.config.days)?;
    writeln!(out, "- **Seed**: {}", result.config.seed)?;
    writeln!(out, "- **Fingerprint**: `{:016x}`\n", result.fingerprint())?;

    writeln!(out, "## Milestones\n")?;
    writeln!(out, "| Day | Users | Mean | Std | Min | 25% | Median | 75% | Max |")?;
    writeln!(out, "|---:|---:|---:|---:|---:|---:|---:|---:|---:|")?;
    for s in &result.milestones {
        writeln!(
            out,
            "| {} | {} | {:.2} | {:.2} | {} | {} | {} | {} | {} |",
            s.day, s.users, s.mean, s.std, s.min, s.q1, s.median, s.q3, s.max
        )?;
    }
    writeln!(out)?;

    if result.config.is_segmented() {
        writeln!(out, "## Cost Forecast\n")?;
        writeln!(out, "| Segment | Users | Total Prize Cost | Avg $/User |")?;
        writeln!(out, "|---|---:|---:|---:|")?;
        for row in cost_rows(result) {
            writeln!(
                out,
                "| {} | {} | ${:.2} | ${:.2} |",
                row.segment,
                row.users,
                row.total_cost,
                row.average_cost()
            )?;
        }
        writeln!(out)?;
    }

    if let Some(entries) = top_entries(result, options) {
        writeln!(out, "## Leaderboard\n")?;
        writeln!(out, "| Rank | User ID | Segment | Position |")?;
        writeln!(out, "|---:|---:|---|---:|")?;
        for e in entries {
            writeln!(out, "| {} | #{} | {} | {} |", e.rank, e.user_id, e.segment, e.position)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "_{}_", timing_note(result, elapsed))?;
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    config: &'a SimulationConfig,
    fingerprint: String,
    milestones: &'a [DayStats],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    segment_costs: Vec<SegmentCost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    leaderboard: Option<Vec<LeaderboardEntry>>,
}

pub fn generate_json_report(
    out: &mut dyn Write,
    result: &SimulationResult,
    options: ReportOptions,
) -> Result<()> {
    let report = JsonReport {
        config: &result.config,
        fingerprint: format!("{:016x}", result.fingerprint()),
        milestones: &result.milestones,
        segment_costs: if result.config.is_segmented() {
            cost_rows(result)
        } else {
            Vec::new()
        },
        leaderboard: top_entries(result, options),
    };
    let json_output = serde_json::to_string_pretty(&report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}
