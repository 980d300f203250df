use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use trackroll_engine::{DaySessions, format_timestamp};

/// Print every session of one user, dimming the ones that were skipped.
pub fn write_user_history(
    out: &mut dyn Write,
    user_id: usize,
    segment: &str,
    days: &[DaySessions],
) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!("🔎 User #{user_id} History ({segment})").bright_cyan().bold()
    )?;
    writeln!(
        out,
        "{:>4}  {:<19}  {:>6}  {:>5}  {:<12}  {:>6}",
        "Day", "Time", "Start", "Steps", "Item", "End"
    )?;
    let mut prizes = 0usize;
    for session in days.iter().flatten() {
        let item = session.item.map_or("-", |item| item.label());
        let line = format!(
            "{:>4}  {:<19}  {:>6}  {:>5}  {:<12}  {:>6}",
            session.day,
            format_timestamp(&session.timestamp),
            session.start_position,
            session.steps_gained,
            item,
            session.end_position
        );
        if !session.played {
            writeln!(out, "{}  {}", line.dimmed(), "(skipped)".dimmed())?;
        } else if session.prize_triggered {
            prizes += 1;
            writeln!(out, "{line}  {}", "🎁 prize".green())?;
        } else {
            writeln!(out, "{line}")?;
        }
    }
    let played = days.iter().flatten().filter(|s| s.played).count();
    let total = days.iter().map(|d| d.len()).sum::<usize>();
    writeln!(
        out,
        "Played {played}/{total} sessions, {prizes} prize landing(s)."
    )?;
    Ok(())
}
