use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use trackroll_engine::{SimulationResult, format_timestamp};

/// Detailed session history is only written for populations up to this size.
pub const DETAILED_HISTORY_MAX_USERS: usize = 10_000;

/// Files written by one export.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
    pub detailed_rows: usize,
    pub detailed_skipped: bool,
}

/// Quote a field when it holds a comma, quote or newline.
pub fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn csv_line(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// File-name suffix identifying population size and mode, e.g. `u1000_segStd`.
pub fn export_tag(result: &SimulationResult) -> String {
    let mode = if result.config.is_segmented() {
        "Mixed"
    } else {
        "Std"
    };
    format!("u{}_seg{mode}", result.config.users)
}

fn write_csv<I>(path: &Path, headers: &[&str], rows: I) -> Result<usize>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", headers.join(","))?;
    let mut count = 0;
    for row in rows {
        writeln!(writer, "{}", csv_line(&row))?;
        count += 1;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::debug!("wrote {count} rows to {}", path.display());
    Ok(count)
}

/// Write the positions, milestones, leaderboard and detailed history CSVs.
pub fn write_exports(dir: &Path, result: &SimulationResult) -> Result<ExportSummary> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let tag = export_tag(result);
    let mut summary = ExportSummary::default();

    let path = dir.join(format!("positions_{tag}.csv"));
    write_csv(
        &path,
        &["user_id", "segment", "day", "position"],
        result.positions.iter().enumerate().flat_map(|(index, row)| {
            let segment = result.segment_name(index);
            row.iter().enumerate().map(move |(day, position)| {
                vec![
                    (index + 1).to_string(),
                    segment.to_string(),
                    (day + 1).to_string(),
                    position.to_string(),
                ]
            })
        }),
    )?;
    summary.files.push(path);

    let path = dir.join(format!("milestones_{tag}.csv"));
    write_csv(
        &path,
        &["day", "users", "mean", "std", "min", "p25", "median", "p75", "max"],
        result.milestones.iter().map(|s| {
            vec![
                s.day.to_string(),
                s.users.to_string(),
                s.mean.to_string(),
                s.std.to_string(),
                s.min.to_string(),
                s.q1.to_string(),
                s.median.to_string(),
                s.q3.to_string(),
                s.max.to_string(),
            ]
        }),
    )?;
    summary.files.push(path);

    let path = dir.join(format!("leaderboard_{tag}.csv"));
    write_csv(
        &path,
        &["rank", "user_id", "segment", "position"],
        result.leaderboard().into_iter().map(|e| {
            vec![
                e.rank.to_string(),
                e.user_id.to_string(),
                e.segment,
                e.position.to_string(),
            ]
        }),
    )?;
    summary.files.push(path);

    let path = dir.join(format!("detailed_history_{tag}.csv"));
    summary.detailed_skipped = result.config.users > DETAILED_HISTORY_MAX_USERS;
    if summary.detailed_skipped {
        log::warn!(
            "skipping detailed history rows for {} users (limit {DETAILED_HISTORY_MAX_USERS})",
            result.config.users
        );
    }
    let skip = summary.detailed_skipped;
    let rows = result
        .history
        .iter()
        .enumerate()
        .filter(move |_| !skip)
        .flat_map(|(index, days)| {
            let segment = result.segment_name(index);
            days.iter().flatten().filter(|s| s.played).map(move |s| {
                vec![
                    (index + 1).to_string(),
                    segment.to_string(),
                    s.day.to_string(),
                    format_timestamp(&s.timestamp),
                    s.start_position.to_string(),
                    s.steps_gained.to_string(),
                    s.end_position.to_string(),
                    s.item.map(|item| item.label().to_string()).unwrap_or_default(),
                ]
            })
        });
    summary.detailed_rows = write_csv(
        &path,
        &[
            "user_id",
            "segment",
            "day",
            "time",
            "start_pos",
            "steps_gained",
            "end_pos",
            "items",
        ],
        rows,
    )?;
    summary.files.push(path);

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackroll_engine::{Segment, SimulationConfig, simulate};

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "trackroll-export-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn tag_reflects_mode() {
        let config = SimulationConfig {
            users: 12,
            days: 7,
            ..SimulationConfig::default()
        };
        let standard = simulate(&config).unwrap();
        assert_eq!(export_tag(&standard), "u12_segStd");
        let mixed = simulate(&config.with_segments(vec![Segment::new("A", 100.0)])).unwrap();
        assert_eq!(export_tag(&mixed), "u12_segMixed");
    }

    #[test]
    fn writes_all_four_files() {
        let config = SimulationConfig {
            users: 6,
            days: 14,
            p_play: 0.5,
            ..SimulationConfig::default()
        }
        .with_segments(vec![Segment::new("Big, Spender", 100.0)]);
        let result = simulate(&config).unwrap();
        let dir = temp_dir("all");
        let summary = write_exports(&dir, &result).unwrap();
        assert_eq!(summary.files.len(), 4);
        assert!(!summary.detailed_skipped);

        let positions = fs::read_to_string(dir.join("positions_u6_segMixed.csv")).unwrap();
        let mut lines = positions.lines();
        assert_eq!(lines.next(), Some("user_id,segment,day,position"));
        assert_eq!(lines.count(), 6 * 14);
        assert!(positions.contains("1,\"Big, Spender\",1,"));

        let milestones = fs::read_to_string(dir.join("milestones_u6_segMixed.csv")).unwrap();
        assert_eq!(milestones.lines().count(), 3);
        let first = milestones.lines().nth(1).unwrap();
        assert_eq!(first.split(',').count(), 9);
        assert!(first.split(',').all(|field| !field.is_empty()));

        let detailed = fs::read_to_string(dir.join("detailed_history_u6_segMixed.csv")).unwrap();
        let played = result.history.iter().flatten().flatten().filter(|s| s.played).count();
        assert_eq!(detailed.lines().count(), played + 1);
        assert_eq!(summary.detailed_rows, played);
    }

    #[test]
    fn leaderboard_csv_is_sorted() {
        let config = SimulationConfig {
            users: 8,
            days: 7,
            ..SimulationConfig::default()
        };
        let result = simulate(&config).unwrap();
        let dir = temp_dir("board");
        write_exports(&dir, &result).unwrap();
        let board = fs::read_to_string(dir.join("leaderboard_u8_segStd.csv")).unwrap();
        let positions: Vec<u64> = board
            .lines()
            .skip(1)
            .map(|line| line.rsplit(',').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(positions.len(), 8);
        assert!(positions.windows(2).all(|w| w[0] >= w[1]));
    }
}
