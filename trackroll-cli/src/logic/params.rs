use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use trackroll_engine::{
    ConfigSource, Segment, SimulationConfig, load_config, load_segments, wrap_seed,
};

/// Reads configuration documents from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl ConfigSource for FileSource {
    type Error = std::io::Error;

    fn read_document(&self, name: &str) -> Result<String, Self::Error> {
        std::fs::read_to_string(Path::new(name))
    }
}

/// Command-line values layered over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub users: Option<usize>,
    pub sessions_per_day: Option<u32>,
    pub rolls_per_session: Option<u32>,
    /// Percent of sessions played, 0 to 100.
    pub participation: Option<f64>,
    pub explode_six: bool,
    pub seed: Option<i64>,
    pub days: Option<u32>,
    pub config: Option<PathBuf>,
    pub segments_file: Option<PathBuf>,
    pub segments: Vec<Segment>,
}

/// Build the run configuration: defaults, then the config file, then flags.
///
/// Segment flags take precedence over a segments file, which takes precedence
/// over a table embedded in the config file.
pub fn resolve_config<S: ConfigSource>(
    overrides: &RunOverrides,
    source: &S,
) -> Result<SimulationConfig> {
    let mut config = match &overrides.config {
        Some(path) => load_config(source, &path.to_string_lossy())
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimulationConfig::default(),
    };

    if let Some(users) = overrides.users {
        config.users = users;
    }
    if let Some(sessions) = overrides.sessions_per_day {
        config.sessions_per_day = sessions;
    }
    if let Some(rolls) = overrides.rolls_per_session {
        config.rolls_per_session = rolls;
    }
    if let Some(percent) = overrides.participation {
        config.p_play = percent / 100.0;
    }
    if overrides.explode_six {
        config.explode_six = true;
    }
    if let Some(seed) = overrides.seed {
        config.seed = wrap_seed(i128::from(seed));
    }
    if let Some(days) = overrides.days {
        config.days = days;
    }

    if !overrides.segments.is_empty() {
        config.segments = Some(overrides.segments.clone());
    } else if let Some(path) = &overrides.segments_file {
        let segments = load_segments(source, &path.to_string_lossy())
            .with_context(|| format!("loading segments {}", path.display()))?;
        config.segments = Some(segments);
    }

    config.validate().context("invalid simulation parameters")?;
    log::debug!("resolved configuration: {config:?}");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(label: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "trackroll-params-{label}-{}.json",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn file_and_flag_seeds_wrap_the_same_way() {
        let path = temp_file("seed", r#"{"seed": -5}"#);
        let from_file = RunOverrides {
            config: Some(path),
            ..RunOverrides::default()
        };
        let config = resolve_config(&from_file, &FileSource).unwrap();
        assert_eq!(config.seed, u32::MAX - 4);

        let from_flag = RunOverrides {
            seed: Some(-5),
            ..RunOverrides::default()
        };
        let config = resolve_config(&from_flag, &FileSource).unwrap();
        assert_eq!(config.seed, u32::MAX - 4);

        let wide = RunOverrides {
            seed: Some((1_i64 << 32) + 7),
            ..RunOverrides::default()
        };
        assert_eq!(resolve_config(&wide, &FileSource).unwrap().seed, 7);
    }

    #[test]
    fn defaults_apply_without_flags() {
        let config = resolve_config(&RunOverrides::default(), &FileSource).unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn flags_override_config_file() {
        let path = temp_file("override", r#"{"users": 10, "pPlay": 0.5, "seed": 3}"#);
        let overrides = RunOverrides {
            users: Some(25),
            participation: Some(80.0),
            config: Some(path),
            ..RunOverrides::default()
        };
        let config = resolve_config(&overrides, &FileSource).unwrap();
        assert_eq!(config.users, 25);
        assert!((config.p_play - 0.8).abs() < 1e-12);
        assert_eq!(config.seed, 3);
    }

    #[test]
    fn segment_flags_beat_segment_file() {
        let path = temp_file("segments", r#"[{"name": "FromFile", "percent": 100}]"#);
        let from_file = RunOverrides {
            segments_file: Some(path.clone()),
            ..RunOverrides::default()
        };
        let config = resolve_config(&from_file, &FileSource).unwrap();
        assert_eq!(config.segments.unwrap()[0].name, "FromFile");

        let from_flags = RunOverrides {
            segments_file: Some(path),
            segments: vec![Segment::new("FromFlag", 100.0)],
            ..RunOverrides::default()
        };
        let config = resolve_config(&from_flags, &FileSource).unwrap();
        assert_eq!(config.segments.unwrap()[0].name, "FromFlag");
    }

    #[test]
    fn out_of_range_participation_is_rejected() {
        let overrides = RunOverrides {
            participation: Some(150.0),
            ..RunOverrides::default()
        };
        let err = resolve_config(&overrides, &FileSource).unwrap_err();
        assert!(format!("{err:#}").contains("play probability"));
    }

    #[test]
    fn missing_config_file_reports_path() {
        let overrides = RunOverrides {
            config: Some(PathBuf::from("/nonexistent/trackroll.json")),
            ..RunOverrides::default()
        };
        let err = resolve_config(&overrides, &FileSource).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/trackroll.json"));
    }
}
