use anyhow::{Context, Result, anyhow, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use trackroll_engine::Segment;

/// `NAME:PERCENT` followed by any number of `:option` suffixes.
static SEGMENT_SPEC: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[^:]+):(?P<percent>\d+(?:\.\d+)?)(?P<options>(?::[^:]+)*)$").ok()
});

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse a segment shorthand such as `Whale:30:extra=1:explode:cost=5`.
///
/// Recognised options are `extra=N` (extra rolls), `explode` and `cost=X`
/// (prize cost).
pub fn parse_segment_spec(spec: &str) -> Result<Segment> {
    let pattern = SEGMENT_SPEC
        .as_ref()
        .ok_or_else(|| anyhow!("segment pattern failed to compile"))?;
    let caps = pattern
        .captures(spec.trim())
        .ok_or_else(|| anyhow!("invalid segment '{spec}' (expected NAME:PERCENT[:extra=N][:explode][:cost=X])"))?;

    let name = caps["name"].trim();
    let percent: f64 = caps["percent"]
        .parse()
        .with_context(|| format!("invalid percent in segment '{spec}'"))?;
    let mut segment = Segment::new(name, percent);

    for option in caps["options"].split(':').filter(|o| !o.is_empty()) {
        match option.split_once('=') {
            None if option.eq_ignore_ascii_case("explode") => {
                segment = segment.with_explode(true);
            }
            Some(("extra", value)) => {
                let extra = value
                    .parse()
                    .with_context(|| format!("invalid extra rolls '{value}' in segment '{name}'"))?;
                segment = segment.with_extra_rolls(extra);
            }
            Some(("cost", value)) => {
                let cost = value
                    .parse()
                    .with_context(|| format!("invalid prize cost '{value}' in segment '{name}'"))?;
                segment = segment.with_prize_cost(cost);
            }
            _ => bail!("unknown option '{option}' in segment '{name}'"),
        }
    }
    Ok(segment)
}

/// Parse every `--segment` value, each of which may hold a comma-separated list.
pub fn parse_segment_specs(values: &[String]) -> Result<Vec<Segment>> {
    values
        .iter()
        .flat_map(|value| split_csv(value))
        .map(|spec| parse_segment_spec(&spec))
        .collect()
}
