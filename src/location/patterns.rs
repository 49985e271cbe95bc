//! Coordinate extraction from map-service URLs.
//!
//! Rules are tried in declaration order and the first one that matches wins,
//! even when a later rule would match a different pair further along the text.

use super::types::Coordinate;
use regex::Regex;
use std::sync::LazyLock;

/// Signed decimal degree in ASCII digits, integer part and fraction both required.
const NUM: &str = r"(-?[0-9]+\.[0-9]+)";

/// One positional extraction rule: a latitude capture followed by a longitude capture.
pub struct ExtractionRule {
    pub name: &'static str,
    regex: Regex,
}

impl ExtractionRule {
    fn new(name: &'static str, template: &str) -> Self {
        let pattern = template.replace("{n}", NUM);
        Self {
            name,
            regex: Regex::new(&pattern).expect("extraction rule must be a valid regex"),
        }
    }

    fn capture(&self, text: &str) -> Option<Coordinate> {
        let caps = self.regex.captures(text)?;
        let lat: f64 = caps.get(1)?.as_str().parse().ok()?;
        let lon: f64 = caps.get(2)?.as_str().parse().ok()?;
        Coordinate::rounded(lat, lon)
    }
}

/// Ordered rule set, highest priority first.
pub struct PatternLibrary {
    rules: Vec<ExtractionRule>,
}

impl PatternLibrary {
    /// The encodings map links use for points of interest.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                ExtractionRule::new("at-marker", r"@{n},{n}"),
                ExtractionRule::new("q-param", r"q={n},{n}"),
                ExtractionRule::new("pb-marker", r"!3d{n}!4d{n}"),
                ExtractionRule::new("ll-param", r"ll={n},{n}"),
                ExtractionRule::new("query-param", r"query={n},{n}"),
                ExtractionRule::new("zoom-marker", r"@{n},{n},[0-9.]+z"),
                ExtractionRule::new("path-marker", r"/@{n},{n}"),
                ExtractionRule::new("place-marker", r"place/.*@{n},{n}"),
                ExtractionRule::new("data-pb-marker", r"data=!3d{n}!4d{n}"),
            ],
        }
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name)
    }

    /// First matching rule and its coordinate.
    pub fn extract_with_rule(&self, text: &str) -> Option<(&'static str, Coordinate)> {
        self.rules
            .iter()
            .find_map(|rule| rule.capture(text).map(|c| (rule.name, c)))
    }

    pub fn extract(&self, text: &str) -> Option<Coordinate> {
        self.extract_with_rule(text).map(|(_, c)| c)
    }
}

static STANDARD: LazyLock<PatternLibrary> = LazyLock::new(PatternLibrary::standard);

/// Extract a coordinate from URL text using the standard library.
pub fn extract(text: &str) -> Option<Coordinate> {
    match STANDARD.extract_with_rule(text) {
        Some((rule, coord)) => {
            tracing::debug!(rule, %coord, "coordinate extracted");
            Some(coord)
        }
        None => None,
    }
}
