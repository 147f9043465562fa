use crate::catalog::GeolevelIndex;
use crate::error::{EngineError, Result};

/// One resolution tier within a [`Body`]. Geolevels are totally ordered
/// coarsest-to-finest; `simplify_tolerance`/`min_display_zoom` are carried
/// for rendering callers but otherwise opaque to this crate.
#[derive(Debug, Clone)]
pub struct Geolevel {
    pub name: String,
    pub simplify_tolerance: f64,
    pub min_display_zoom: f32,
}

impl Geolevel {
    pub fn new(name: impl Into<String>, simplify_tolerance: f64, min_display_zoom: f32) -> Self {
        Self { name: name.into(), simplify_tolerance, min_display_zoom }
    }
}

/// Multi-member district rules from spec §3 "Legislative Body" (b).
#[derive(Debug, Clone)]
pub struct MultiMemberRules {
    pub min_members_per_district: u32,
    pub max_members_per_district: u32,
    pub min_total_members: u32,
    pub max_total_members: u32,
}

/// A container defining the districting rules for a plan: maximum district
/// count, multi-member configuration, and the ordered geolevel hierarchy.
#[derive(Debug, Clone)]
pub struct Body {
    pub name: String,
    pub max_districts: u32,
    pub multi_member: Option<MultiMemberRules>,
    geolevels: Vec<Geolevel>,
    /// `{name}`/`{num_members}` label template, spec §6 "Labels".
    pub label_template: String,
}

impl Body {
    pub fn new(
        name: impl Into<String>,
        max_districts: u32,
        multi_member: Option<MultiMemberRules>,
        geolevels: Vec<Geolevel>,
        label_template: impl Into<String>,
    ) -> Result<Self> {
        if geolevels.is_empty() {
            return Err(EngineError::InvariantViolation(
                "legislative body must declare at least one geolevel".to_string(),
            ));
        }
        Ok(Self { name: name.into(), max_districts, multi_member, geolevels, label_template: label_template.into() })
    }

    /// All geolevels, coarsest (index 0) to finest.
    #[inline]
    pub fn geolevels(&self) -> &[Geolevel] {
        &self.geolevels
    }

    #[inline]
    pub fn geolevel(&self, index: GeolevelIndex) -> Option<&Geolevel> {
        self.geolevels.get(index.0 as usize)
    }

    /// The finest geolevel — the level at which Characteristics are authoritative.
    #[inline]
    pub fn base_level(&self) -> GeolevelIndex {
        GeolevelIndex((self.geolevels.len() - 1) as u16)
    }

    #[inline]
    pub fn coarsest_level(&self) -> GeolevelIndex {
        GeolevelIndex(0)
    }

    /// The next finer geolevel than `level`, or `None` if already at the base level.
    #[inline]
    pub fn finer(&self, level: GeolevelIndex) -> Option<GeolevelIndex> {
        let next = level.0 + 1;
        (next < self.geolevels.len() as u16).then_some(GeolevelIndex(next))
    }

    #[inline]
    pub fn is_base_level(&self, level: GeolevelIndex) -> bool {
        level == self.base_level()
    }

    /// Render a multi-member district label by substituting `{name}` and `{num_members}`.
    pub fn format_label(&self, name: &str, num_members: u32) -> String {
        self.label_template
            .replace("{name}", name)
            .replace("{num_members}", &num_members.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_level_body() -> Body {
        Body::new(
            "Test Body",
            10,
            None,
            vec![Geolevel::new("county", 100.0, 6.0), Geolevel::new("block", 10.0, 12.0)],
            "{name} ({num_members} seats)",
        )
        .unwrap()
    }

    #[test]
    fn base_and_coarsest_levels() {
        let body = two_level_body();
        assert_eq!(body.coarsest_level(), GeolevelIndex(0));
        assert_eq!(body.base_level(), GeolevelIndex(1));
        assert!(body.is_base_level(GeolevelIndex(1)));
        assert!(!body.is_base_level(GeolevelIndex(0)));
    }

    #[test]
    fn finer_walks_toward_base_then_stops() {
        let body = two_level_body();
        assert_eq!(body.finer(GeolevelIndex(0)), Some(GeolevelIndex(1)));
        assert_eq!(body.finer(GeolevelIndex(1)), None);
    }

    #[test]
    fn empty_geolevels_rejected() {
        assert!(Body::new("Empty", 1, None, vec![], "{name}").is_err());
    }

    #[test]
    fn label_template_substitution() {
        let body = two_level_body();
        assert_eq!(body.format_label("District 1", 3), "District 1 (3 seats)");
    }
}
