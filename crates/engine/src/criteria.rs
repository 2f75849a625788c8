use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::registry::{self, Param};

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Per-parameter scoring weights. Defaults come from the scoring registry;
/// a caller override of 0 removes that parameter from scoring entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub magnitude: f64,
    pub rjb: f64,
    pub rrup: f64,
    pub repi: f64,
    pub vs30: f64,
    pub pga: f64,
    pub pgv: f64,
    pub pgd: f64,
    pub t90: f64,
    pub arias: f64,
    pub depth: f64,
    pub mechanism: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            magnitude: registry::spec(Param::Magnitude).default_weight,
            rjb: registry::spec(Param::Rjb).default_weight,
            rrup: registry::spec(Param::Rrup).default_weight,
            repi: registry::spec(Param::Repi).default_weight,
            vs30: registry::spec(Param::Vs30).default_weight,
            pga: registry::spec(Param::Pga).default_weight,
            pgv: registry::spec(Param::Pgv).default_weight,
            pgd: registry::spec(Param::Pgd).default_weight,
            t90: registry::spec(Param::T90).default_weight,
            arias: registry::spec(Param::Arias).default_weight,
            depth: registry::spec(Param::Depth).default_weight,
            mechanism: registry::spec(Param::Mechanism).default_weight,
        }
    }
}

impl Weights {
    pub fn get(&self, key: Param) -> f64 {
        match key {
            Param::Magnitude => self.magnitude,
            Param::Rjb => self.rjb,
            Param::Rrup => self.rrup,
            Param::Repi => self.repi,
            Param::Vs30 => self.vs30,
            Param::Pga => self.pga,
            Param::Pgv => self.pgv,
            Param::Pgd => self.pgd,
            Param::T90 => self.t90,
            Param::Arias => self.arias,
            Param::Depth => self.depth,
            Param::Mechanism => self.mechanism,
        }
    }
}

// ---------------------------------------------------------------------------
// Search criteria
// ---------------------------------------------------------------------------

/// Mechanism labels accepted in criteria and produced by classification.
pub const KNOWN_MECHANISMS: &[&str] = &[
    "StrikeSlip",
    "Normal",
    "Reverse",
    "Reverse/Oblique",
    "Normal/Oblique",
    "Oblique",
    "Unknown",
];

/// What the caller wants: ranges, explicit targets, categorical constraints
/// and scoring weights. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    #[serde(default)]
    pub min_magnitude: Option<f64>,
    #[serde(default)]
    pub max_magnitude: Option<f64>,
    #[serde(default)]
    pub min_depth: Option<f64>,
    #[serde(default)]
    pub max_depth: Option<f64>,
    #[serde(default)]
    pub min_rjb: Option<f64>,
    #[serde(default)]
    pub max_rjb: Option<f64>,
    #[serde(default)]
    pub min_rrup: Option<f64>,
    #[serde(default)]
    pub max_rrup: Option<f64>,
    #[serde(default)]
    pub min_repi: Option<f64>,
    #[serde(default)]
    pub max_repi: Option<f64>,
    #[serde(default)]
    pub min_rhyp: Option<f64>,
    #[serde(default)]
    pub max_rhyp: Option<f64>,
    #[serde(default)]
    pub min_vs30: Option<f64>,
    #[serde(default)]
    pub max_vs30: Option<f64>,
    #[serde(default)]
    pub min_pga: Option<f64>,
    #[serde(default)]
    pub max_pga: Option<f64>,
    #[serde(default)]
    pub min_pgv: Option<f64>,
    #[serde(default)]
    pub max_pgv: Option<f64>,
    #[serde(default)]
    pub min_pgd: Option<f64>,
    #[serde(default)]
    pub max_pgd: Option<f64>,

    /// Explicit scoring targets. When absent, the midpoint of the matching
    /// range stands in; when that is absent too, the parameter is excluded
    /// from scoring.
    #[serde(default)]
    pub target_magnitude: Option<f64>,
    #[serde(default)]
    pub target_rjb: Option<f64>,
    #[serde(default)]
    pub target_rrup: Option<f64>,
    #[serde(default)]
    pub target_repi: Option<f64>,
    #[serde(default)]
    pub target_vs30: Option<f64>,
    #[serde(default)]
    pub target_pga: Option<f64>,
    #[serde(default)]
    pub target_pgv: Option<f64>,
    #[serde(default)]
    pub target_pgd: Option<f64>,
    #[serde(default)]
    pub target_t90: Option<f64>,
    #[serde(default)]
    pub target_arias: Option<f64>,
    #[serde(default)]
    pub target_depth: Option<f64>,

    /// Accepted fault mechanism labels; empty disables the constraint.
    #[serde(default)]
    pub mechanisms: Vec<String>,

    /// Geographic box: (min_lat, max_lat, min_lon, max_lon).
    #[serde(default)]
    pub bbox: Option<[f64; 4]>,

    #[serde(default)]
    pub weights: Weights,
}

impl SearchCriteria {
    /// Minimal criteria over a date window; everything else defaulted.
    pub fn for_dates(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            min_magnitude: None,
            max_magnitude: None,
            min_depth: None,
            max_depth: None,
            min_rjb: None,
            max_rjb: None,
            min_rrup: None,
            max_rrup: None,
            min_repi: None,
            max_repi: None,
            min_rhyp: None,
            max_rhyp: None,
            min_vs30: None,
            max_vs30: None,
            min_pga: None,
            max_pga: None,
            min_pgv: None,
            max_pgv: None,
            min_pgd: None,
            max_pgd: None,
            target_magnitude: None,
            target_rjb: None,
            target_rrup: None,
            target_repi: None,
            target_vs30: None,
            target_pga: None,
            target_pgv: None,
            target_pgd: None,
            target_t90: None,
            target_arias: None,
            target_depth: None,
            mechanisms: Vec::new(),
            bbox: None,
            weights: Weights::default(),
        }
    }

    /// (explicit target, min, max) triple for a numeric parameter key.
    fn target_fields(&self, key: Param) -> (Option<f64>, Option<f64>, Option<f64>) {
        match key {
            Param::Magnitude => (self.target_magnitude, self.min_magnitude, self.max_magnitude),
            Param::Rjb => (self.target_rjb, self.min_rjb, self.max_rjb),
            Param::Rrup => (self.target_rrup, self.min_rrup, self.max_rrup),
            Param::Repi => (self.target_repi, self.min_repi, self.max_repi),
            Param::Vs30 => (self.target_vs30, self.min_vs30, self.max_vs30),
            Param::Pga => (self.target_pga, self.min_pga, self.max_pga),
            Param::Pgv => (self.target_pgv, self.min_pgv, self.max_pgv),
            Param::Pgd => (self.target_pgd, self.min_pgd, self.max_pgd),
            Param::T90 => (self.target_t90, None, None),
            Param::Arias => (self.target_arias, None, None),
            Param::Depth => (self.target_depth, self.min_depth, self.max_depth),
            Param::Mechanism => (None, None, None),
        }
    }

    /// The single scalar a record's value is compared against: explicit
    /// target, else range midpoint, else the one bound given, else none
    /// (parameter excluded from scoring this run).
    pub fn effective_target(&self, key: Param) -> Option<f64> {
        let (explicit, min, max) = self.target_fields(key);
        if explicit.is_some() {
            return explicit;
        }
        match (min, max) {
            (Some(lo), Some(hi)) => Some((lo + hi) / 2.0),
            (Some(lo), None) => Some(lo),
            (None, Some(hi)) => Some(hi),
            (None, None) => None,
        }
    }

    /// Gaussian spread for a parameter: range width over the registry
    /// strictness, else a tenth of the target. Never zero or negative; a
    /// collapsed range floors at 1.0.
    pub fn sigma(&self, key: Param) -> f64 {
        let strictness = registry::spec(key).strictness;
        let (_, min, max) = self.target_fields(key);

        if let (Some(lo), Some(hi)) = (min, max) {
            let diff = hi - lo;
            return if diff > 0.0 { diff / strictness } else { 1.0 };
        }

        match self.effective_target(key) {
            Some(target) if target * 0.1 > 0.0 => target * 0.1,
            _ => 1.0,
        }
    }

    // -- Validation -----------------------------------------------------

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.start_date > self.end_date {
            return Err(EngineError::DateOrder {
                start: self.start_date,
                end: self.end_date,
            });
        }

        check_range("magnitude", self.min_magnitude, self.max_magnitude, 0.0, 10.0)?;
        check_range("depth", self.min_depth, self.max_depth, 0.0, 700.0)?;
        check_range("vs30", self.min_vs30, self.max_vs30, 0.0, 3000.0)?;
        check_range("pga", self.min_pga, self.max_pga, 0.0, 10000.0)?;
        check_range("pgv", self.min_pgv, self.max_pgv, 0.0, 1000.0)?;
        check_range("pgd", self.min_pgd, self.max_pgd, 0.0, 1000.0)?;
        check_distance("rjb", self.min_rjb, self.max_rjb)?;
        check_distance("rrup", self.min_rrup, self.max_rrup)?;
        check_distance("repi", self.min_repi, self.max_repi)?;
        check_distance("rhyp", self.min_rhyp, self.max_rhyp)?;

        if let Some([min_lat, max_lat, min_lon, max_lon]) = self.bbox {
            if !(-90.0..=90.0).contains(&min_lat) || !(-90.0..=90.0).contains(&max_lat) {
                return Err(EngineError::BoundingBox(
                    "latitudes must lie within [-90, 90]".into(),
                ));
            }
            if !(-180.0..=180.0).contains(&min_lon) || !(-180.0..=180.0).contains(&max_lon) {
                return Err(EngineError::BoundingBox(
                    "longitudes must lie within [-180, 180]".into(),
                ));
            }
            if min_lat > max_lat || min_lon > max_lon {
                return Err(EngineError::BoundingBox(
                    "expected (min_lat, max_lat, min_lon, max_lon) order".into(),
                ));
            }
        }

        for mechanism in &self.mechanisms {
            if !KNOWN_MECHANISMS.contains(&mechanism.as_str()) {
                return Err(EngineError::UnknownMechanism(mechanism.clone()));
            }
        }

        Ok(())
    }
}

fn check_range(
    field: &'static str,
    min: Option<f64>,
    max: Option<f64>,
    lo: f64,
    hi: f64,
) -> Result<(), EngineError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(EngineError::InvertedRange { field, min, max });
        }
    }
    for value in [min, max].into_iter().flatten() {
        if !(lo..=hi).contains(&value) {
            return Err(EngineError::OutOfDomain { field, value, lo, hi });
        }
    }
    Ok(())
}

fn check_distance(
    field: &'static str,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(), EngineError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(EngineError::InvertedRange { field, min, max });
        }
    }
    for value in [min, max].into_iter().flatten() {
        if value < 0.0 {
            return Err(EngineError::OutOfDomain {
                field,
                value,
                lo: 0.0,
                hi: f64::INFINITY,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Selection config
// ---------------------------------------------------------------------------

/// Shortlist size, diversity caps and acceptance floor, plus the design code
/// naming the active strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub design_code: String,
    #[serde(default = "default_num_records")]
    pub num_records: usize,
    #[serde(default = "default_max_per_station")]
    pub max_per_station: usize,
    #[serde(default = "default_max_per_event")]
    pub max_per_event: usize,
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

fn default_num_records() -> usize {
    22
}

fn default_max_per_station() -> usize {
    3
}

fn default_max_per_event() -> usize {
    3
}

fn default_min_score() -> f64 {
    50.0
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            design_code: "TBDY_2018".into(),
            num_records: default_num_records(),
            max_per_station: default_max_per_station(),
            max_per_event: default_max_per_event(),
            min_score: default_min_score(),
        }
    }
}

// ---------------------------------------------------------------------------
// Request = criteria + selection, as loaded from one TOML document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub criteria: SearchCriteria,
    #[serde(default)]
    pub selection: SelectionConfig,
}

impl SelectionRequest {
    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let request: SelectionRequest =
            toml::from_str(input).map_err(|e| EngineError::CriteriaParse(e.to_string()))?;
        request.criteria.validate()?;
        Ok(request)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria() -> SearchCriteria {
        SearchCriteria::for_dates(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        )
    }

    #[test]
    fn effective_target_prefers_explicit() {
        let mut c = criteria();
        c.min_magnitude = Some(6.0);
        c.max_magnitude = Some(7.0);
        c.target_magnitude = Some(6.8);
        assert_eq!(c.effective_target(Param::Magnitude), Some(6.8));
    }

    #[test]
    fn effective_target_falls_back_to_midpoint() {
        let mut c = criteria();
        c.min_magnitude = Some(6.0);
        c.max_magnitude = Some(7.0);
        assert_eq!(c.effective_target(Param::Magnitude), Some(6.5));
    }

    #[test]
    fn effective_target_uses_single_bound() {
        let mut c = criteria();
        c.min_rjb = Some(10.0);
        assert_eq!(c.effective_target(Param::Rjb), Some(10.0));
        let mut c = criteria();
        c.max_rjb = Some(40.0);
        assert_eq!(c.effective_target(Param::Rjb), Some(40.0));
    }

    #[test]
    fn effective_target_none_without_inputs() {
        assert_eq!(criteria().effective_target(Param::Vs30), None);
    }

    #[test]
    fn sigma_from_range_and_strictness() {
        let mut c = criteria();
        c.min_magnitude = Some(6.0);
        c.max_magnitude = Some(7.0);
        // strictness 4.0 -> (7 - 6) / 4
        assert!((c.sigma(Param::Magnitude) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn sigma_floors_on_degenerate_range() {
        let mut c = criteria();
        c.min_magnitude = Some(6.0);
        c.max_magnitude = Some(6.0);
        assert_eq!(c.effective_target(Param::Magnitude), Some(6.0));
        assert_eq!(c.sigma(Param::Magnitude), 1.0);
    }

    #[test]
    fn sigma_fallback_is_tenth_of_target() {
        let mut c = criteria();
        c.target_vs30 = Some(400.0);
        assert!((c.sigma(Param::Vs30) - 40.0).abs() < 1e-12);
    }

    #[test]
    fn sigma_fallback_floors_on_zero_target() {
        let mut c = criteria();
        c.target_pgd = Some(0.0);
        assert_eq!(c.sigma(Param::Pgd), 1.0);
    }

    #[test]
    fn validate_rejects_inverted_magnitude() {
        let mut c = criteria();
        c.min_magnitude = Some(7.0);
        c.max_magnitude = Some(6.0);
        assert!(matches!(
            c.validate(),
            Err(EngineError::InvertedRange { field: "magnitude", .. })
        ));
    }

    #[test]
    fn validate_rejects_out_of_domain_vs30() {
        let mut c = criteria();
        c.min_vs30 = Some(100.0);
        c.max_vs30 = Some(4000.0);
        assert!(matches!(
            c.validate(),
            Err(EngineError::OutOfDomain { field: "vs30", .. })
        ));
    }

    #[test]
    fn validate_rejects_negative_distance() {
        let mut c = criteria();
        c.min_rjb = Some(-1.0);
        assert!(matches!(
            c.validate(),
            Err(EngineError::OutOfDomain { field: "rjb", .. })
        ));
    }

    #[test]
    fn validate_rejects_date_order() {
        let c = SearchCriteria::for_dates(
            NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        );
        assert!(matches!(c.validate(), Err(EngineError::DateOrder { .. })));
    }

    #[test]
    fn validate_rejects_unknown_mechanism() {
        let mut c = criteria();
        c.mechanisms = vec!["Thrust".into()];
        assert!(matches!(
            c.validate(),
            Err(EngineError::UnknownMechanism(_))
        ));
    }

    #[test]
    fn validate_rejects_swapped_bbox() {
        let mut c = criteria();
        c.bbox = Some([40.0, 36.0, 26.0, 45.0]);
        assert!(matches!(c.validate(), Err(EngineError::BoundingBox(_))));
    }

    #[test]
    fn request_from_toml() {
        let input = r#"
[criteria]
start_date = "2023-01-01"
end_date = "2023-12-31"
min_magnitude = 6.0
max_magnitude = 7.5
min_vs30 = 200.0
max_vs30 = 760.0
mechanisms = ["StrikeSlip"]

[criteria.weights]
magnitude = 6.0

[selection]
design_code = "TBDY_2018"
num_records = 11
min_score = 40.0
"#;
        let request = SelectionRequest::from_toml(input).unwrap();
        assert_eq!(request.criteria.min_magnitude, Some(6.0));
        assert_eq!(request.criteria.weights.magnitude, 6.0);
        // untouched weights keep their registry defaults
        assert_eq!(request.criteria.weights.rjb, 4.5);
        assert_eq!(request.selection.num_records, 11);
        assert_eq!(request.selection.max_per_station, 3);
    }

    #[test]
    fn request_from_toml_rejects_invalid_criteria() {
        let input = r#"
[criteria]
start_date = "2023-01-01"
end_date = "2023-12-31"
min_magnitude = 11.0
max_magnitude = 12.0

[selection]
design_code = "TBDY_2018"
"#;
        assert!(SelectionRequest::from_toml(input).is_err());
    }
}
