//! Fixed scoring-parameter registry.
//!
//! One descriptor per scorable parameter: adding a parameter means adding a
//! descriptor here, not new control flow in the scorer. Weights and
//! strictness values are hand-tuned reference configuration, not logic.

/// Logical key of a scorable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    Magnitude,
    Rjb,
    Rrup,
    Repi,
    Vs30,
    Pga,
    Pgv,
    Pgd,
    T90,
    Arias,
    Depth,
    Mechanism,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Numeric,
    Categorical,
}

pub struct ParamSpec {
    pub key: Param,
    /// Catalog column the record value is read from.
    pub column: &'static str,
    pub default_weight: f64,
    /// Divides the criteria range width to obtain the Gaussian sigma.
    pub strictness: f64,
    pub kind: ParamKind,
}

pub const SCORING_REGISTRY: &[ParamSpec] = &[
    ParamSpec { key: Param::Magnitude, column: "MAGNITUDE", default_weight: 5.0, strictness: 4.0, kind: ParamKind::Numeric },
    ParamSpec { key: Param::Rjb, column: "RJB(km)", default_weight: 4.5, strictness: 4.0, kind: ParamKind::Numeric },
    ParamSpec { key: Param::Rrup, column: "RRUP(km)", default_weight: 4.0, strictness: 4.0, kind: ParamKind::Numeric },
    ParamSpec { key: Param::Repi, column: "REPI(km)", default_weight: 3.5, strictness: 4.0, kind: ParamKind::Numeric },
    ParamSpec { key: Param::Vs30, column: "VS30(m/s)", default_weight: 4.0, strictness: 4.0, kind: ParamKind::Numeric },
    ParamSpec { key: Param::Pga, column: "PGA(cm2/sec)", default_weight: 3.5, strictness: 4.0, kind: ParamKind::Numeric },
    ParamSpec { key: Param::Pgv, column: "PGV(cm/sec)", default_weight: 3.0, strictness: 4.0, kind: ParamKind::Numeric },
    ParamSpec { key: Param::Pgd, column: "PGD(cm)", default_weight: 2.5, strictness: 4.0, kind: ParamKind::Numeric },
    ParamSpec { key: Param::T90, column: "T90_avg(sec)", default_weight: 3.0, strictness: 4.0, kind: ParamKind::Numeric },
    ParamSpec { key: Param::Arias, column: "ARIAS_INTENSITY(m/sec)", default_weight: 2.5, strictness: 4.0, kind: ParamKind::Numeric },
    ParamSpec { key: Param::Depth, column: "HYPO_DEPTH(km)", default_weight: 2.0, strictness: 4.0, kind: ParamKind::Numeric },
    ParamSpec { key: Param::Mechanism, column: "MECHANISM", default_weight: 3.0, strictness: 4.0, kind: ParamKind::Categorical },
];

/// Descriptor for a parameter key. The registry is total over [`Param`].
pub fn spec(key: Param) -> &'static ParamSpec {
    SCORING_REGISTRY
        .iter()
        .find(|s| s.key == key)
        .expect("every Param has a registry entry")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_param() {
        for key in [
            Param::Magnitude,
            Param::Rjb,
            Param::Rrup,
            Param::Repi,
            Param::Vs30,
            Param::Pga,
            Param::Pgv,
            Param::Pgd,
            Param::T90,
            Param::Arias,
            Param::Depth,
            Param::Mechanism,
        ] {
            let s = spec(key);
            assert!(s.default_weight > 0.0);
            assert!(s.strictness > 0.0);
        }
    }

    #[test]
    fn mechanism_is_the_only_categorical() {
        let categorical: Vec<_> = SCORING_REGISTRY
            .iter()
            .filter(|s| s.kind == ParamKind::Categorical)
            .collect();
        assert_eq!(categorical.len(), 1);
        assert_eq!(categorical[0].key, Param::Mechanism);
    }
}
