//! Fault mechanism classification and label maps.

/// Numeric mechanism codes used by flatfile catalogs.
pub const MECHANISM_MAP: &[(i64, &str)] = &[
    (0, "StrikeSlip"),
    (1, "Normal"),
    (2, "Reverse"),
    (3, "Reverse/Oblique"),
    (4, "Normal/Oblique"),
    (5, "Oblique"),
    (-999, "Unknown"),
];

pub fn mechanism_text(code: i64) -> &'static str {
    MECHANISM_MAP
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
        .unwrap_or("Unknown")
}

pub fn mechanism_code(label: &str) -> i64 {
    MECHANISM_MAP
        .iter()
        .find(|(_, l)| *l == label)
        .map(|(c, _)| *c)
        .unwrap_or(-999)
}

/// Classify one fault plane from its dip and rake angles.
///
/// Rake near 0° or ±180° reads as strike-slip, near +90° as reverse, near
/// -90° as normal; shallow dips (< 30°) push the dip-slip classes into
/// their oblique variants; everything else is oblique.
pub fn classify_fault_type(dip: Option<f64>, rake: Option<f64>) -> &'static str {
    let (dip, rake) = match (dip, rake) {
        (Some(d), Some(r)) => (d, r),
        _ => return "Unknown",
    };

    // normalize rake into [-180, 180)
    let rake = (rake + 180.0).rem_euclid(360.0) - 180.0;

    if (-30.0..=30.0).contains(&rake) || (150.0..=180.0).contains(&rake.abs()) {
        "StrikeSlip"
    } else if (60.0..=120.0).contains(&rake) {
        if dip >= 30.0 {
            "Reverse"
        } else {
            "Reverse/Oblique"
        }
    } else if (-120.0..=-60.0).contains(&rake) {
        if dip >= 30.0 {
            "Normal"
        } else {
            "Normal/Oblique"
        }
    } else {
        "Oblique"
    }
}

/// Classify both nodal planes: equal classes collapse to one label,
/// unequal ones join as "A-B".
pub fn classify_fault_planes(
    dip1: Option<f64>,
    rake1: Option<f64>,
    dip2: Option<f64>,
    rake2: Option<f64>,
) -> String {
    let first = classify_fault_type(dip1, rake1);
    let second = classify_fault_type(dip2, rake2);
    if first == second {
        first.to_string()
    } else {
        format!("{first}-{second}")
    }
}
