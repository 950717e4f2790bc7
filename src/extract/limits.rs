//! Tolerance zone arithmetic and number formatting for the table cells.

const FORM_KINDS: &[&str] = &["flatness", "straightness", "circularity", "cylindricity"];
const LOCATION_KINDS: &[&str] = &["position", "concentricity", "symmetry"];

/// Prints a float the way the table shows numbers: integral values keep one
/// decimal (`20.0`), everything else uses the shortest round-trip form.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Upper and lower limit of a tolerance zone around `nominal`.
///
/// Form tolerances run from perfect form up to `+t`; location tolerances and
/// anything unknown are centred (`±t/2`). Datums are references (`REF`).
/// `N/A` is treated as a zero tolerance; any other non-numeric value yields
/// `N/A` for both limits.
pub fn tolerance_limits(kind: &str, value: &str, nominal: f64) -> (String, String) {
    let kind = kind.to_lowercase();
    if kind == "datum" {
        return ("REF".to_string(), "REF".to_string());
    }

    let tolerance = if value == "N/A" {
        0.0
    } else {
        match value.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => return ("N/A".to_string(), "N/A".to_string()),
        }
    };

    let (upper, lower) = if FORM_KINDS.contains(&kind.as_str()) {
        (nominal + tolerance, nominal)
    } else {
        if !LOCATION_KINDS.contains(&kind.as_str()) {
            tracing::trace!("No zone convention for '{}', using a centred zone", kind);
        }
        (nominal + tolerance / 2.0, nominal - tolerance / 2.0)
    };

    (format_number(round4(upper)), format_number(round4(lower)))
}

/// `±value` for numeric values.
pub fn format_tolerance_value(value: &str) -> String {
    if value.is_empty() || value == "N/A" {
        return "N/A".to_string();
    }
    match value.trim().parse::<f64>() {
        Ok(_) => format!("±{}", value),
        Err(_) => value.to_string(),
    }
}
