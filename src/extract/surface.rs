//! Name based heuristics that turn CAD feature names into surface descriptions.

pub const TOP_FACE: &str = "top face";
pub const BOTTOM_FACE: &str = "bottom face";
pub const CYLINDRICAL_SIDE: &str = "cylindrical side";
pub const PLANAR_SURFACE: &str = "planar surface";
pub const TORUS_SIDE: &str = "torus side";

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Number following the first `plane<digits>` in an already lower-cased name.
pub fn plane_number(fname: &str) -> Option<u64> {
    fname.match_indices("plane").find_map(|(idx, m)| {
        let digits: String = fname[idx + m.len()..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() {
            None
        } else {
            digits.parse().ok()
        }
    })
}

/// Decides which face a planar feature sits on.
///
/// Explicit words in the name win, then the datum letter convention
/// (A is the base, B/C sit on cylinders, D is opposite A), then the plane
/// numbering, then +z/-z hints. Unclassifiable names are returned as given.
pub fn plane_position(feature: &str, datum_letter: Option<char>) -> String {
    if feature.is_empty() {
        return "surface".to_string();
    }

    let fname = feature.to_lowercase();

    if contains_any(&fname, &["top", "upper", "above"]) {
        return TOP_FACE.to_string();
    }
    if contains_any(&fname, &["bottom", "lower", "below", "base"]) {
        return BOTTOM_FACE.to_string();
    }

    match datum_letter.map(|c| c.to_ascii_uppercase()) {
        Some('A') | Some('F') | Some('H') => return BOTTOM_FACE.to_string(),
        Some('B') | Some('C') => return CYLINDRICAL_SIDE.to_string(),
        Some('D') | Some('E') | Some('G') => return TOP_FACE.to_string(),
        Some(_) => {}
        None => {
            if fname.contains("plane1") {
                return BOTTOM_FACE.to_string();
            }
            if fname.contains("plane2") {
                return TOP_FACE.to_string();
            }
        }
    }

    match plane_number(&fname) {
        Some(1) => return BOTTOM_FACE.to_string(),
        Some(n) if n >= 2 => return TOP_FACE.to_string(),
        _ => {}
    }

    if fname.contains("plane") {
        if contains_any(&fname, &["+z", "positive", "high"]) {
            return TOP_FACE.to_string();
        }
        if contains_any(&fname, &["-z", "negative", "low"]) {
            return BOTTOM_FACE.to_string();
        }
        return PLANAR_SURFACE.to_string();
    }

    feature.to_string()
}

/// Location of a datum from its feature name, e.g. `Datum29@Boss1(A)`.
pub fn datum_location(feature_name: &str, letter: char) -> String {
    let geometric = feature_name
        .split_once('@')
        .map(|(_, rest)| rest.split('(').next().unwrap_or_default())
        .filter(|feature| !feature.is_empty());

    match geometric {
        Some(feature) => {
            let feature = feature.to_lowercase();
            if feature.contains("boss") {
                CYLINDRICAL_SIDE.to_string()
            } else if feature.contains("plane1") {
                BOTTOM_FACE.to_string()
            } else if feature.contains("plane2") {
                TOP_FACE.to_string()
            } else if feature.contains("plane") {
                plane_position(&feature, Some(letter))
            } else {
                feature
            }
        }
        None => plane_position(feature_name, Some(letter)),
    }
}

/// Location implied by a shape aspect name, if any keyword matches.
pub fn shape_aspect_location(name: &str) -> Option<&'static str> {
    let name = name.to_lowercase();
    if name.contains("plane1") {
        Some(BOTTOM_FACE)
    } else if name.contains("plane2") {
        Some(TOP_FACE)
    } else if name.contains("boss1") {
        Some(CYLINDRICAL_SIDE)
    } else if name.contains("torus") {
        Some(TORUS_SIDE)
    } else if name.contains("top") {
        Some(TOP_FACE)
    } else if name.contains("bottom") {
        Some(BOTTOM_FACE)
    } else if name.contains("cylindrical") || name.contains("side") {
        Some(CYLINDRICAL_SIDE)
    } else {
        None
    }
}

pub fn surface_for_location(location: &str) -> String {
    match location {
        "" => "surface".to_string(),
        CYLINDRICAL_SIDE => "curved side of the cylinder".to_string(),
        PLANAR_SURFACE => "planar face".to_string(),
        other => other.to_string(),
    }
}

pub fn is_planar(location: &str) -> bool {
    matches!(location, BOTTOM_FACE | TOP_FACE | PLANAR_SURFACE)
}

/// `X` for names ending in `(X)` with `X` in `A..=Z`.
pub fn trailing_datum_letter(name: &str) -> Option<char> {
    let mut tail = name.chars().rev();
    match (tail.next(), tail.next(), tail.next()) {
        (Some(')'), Some(letter), Some('(')) if letter.is_ascii_uppercase() => Some(letter),
        _ => None,
    }
}

/// First `(X)` anywhere in the name, `X` an upper-case letter.
pub fn letter_in_parens(name: &str) -> Option<char> {
    let chars: Vec<char> = name.chars().collect();
    chars.windows(3).find_map(|w| match w {
        ['(', letter, ')'] if letter.is_ascii_uppercase() => Some(*letter),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_position_keywords_win() {
        assert_eq!(plane_position("TopPlane", Some('A')), TOP_FACE);
        assert_eq!(plane_position("base_plane", Some('D')), BOTTOM_FACE);
        assert_eq!(plane_position("", None), "surface");
    }

    #[test]
    fn test_plane_position_datum_letters() {
        assert_eq!(plane_position("plane7", Some('A')), BOTTOM_FACE);
        assert_eq!(plane_position("plane7", Some('c')), CYLINDRICAL_SIDE);
        assert_eq!(plane_position("plane7", Some('D')), TOP_FACE);
        assert_eq!(plane_position("plane7", Some('G')), TOP_FACE);
        assert_eq!(plane_position("plane7", Some('H')), BOTTOM_FACE);
        // Letters without a convention fall through to the plane number.
        assert_eq!(plane_position("plane1", Some('K')), BOTTOM_FACE);
        assert_eq!(plane_position("plane3", Some('K')), TOP_FACE);
    }

    #[test]
    fn test_plane_position_without_letter() {
        assert_eq!(plane_position("Plane1", None), BOTTOM_FACE);
        assert_eq!(plane_position("Plane2", None), TOP_FACE);
        assert_eq!(plane_position("plane5", None), TOP_FACE);
        assert_eq!(plane_position("plane+z", None), TOP_FACE);
        assert_eq!(plane_position("plane-z", None), BOTTOM_FACE);
        assert_eq!(plane_position("midplane", None), PLANAR_SURFACE);
        assert_eq!(plane_position("Fillet3", None), "Fillet3");
    }

    #[test]
    fn test_plane_number() {
        assert_eq!(plane_number("datum@plane12(a)"), Some(12));
        assert_eq!(plane_number("plane_x plane3"), Some(3));
        assert_eq!(plane_number("plane"), None);
    }

    #[test]
    fn test_datum_location() {
        assert_eq!(datum_location("Datum29@Boss1(A)", 'A'), CYLINDRICAL_SIDE);
        assert_eq!(datum_location("Datum28@Plane1(D)", 'D'), BOTTOM_FACE);
        assert_eq!(datum_location("Datum30@Plane2(B)", 'B'), TOP_FACE);
        assert_eq!(datum_location("Datum31@Plane4(E)", 'E'), TOP_FACE);
        assert_eq!(datum_location("Datum32@Hole3(F)", 'F'), "hole3");
        assert_eq!(datum_location("plane", 'C'), CYLINDRICAL_SIDE);
    }

    #[test]
    fn test_shape_aspect_and_surface() {
        assert_eq!(shape_aspect_location("Torus2(B)"), Some(TORUS_SIDE));
        assert_eq!(shape_aspect_location("Fillet"), None);
        assert_eq!(surface_for_location(CYLINDRICAL_SIDE), "curved side of the cylinder");
        assert_eq!(surface_for_location(PLANAR_SURFACE), "planar face");
        assert_eq!(surface_for_location(TOP_FACE), TOP_FACE);
        assert_eq!(surface_for_location(""), "surface");
    }

    #[test]
    fn test_datum_letters_in_names() {
        assert_eq!(trailing_datum_letter("DatumFeature(B)"), Some('B'));
        assert_eq!(trailing_datum_letter("DatumFeature(b)"), None);
        assert_eq!(trailing_datum_letter("(B) feature"), None);
        assert_eq!(letter_in_parens("Flatness(C) of top"), Some('C'));
        assert_eq!(letter_in_parens("Flatness(c)"), None);
    }
}
