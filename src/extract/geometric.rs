use super::datum::DatumTable;
use super::limits::{format_number, format_tolerance_value, tolerance_limits};
use super::surface::{self, CYLINDRICAL_SIDE, PLANAR_SURFACE};
use crate::domain::model::{RowKind, ToleranceRow};
use crate::step::{Entity, StepFile};
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometricKind {
    Straightness,
    Flatness,
    Circularity,
    Cylindricity,
    Position,
    Perpendicularity,
    Parallelism,
    Angularity,
    Concentricity,
    Symmetry,
    CircularRunout,
    TotalRunout,
    LineProfile,
    SurfaceProfile,
}

impl GeometricKind {
    pub fn from_entity_name(name: &str) -> Option<Self> {
        let kind = match name {
            "STRAIGHTNESS_TOLERANCE" => GeometricKind::Straightness,
            "FLATNESS_TOLERANCE" => GeometricKind::Flatness,
            "ROUNDNESS_TOLERANCE" => GeometricKind::Circularity,
            "CYLINDRICITY_TOLERANCE" => GeometricKind::Cylindricity,
            "POSITION_TOLERANCE" => GeometricKind::Position,
            "PERPENDICULARITY_TOLERANCE" => GeometricKind::Perpendicularity,
            "PARALLELISM_TOLERANCE" => GeometricKind::Parallelism,
            "ANGULARITY_TOLERANCE" => GeometricKind::Angularity,
            "CONCENTRICITY_TOLERANCE" | "COAXIALITY_TOLERANCE" => GeometricKind::Concentricity,
            "SYMMETRY_TOLERANCE" => GeometricKind::Symmetry,
            "CIRCULAR_RUNOUT_TOLERANCE" => GeometricKind::CircularRunout,
            "TOTAL_RUNOUT_TOLERANCE" => GeometricKind::TotalRunout,
            "LINE_PROFILE_TOLERANCE" => GeometricKind::LineProfile,
            "SURFACE_PROFILE_TOLERANCE" => GeometricKind::SurfaceProfile,
            _ => return None,
        };
        Some(kind)
    }

    pub fn label(self) -> &'static str {
        match self {
            GeometricKind::Straightness => "Straightness",
            GeometricKind::Flatness => "Flatness",
            GeometricKind::Circularity => "Circularity",
            GeometricKind::Cylindricity => "Cylindricity",
            GeometricKind::Position => "Position",
            GeometricKind::Perpendicularity => "Perpendicularity",
            GeometricKind::Parallelism => "Parallelism",
            GeometricKind::Angularity => "Angularity",
            GeometricKind::Concentricity => "Concentricity",
            GeometricKind::Symmetry => "Symmetry",
            GeometricKind::CircularRunout => "Circular Runout",
            GeometricKind::TotalRunout => "Total Runout",
            GeometricKind::LineProfile => "Line Profile",
            GeometricKind::SurfaceProfile => "Surface Profile",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            GeometricKind::Straightness => "─",
            GeometricKind::Flatness => "☐",
            GeometricKind::Circularity => "○",
            GeometricKind::Cylindricity => "⌀",
            GeometricKind::Position => "⌖",
            GeometricKind::Perpendicularity => "⟂",
            GeometricKind::Parallelism => "∥",
            GeometricKind::Angularity => "∠",
            GeometricKind::Concentricity => "◎",
            GeometricKind::Symmetry => "⌯",
            GeometricKind::CircularRunout => "↗",
            GeometricKind::TotalRunout => "⌰",
            GeometricKind::LineProfile => "⌒",
            GeometricKind::SurfaceProfile => "⌓",
        }
    }
}

/// Entities walked from a tolerance towards the datums it is measured from.
const DATUM_LINKS: &[&str] = &[
    "DATUM_SYSTEM",
    "DATUM_REFERENCE_COMPARTMENT",
    "DATUM_REFERENCE_ELEMENT",
    "DATUM_REFERENCE",
];
const MAX_DATUM_HOPS: usize = 4;

struct Annotation<'a> {
    entity: &'a Entity,
    kind: GeometricKind,
    name: String,
    value: String,
}

fn annotation<'a>(file: &StepFile, entity: &'a Entity) -> Option<Annotation<'a>> {
    let (kind_record, kind) = entity
        .records
        .iter()
        .find_map(|r| GeometricKind::from_entity_name(&r.name).map(|k| (r, k)))?;

    // Complex instances carry the arguments on the GEOMETRIC_TOLERANCE record.
    let args = if kind_record.params.len() >= 3 {
        kind_record
    } else {
        entity.record("GEOMETRIC_TOLERANCE")?
    };

    let value = args
        .ref_param(2)
        .and_then(|id| file.entity(id))
        .and_then(Entity::length_measure)
        .map(format_number)
        .unwrap_or_else(|| "N/A".to_string());

    Some(Annotation {
        entity,
        kind,
        name: args.str_param(0).unwrap_or_default().to_string(),
        value,
    })
}

/// Rows for every geometric tolerance in file order.
pub fn extract(file: &StepFile, datums: &DatumTable, with_limits: bool) -> Vec<ToleranceRow> {
    let mut rows = Vec::new();

    for entity in file.entities() {
        let Some(annotation) = annotation(file, entity) else {
            continue;
        };
        let (datum, location) = resolve(file, datums, &annotation, rows.len());

        tracing::debug!(
            "#{} {} '{}' = {} -> datum {:?}, {}",
            entity.id,
            annotation.kind.label(),
            annotation.name,
            annotation.value,
            datum,
            location
        );

        let (tolerance_value, upper_limit, lower_limit) = if with_limits {
            let (upper, lower) = tolerance_limits(annotation.kind.label(), &annotation.value, 0.0);
            (format_tolerance_value(&annotation.value), upper, lower)
        } else {
            (String::new(), String::new(), String::new())
        };

        rows.push(ToleranceRow {
            kind: RowKind::Geometric,
            type_label: format!("{} {}", annotation.kind.symbol(), annotation.kind.label()),
            value: annotation.value,
            datum: datum.map(String::from).unwrap_or_default(),
            surface: surface::surface_for_location(&location),
            location: if location.is_empty() {
                "surface".to_string()
            } else {
                location
            },
            tolerance_value,
            upper_limit,
            lower_limit,
        });
    }

    rows
}

/// Datum letter and location of one tolerance. `emitted` is the number of
/// geometric rows produced so far; straightness tolerances without any other
/// clue are spread over the datums in that order.
fn resolve(
    file: &StepFile,
    datums: &DatumTable,
    annotation: &Annotation<'_>,
    emitted: usize,
) -> (Option<char>, String) {
    let name = annotation.name.as_str();
    let name_lower = name.to_lowercase();
    let mut letter: Option<char> = None;
    let mut location = String::new();

    if let Some(l) = surface::letter_in_parens(name) {
        letter = Some(l);
        location = datums.location(l).unwrap_or_default().to_string();
    }

    if letter.is_none() {
        let mentioned = datums.letters().find(|l| {
            name_lower.contains(&format!("({})", l.to_ascii_lowercase()))
                || name.contains(&format!("({})", l))
        });
        if let Some(l) = mentioned {
            letter = Some(l);
            location = datums.location(l).unwrap_or_default().to_string();
        }
    }

    if letter.is_none() {
        if let Some(l) = datum_feature_letter(file, annotation.entity) {
            letter = Some(l);
            location = datums.location(l).unwrap_or_default().to_string();
        }
    }

    if letter.is_none() {
        if let Some(l) = referenced_datum(file, datums, annotation.entity) {
            letter = Some(l);
            location = datums.location(l).unwrap_or_default().to_string();
        }
    }

    if location.is_empty() {
        let by_name = if name_lower.contains("boss") {
            Some((CYLINDRICAL_SIDE, Some("boss")))
        } else if name_lower.contains("plane1") {
            Some((surface::BOTTOM_FACE, Some("plane1")))
        } else if name_lower.contains("plane2") {
            Some((surface::TOP_FACE, Some("plane2")))
        } else if name_lower.contains("plane") {
            Some((PLANAR_SURFACE, None))
        } else {
            None
        };
        if let Some((loc, feature)) = by_name {
            location = loc.to_string();
            if letter.is_none() {
                letter = feature.and_then(|f| datums.feature_containing(f));
            }
        }
    }

    if letter.is_none() && !location.is_empty() {
        letter = datums
            .locations()
            .find(|(_, candidate)| compatible(&location, candidate))
            .map(|(l, _)| l);
    }

    if location.is_empty() {
        match annotation.kind {
            GeometricKind::Cylindricity | GeometricKind::Circularity => {
                location = CYLINDRICAL_SIDE.to_string();
                if let Some(l) = datums.first_where(|loc| loc == CYLINDRICAL_SIDE) {
                    letter = Some(l);
                }
            }
            GeometricKind::Flatness => {
                location = PLANAR_SURFACE.to_string();
                if let Some((l, loc)) = datums.locations().find(|(_, loc)| loc.contains("face")) {
                    letter = Some(l);
                    location = loc.to_string();
                }
            }
            GeometricKind::Straightness => {
                let available: Vec<char> = datums.letters().collect();
                if !available.is_empty() {
                    let l = if emitted < available.len() {
                        available[emitted]
                    } else {
                        available[0]
                    };
                    letter = Some(l);
                    location = datums.location(l).unwrap_or_default().to_string();
                }
            }
            _ => {}
        }
    }

    (letter, location)
}

fn compatible(location: &str, candidate: &str) -> bool {
    (location == CYLINDRICAL_SIDE && candidate == CYLINDRICAL_SIDE)
        || (surface::is_planar(location) && surface::is_planar(candidate))
}

/// Letter of a `DATUM_FEATURE` sharing a reference with the tolerance.
fn datum_feature_letter(file: &StepFile, tolerance: &Entity) -> Option<char> {
    let mut tolerance_ids = vec![tolerance.id];
    tolerance_ids.extend(tolerance.refs());

    let features: Vec<(HashSet<u64>, char)> = file
        .by_name("DATUM_FEATURE")
        .filter_map(|df| {
            let name = df.record("DATUM_FEATURE")?.str_param(0)?;
            let letter = surface::trailing_datum_letter(name)?;
            let mut ids: HashSet<u64> = df.refs().into_iter().collect();
            ids.insert(df.id);
            Some((ids, letter))
        })
        .collect();

    tolerance_ids.iter().find_map(|id| {
        features
            .iter()
            .find(|(ids, _)| ids.contains(id))
            .map(|(_, letter)| *letter)
    })
}

/// Follows datum system references from the tolerance to a known `DATUM`.
fn referenced_datum(file: &StepFile, datums: &DatumTable, tolerance: &Entity) -> Option<char> {
    let mut queue: VecDeque<(u64, usize)> = tolerance.refs().into_iter().map(|id| (id, 1)).collect();
    let mut seen: HashSet<u64> = HashSet::from([tolerance.id]);

    while let Some((id, depth)) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        let Some(entity) = file.entity(id) else {
            continue;
        };

        if let Some(datum) = entity.record("DATUM") {
            let letter = datum
                .str_param(4)
                .and_then(|s| s.chars().next())
                .filter(|l| datums.contains(*l));
            if letter.is_some() {
                return letter;
            }
            continue;
        }

        let is_link = entity.records.iter().any(|r| DATUM_LINKS.contains(&r.name.as_str()));
        if is_link && depth < MAX_DATUM_HOPS {
            queue.extend(entity.refs().into_iter().map(|next| (next, depth + 1)));
        }
    }

    None
}
