use super::datum::DatumTable;
use super::limits::format_number;
use crate::domain::model::{RowKind, ToleranceRow};
use crate::step::{Entity, Param, StepFile};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Deviation {
    lower: f64,
    upper: f64,
}

impl Deviation {
    fn range(&self) -> f64 {
        (self.upper - self.lower).abs()
    }
}

/// Plus/minus tolerances keyed by the dimension they apply to.
struct ToleranceIndex {
    by_dimension: HashMap<u64, Deviation>,
}

impl ToleranceIndex {
    fn build(file: &StepFile) -> Self {
        let mut values: HashMap<u64, Deviation> = HashMap::new();
        for entity in file.by_name("TOLERANCE_VALUE") {
            let Some(record) = entity.record("TOLERANCE_VALUE") else {
                continue;
            };
            let measure = |index: usize| {
                record
                    .ref_param(index)
                    .and_then(|id| file.entity(id))
                    .and_then(Entity::length_measure)
                    .unwrap_or(0.0)
            };
            values.insert(
                entity.id,
                Deviation {
                    lower: measure(0),
                    upper: measure(1),
                },
            );
        }

        let mut by_dimension = HashMap::new();
        for entity in file.by_name("PLUS_MINUS_TOLERANCE") {
            let Some(record) = entity.record("PLUS_MINUS_TOLERANCE") else {
                continue;
            };
            let (Some(range), Some(dimension)) = (record.ref_param(0), record.ref_param(1)) else {
                continue;
            };
            match values.get(&range) {
                Some(deviation) => {
                    by_dimension.insert(dimension, *deviation);
                }
                None => {
                    by_dimension.remove(&dimension);
                    tracing::debug!(
                        "PLUS_MINUS_TOLERANCE #{} has no TOLERANCE_VALUE range",
                        entity.id
                    );
                }
            }
        }

        Self { by_dimension }
    }

    fn get(&self, dimension: u64) -> Option<Deviation> {
        self.by_dimension.get(&dimension).copied()
    }
}

/// Nominal value of a dimension through its characteristic representation.
fn nominal(file: &StepFile, dimension: u64) -> Option<f64> {
    file.by_name("DIMENSIONAL_CHARACTERISTIC_REPRESENTATION")
        .filter_map(|e| e.record("DIMENSIONAL_CHARACTERISTIC_REPRESENTATION"))
        .filter(|r| r.ref_param(0) == Some(dimension))
        .filter_map(|r| r.ref_param(1).and_then(|id| file.entity(id)))
        .filter_map(|representation| {
            representation
                .primary()
                .param(1)
                .and_then(Param::as_list)?
                .iter()
                .filter_map(Param::as_ref_id)
                .filter_map(|id| file.entity(id))
                .find_map(Entity::positive_length_measure)
        })
        .last()
}

fn shape_aspect_name(file: &StepFile, id: Option<u64>) -> String {
    id.and_then(|id| file.entity(id))
        .and_then(|e| e.records.iter().find(|r| r.name.ends_with("SHAPE_ASPECT")))
        .and_then(|r| r.str_param(0))
        .unwrap_or_default()
        .to_string()
}

/// Python-style title case: first letter of every alphabetic run upper-cased.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

struct DimensionCells<'a> {
    type_label: String,
    nominal: Option<f64>,
    datum: Option<char>,
    location: &'a str,
    surface: &'a str,
    deviation: Option<Deviation>,
}

fn row(cells: DimensionCells<'_>) -> ToleranceRow {
    let (tolerance_value, upper_limit, lower_limit) = match cells.deviation {
        Some(dev) => {
            let tolerance = format!("±{:.3}", dev.range() / 2.0);
            match cells.nominal {
                Some(nominal) => (
                    tolerance,
                    format!("{:.3}", nominal + dev.upper),
                    format!("{:.3}", nominal + dev.lower),
                ),
                None => (tolerance, String::new(), String::new()),
            }
        }
        None => (String::new(), String::new(), String::new()),
    };

    ToleranceRow {
        kind: RowKind::Dimensional,
        type_label: cells.type_label,
        value: cells
            .nominal
            .map(format_number)
            .unwrap_or_else(|| "N/A".to_string()),
        datum: cells.datum.map(String::from).unwrap_or_default(),
        location: cells.location.to_string(),
        surface: cells.surface.to_string(),
        tolerance_value,
        upper_limit,
        lower_limit,
    }
}

/// Size rows (diameters, radii) followed by location rows (distances).
pub fn extract(file: &StepFile, datums: &DatumTable) -> Vec<ToleranceRow> {
    let tolerances = ToleranceIndex::build(file);
    let mut rows = Vec::new();

    for entity in file.by_name("DIMENSIONAL_SIZE") {
        let Some(record) = entity.record("DIMENSIONAL_SIZE") else {
            continue;
        };
        let feature = shape_aspect_name(file, record.ref_param(0));
        let size_name = record.str_param(1).unwrap_or_default().to_lowercase();
        let type_label = if size_name.contains("radius") {
            "R Radius"
        } else {
            "⌀ Diameter"
        };
        let (location, surface) = if feature.to_lowercase().contains("boss") {
            ("cylindrical side", "curved side of the cylinder")
        } else {
            ("cylindrical surface", "curved side of the cylinder")
        };

        rows.push(row(DimensionCells {
            type_label: type_label.to_string(),
            nominal: nominal(file, entity.id),
            datum: datums.for_dimension(&feature),
            location,
            surface,
            deviation: tolerances.get(entity.id),
        }));
    }

    let locations = file.entities().filter_map(|e| {
        e.record("DIMENSIONAL_LOCATION")
            .or_else(|| e.record("DIMENSIONAL_LOCATION_WITH_PATH"))
            .map(|r| (e, r))
    });

    for (entity, record) in locations {
        let name = record.str_param(0).unwrap_or_default();
        let first = shape_aspect_name(file, record.ref_param(2));
        let second = shape_aspect_name(file, record.ref_param(3));

        let datum = Some(first.as_str())
            .filter(|f| !f.is_empty())
            .and_then(|f| datums.for_dimension(f))
            .or_else(|| {
                Some(second.as_str())
                    .filter(|f| !f.is_empty())
                    .and_then(|f| datums.for_dimension(f))
            })
            .or_else(|| datums.for_dimension(&format!("{} to {}", first, second)));

        let both_planes = !first.is_empty()
            && !second.is_empty()
            && first.to_lowercase().contains("plane")
            && second.to_lowercase().contains("plane");
        let (location, surface) = if both_planes {
            ("between planes", "planar faces")
        } else {
            ("between surfaces", "linear distance")
        };

        let type_label = if name.is_empty() {
            "↔ Length".to_string()
        } else {
            format!("↔ {}", title_case(name))
        };

        rows.push(row(DimensionCells {
            type_label,
            nominal: nominal(file, entity.id),
            datum,
            location,
            surface,
            deviation: tolerances.get(entity.id),
        }));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const PART: &str = "
        #5=PRODUCT_DEFINITION_SHAPE('','',#4);
        #10=SHAPE_ASPECT('Boss1','',#5,.T.);
        #11=SHAPE_ASPECT('Plane1','',#5,.T.);
        #12=SHAPE_ASPECT('Plane2','',#5,.T.);
        #20=DATUM('Datum29@Boss1(A)',$,#5,.F.,'A');
        #21=DATUM('Datum28@Plane1(D)',$,#5,.F.,'D');
        #40=DIMENSIONAL_SIZE(#10,'diameter');
        #41=LENGTH_MEASURE_WITH_UNIT(POSITIVE_LENGTH_MEASURE(20.),#99);
        #42=SHAPE_DIMENSION_REPRESENTATION('',(#41),#98);
        #43=DIMENSIONAL_CHARACTERISTIC_REPRESENTATION(#40,#42);
        #44=LENGTH_MEASURE_WITH_UNIT(LENGTH_MEASURE(-0.1),#99);
        #45=LENGTH_MEASURE_WITH_UNIT(LENGTH_MEASURE(0.1),#99);
        #46=TOLERANCE_VALUE(#44,#45);
        #47=PLUS_MINUS_TOLERANCE(#46,#40);
        #50=DIMENSIONAL_LOCATION('distance','',#11,#12);
        #51=LENGTH_MEASURE_WITH_UNIT(POSITIVE_LENGTH_MEASURE(35.),#99);
        #52=SHAPE_DIMENSION_REPRESENTATION('',(#51),#98);
        #53=DIMENSIONAL_CHARACTERISTIC_REPRESENTATION(#50,#52);
    ";

    fn rows(text: &str) -> Vec<ToleranceRow> {
        let file = StepFile::parse(text).unwrap();
        let datums = DatumTable::from_step(&file);
        extract(&file, &datums)
    }

    #[test]
    fn test_diameter_with_plus_minus_tolerance() {
        let rows = rows(PART);
        let diameter = &rows[0];
        assert_eq!(diameter.type_label, "⌀ Diameter");
        assert_eq!(diameter.value, "20.0");
        assert_eq!(diameter.datum, "A");
        assert_eq!(diameter.location, "cylindrical side");
        assert_eq!(diameter.surface, "curved side of the cylinder");
        assert_eq!(diameter.tolerance_value, "±0.100");
        assert_eq!(diameter.upper_limit, "20.100");
        assert_eq!(diameter.lower_limit, "19.900");
    }

    #[test]
    fn test_distance_between_planes() {
        let rows = rows(PART);
        let distance = &rows[1];
        assert_eq!(distance.type_label, "↔ Distance");
        assert_eq!(distance.value, "35.0");
        assert_eq!(distance.datum, "A");
        assert_eq!(distance.location, "between planes");
        assert_eq!(distance.surface, "planar faces");
        assert_eq!(distance.tolerance_value, "");
        assert_eq!(distance.upper_limit, "");
    }

    #[test]
    fn test_dimension_without_nominal_or_datums() {
        let rows = rows(
            "#10=SHAPE_ASPECT('Hole3','',#5,.T.);
             #40=DIMENSIONAL_SIZE(#10,'radius');
             #44=LENGTH_MEASURE_WITH_UNIT(LENGTH_MEASURE(-0.05),#99);
             #45=LENGTH_MEASURE_WITH_UNIT(LENGTH_MEASURE(0.02),#99);
             #46=TOLERANCE_VALUE(#44,#45);
             #47=PLUS_MINUS_TOLERANCE(#46,#40);
             #50=DIMENSIONAL_LOCATION('',$,#10,#77);",
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].type_label, "R Radius");
        assert_eq!(rows[0].value, "N/A");
        assert_eq!(rows[0].datum, "");
        assert_eq!(rows[0].location, "cylindrical surface");
        assert_eq!(rows[0].tolerance_value, "±0.035");
        assert_eq!(rows[0].upper_limit, "");
        assert_eq!(rows[1].type_label, "↔ Length");
        assert_eq!(rows[1].location, "between surfaces");
        assert_eq!(rows[1].surface, "linear distance");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("curve length"), "Curve Length");
        assert_eq!(title_case("LINEAR DISTANCE"), "Linear Distance");
        assert_eq!(title_case("2nd offset"), "2Nd Offset");
    }

    #[test]
    fn test_location_with_path_counts_as_location() {
        let text = format!(
            "{}#60=DIMENSIONAL_LOCATION_WITH_PATH('curve length','',#11,#12,#13);
             #61=LENGTH_MEASURE_WITH_UNIT(POSITIVE_LENGTH_MEASURE(42.5),#99);
             #62=SHAPE_DIMENSION_REPRESENTATION('',(#61),#98);
             #63=DIMENSIONAL_CHARACTERISTIC_REPRESENTATION(#60,#62);",
            PART
        );
        let rows = rows(&text);
        assert_eq!(rows.len(), 3);
        let path = &rows[2];
        assert_eq!(path.type_label, "↔ Curve Length");
        assert_eq!(path.value, "42.5");
        assert_eq!(path.datum, "A");
        assert_eq!(path.location, "between planes");
        assert_eq!(path.surface, "planar faces");
    }
}
