use super::surface::{self, plane_number};
use crate::step::StepFile;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;

static DATUM_REFERENCE_NAME: OnceLock<Regex> = OnceLock::new();

fn datum_reference_name() -> &'static Regex {
    DATUM_REFERENCE_NAME
        .get_or_init(|| Regex::new(r"(?i)datum\d+@[^(]*\(([a-z])\)").expect("static pattern"))
}

/// Datum letters found in a file, with the feature each one was defined on
/// and the surface it resolves to. Both maps keep first-seen order.
#[derive(Debug, Clone, Default)]
pub struct DatumTable {
    features: IndexMap<char, String>,
    locations: IndexMap<char, String>,
}

impl DatumTable {
    pub fn from_step(file: &StepFile) -> Self {
        let mut table = DatumTable::default();

        for entity in file.by_name("DATUM") {
            let Some(record) = entity.record("DATUM") else {
                continue;
            };
            let name = record.str_param(0).unwrap_or_default();
            let Some(letter) = record.str_param(4).and_then(single_letter) else {
                tracing::debug!("DATUM #{} has no single-letter identification", entity.id);
                continue;
            };

            table.features.insert(letter, name.to_string());
            table
                .locations
                .insert(letter, surface::datum_location(name, letter));
        }

        for entity in file.entities() {
            for record in entity.records.iter().filter(|r| r.name.ends_with("SHAPE_ASPECT")) {
                let Some(name) = record.str_param(0) else {
                    continue;
                };
                let (Some(letter), Some(location)) = (
                    surface::trailing_datum_letter(name),
                    surface::shape_aspect_location(name),
                ) else {
                    continue;
                };
                tracing::debug!(
                    "Shape aspect '{}' places datum {} on the {}",
                    name,
                    letter,
                    location
                );
                table.locations.insert(letter, location.to_string());
            }
        }

        table
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn location(&self, letter: char) -> Option<&str> {
        self.locations.get(&letter).map(String::as_str)
    }

    pub fn contains(&self, letter: char) -> bool {
        self.locations.contains_key(&letter)
    }

    /// Letters with a known location, in first-seen order.
    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        self.locations.keys().copied()
    }

    pub fn locations(&self) -> impl Iterator<Item = (char, &str)> + '_ {
        self.locations.iter().map(|(l, loc)| (*l, loc.as_str()))
    }

    /// Letters defined by a `DATUM` entity, with their feature names.
    pub fn features(&self) -> impl Iterator<Item = (char, &str)> + '_ {
        self.features.iter().map(|(l, name)| (*l, name.as_str()))
    }

    pub fn first_letter(&self) -> Option<char> {
        self.letters().next()
    }

    pub fn first_where(&self, predicate: impl Fn(&str) -> bool) -> Option<char> {
        self.locations()
            .find(|(_, loc)| predicate(loc))
            .map(|(letter, _)| letter)
    }

    pub fn feature_containing(&self, needle: &str) -> Option<char> {
        self.features()
            .find(|(_, name)| name.to_lowercase().contains(needle))
            .map(|(letter, _)| letter)
    }

    /// Picks the datum a size or location dimension most likely refers to.
    pub fn for_dimension(&self, feature_name: &str) -> Option<char> {
        if feature_name.is_empty() {
            return None;
        }
        let fname = feature_name.to_lowercase();

        if let Some(caps) = datum_reference_name().captures(feature_name) {
            if let Some(letter) = caps[1].chars().next() {
                return Some(letter.to_ascii_uppercase());
            }
        }

        if let Some(letter) = letter_in_parens_any_case(feature_name) {
            if self.contains(letter) {
                return Some(letter);
            }
        }

        let cylindrical = |loc: &str| loc.to_lowercase().contains("cylindrical");
        let planar = |loc: &str| {
            let loc = loc.to_lowercase();
            loc.contains("face") || loc.contains("plane")
        };

        if fname.contains("boss") || fname.contains("cylinder") {
            if let Some(letter) = self.first_where(cylindrical).or_else(|| self.first_letter()) {
                return Some(letter);
            }
        } else if fname.contains("plane") {
            if let Some(n) = plane_number(&fname) {
                let mut sorted: Vec<char> = self.letters().collect();
                sorted.sort_unstable();
                if n >= 1 && (n as usize) <= sorted.len() {
                    return Some(sorted[n as usize - 1]);
                }
            }
            if let Some(letter) = self.first_where(planar) {
                return Some(letter);
            }
        }

        for (letter, datum_feature) in self.features() {
            let datum_feature = datum_feature.to_lowercase();
            let similar = ["boss", "plane1", "plane2", "plane"]
                .iter()
                .any(|key| fname.contains(key) && datum_feature.contains(key));
            if similar {
                return Some(letter);
            }
        }

        if self.is_empty() {
            return None;
        }

        if ["boss", "cylinder", "diameter"].iter().any(|k| fname.contains(k)) {
            if self.contains('A') {
                return Some('A');
            }
            if let Some(letter) = self.first_where(cylindrical) {
                return Some(letter);
            }
        } else if ["plane", "length", "distance"].iter().any(|k| fname.contains(k)) {
            if self.contains('A') {
                return Some('A');
            }
            if let Some(letter) = self.first_where(planar) {
                return Some(letter);
            }
        }

        self.first_letter()
    }
}

fn single_letter(identification: &str) -> Option<char> {
    let mut chars = identification.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => Some(c),
        _ => None,
    }
}

fn letter_in_parens_any_case(name: &str) -> Option<char> {
    surface::letter_in_parens(&name.to_uppercase())
}
