//! In-memory model of an ISO 10303-21 ("STEP Part 21") exchange file.
//!
//! Only the structure needed for tolerance extraction is kept: every
//! `#id = ...` instance becomes an [`Entity`] made of one record (simple
//! instance) or several (complex instance), and the three standard header
//! entities are decoded into a [`StepHeader`].

mod parser;

use crate::utils::error::Result;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Unset,
    Derived,
    Ref(u64),
    Integer(i64),
    Real(f64),
    Str(String),
    Enum(String),
    Binary(String),
    List(Vec<Param>),
    Typed(String, Vec<Param>),
}

impl Param {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Param::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ref_id(&self) -> Option<u64> {
        match self {
            Param::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Param::Real(v) => Some(*v),
            Param::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Param]> {
        match self {
            Param::List(items) => Some(items),
            _ => None,
        }
    }

    fn collect_refs(&self, out: &mut Vec<u64>) {
        match self {
            Param::Ref(id) => out.push(*id),
            Param::List(items) | Param::Typed(_, items) => {
                items.iter().for_each(|p| p.collect_refs(out))
            }
            _ => {}
        }
    }

    /// First numeric argument of a nested `NAME(..)` whose name is in `names`.
    fn find_typed_number(&self, names: &[&str]) -> Option<f64> {
        match self {
            Param::Typed(name, args) => {
                if names.contains(&name.as_str()) {
                    if let Some(v) = args.iter().find_map(Param::as_f64) {
                        return Some(v);
                    }
                }
                args.iter().find_map(|p| p.find_typed_number(names))
            }
            Param::List(items) => items.iter().find_map(|p| p.find_typed_number(names)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub params: Vec<Param>,
}

impl Record {
    pub fn param(&self, index: usize) -> Option<&Param> {
        self.params.get(index)
    }

    pub fn str_param(&self, index: usize) -> Option<&str> {
        self.param(index).and_then(Param::as_str)
    }

    pub fn ref_param(&self, index: usize) -> Option<u64> {
        self.param(index).and_then(Param::as_ref_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: u64,
    pub records: Vec<Record>,
}

const LENGTH_MEASURES: &[&str] = &["LENGTH_MEASURE", "POSITIVE_LENGTH_MEASURE"];

impl Entity {
    /// First record; the only one for simple instances.
    pub fn primary(&self) -> &Record {
        &self.records[0]
    }

    pub fn record(&self, name: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn has_record(&self, name: &str) -> bool {
        self.record(name).is_some()
    }

    /// Every referenced id, depth first, duplicates kept.
    pub fn refs(&self) -> Vec<u64> {
        let mut out = Vec::new();
        for record in &self.records {
            record.params.iter().for_each(|p| p.collect_refs(&mut out));
        }
        out
    }

    /// First value of a nested `LENGTH_MEASURE(..)` or `POSITIVE_LENGTH_MEASURE(..)`.
    pub fn length_measure(&self) -> Option<f64> {
        self.find_typed_number(LENGTH_MEASURES)
    }

    /// Like [`Entity::length_measure`] but a `POSITIVE_LENGTH_MEASURE` anywhere wins.
    pub fn positive_length_measure(&self) -> Option<f64> {
        self.find_typed_number(&["POSITIVE_LENGTH_MEASURE"])
            .or_else(|| self.length_measure())
    }

    fn find_typed_number(&self, names: &[&str]) -> Option<f64> {
        self.records
            .iter()
            .flat_map(|r| r.params.iter())
            .find_map(|p| p.find_typed_number(names))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepHeader {
    pub description: Vec<String>,
    pub file_name: Option<String>,
    pub schemas: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StepFile {
    pub header: StepHeader,
    entities: IndexMap<u64, Entity>,
    /// Instances that could not be parsed and were left out.
    pub skipped: usize,
}

impl StepFile {
    /// Parses exchange-file text. Malformed instances are logged and skipped;
    /// only an unterminated string or comment fails the whole file.
    pub fn parse(text: &str) -> Result<Self> {
        let statements = parser::split_statements(text)?;
        let mut file = StepFile::default();

        for statement in statements {
            let body = statement.text.as_str();
            if body.starts_with('#') {
                match parser::Cursor::new(body).instance() {
                    Ok(entity) => {
                        if file.entities.contains_key(&entity.id) {
                            tracing::debug!("Duplicate instance #{} replaces earlier one", entity.id);
                        }
                        file.entities.insert(entity.id, entity);
                    }
                    Err(reason) => {
                        file.skipped += 1;
                        tracing::warn!(
                            "Skipping malformed instance at statement {}: {}",
                            statement.index,
                            reason
                        );
                    }
                }
            } else if let Ok(record) = parser::Cursor::new(body).record() {
                file.header.absorb(&record);
            }
        }

        tracing::debug!(
            "Parsed {} entities ({} skipped), schemas: {:?}",
            file.entities.len(),
            file.skipped,
            file.header.schemas
        );

        Ok(file)
    }

    pub fn entity(&self, id: u64) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities carrying a record named `name`, in file order.
    pub fn by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities.values().filter(move |e| e.has_record(name))
    }
}

impl StepHeader {
    fn absorb(&mut self, record: &Record) {
        match record.name.as_str() {
            "FILE_DESCRIPTION" => {
                self.description = string_list(record.param(0));
            }
            "FILE_NAME" => {
                self.file_name = record.str_param(0).map(str::to_string);
            }
            "FILE_SCHEMA" => {
                self.schemas = string_list(record.param(0));
            }
            _ => {}
        }
    }
}

fn string_list(param: Option<&Param>) -> Vec<String> {
    param
        .and_then(Param::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(Param::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
