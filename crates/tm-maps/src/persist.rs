//! Map persistence in TOML documents.
//!
//! Each map lives in a named group addressed by a dotted path (`maps.hpc`).
//! A tabulated map group looks like:
//!
//! ```toml
//! [maps.hpc]
//! format = "turbomap.table"
//! format_version = 1
//! kind = "compressor"
//! reference_temperature = 288.15
//! reference_pressure = 101325.0
//!
//! [maps.hpc.pressure_ratio]
//! interpolation = "bicubic"
//! xgrid = [1500.0, 3000.0]
//! ygrid = [4.0, 8.0, 12.0]
//! table = [[1.2, 1.5, 1.3], [2.0, 3.9, 2.5]]
//!
//! [maps.hpc.efficiency]
//! # same layout
//! ```
//!
//! Analytic maps store `format = "turbomap.analytic"`, the reference scalars,
//! and one flat key per [`AnalyticParams`] field.

use crate::analytic::{AnalyticMap, AnalyticParams};
use crate::error::{MapError, MapResult};
use crate::interp::{Interpolation, Table2D};
use crate::map::{AnyMap, MachineKind, PerformanceMap};
use crate::reference::ReferenceState;
use crate::table_map::TabulatedMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tm_core::units::{k, pa};
use toml::{Table, Value};
use tracing::debug;

pub const TABLE_FORMAT: &str = "turbomap.table";
pub const ANALYTIC_FORMAT: &str = "turbomap.analytic";
pub const FORMAT_VERSION: i64 = 1;

const REFERENCE_TEMPERATURE: &str = "reference_temperature";
const REFERENCE_PRESSURE: &str = "reference_pressure";
const EFFICIENCY: &str = "efficiency";

/// Write a map of either variant into `doc` under `group`.
pub fn write_map(doc: &mut Table, group: &str, map: &AnyMap) -> MapResult<()> {
    match map {
        AnyMap::Table(m) => write_table_map(doc, group, m),
        AnyMap::Analytic(m) => write_analytic_map(doc, group, m),
    }
}

/// Read whichever map variant is stored under `group`.
pub fn read_map(doc: &Table, group: &str) -> MapResult<AnyMap> {
    let table = group_table(doc, group)?;
    match required_str(table, group, "format")? {
        TABLE_FORMAT => Ok(read_table_map(doc, group)?.into()),
        ANALYTIC_FORMAT => Ok(read_analytic_map(doc, group)?.into()),
        other => Err(MapError::Format {
            group: group.to_string(),
            what: format!("unknown map format `{other}`"),
        }),
    }
}

pub fn write_table_map(doc: &mut Table, group: &str, map: &TabulatedMap) -> MapResult<()> {
    let target = group_table_mut(doc, group)?;
    target.clear();
    write_header(target, TABLE_FORMAT, map.reference());
    target.insert("kind".into(), Value::String(map.kind().as_str().into()));
    target.insert(
        map.kind().primary_output().into(),
        Value::Table(table_to_toml(map.primary_table())),
    );
    target.insert(
        EFFICIENCY.into(),
        Value::Table(table_to_toml(map.efficiency_table())),
    );
    Ok(())
}

pub fn read_table_map(doc: &Table, group: &str) -> MapResult<TabulatedMap> {
    let table = group_table(doc, group)?;
    check_header(table, group, TABLE_FORMAT)?;
    let kind: MachineKind = required_str(table, group, "kind")?.parse()?;
    let reference = read_reference(table, group)?;
    let primary = table_from_toml(
        required_table(table, group, kind.primary_output())?,
        &format!("{group}.{}", kind.primary_output()),
    )?;
    let efficiency = table_from_toml(
        required_table(table, group, EFFICIENCY)?,
        &format!("{group}.{EFFICIENCY}"),
    )?;
    TabulatedMap::new(kind, reference, primary, efficiency)
}

pub fn write_analytic_map(doc: &mut Table, group: &str, map: &AnalyticMap) -> MapResult<()> {
    let params = match Value::try_from(map.params())? {
        Value::Table(t) => t,
        _ => {
            return Err(MapError::Format {
                group: group.to_string(),
                what: "analytic parameters did not serialize to a table".into(),
            });
        }
    };
    let target = group_table_mut(doc, group)?;
    target.clear();
    write_header(target, ANALYTIC_FORMAT, map.reference());
    target.extend(params);
    Ok(())
}

pub fn read_analytic_map(doc: &Table, group: &str) -> MapResult<AnalyticMap> {
    let table = group_table(doc, group)?;
    check_header(table, group, ANALYTIC_FORMAT)?;
    let reference = read_reference(table, group)?;

    // Collect every parameter as a float so integer literals are accepted.
    let mut params = Table::new();
    for key in analytic_keys()? {
        let v = required_f64(table, group, &key)?;
        params.insert(key, Value::Float(v));
    }
    let params: AnalyticParams = Value::Table(params).try_into()?;
    AnalyticMap::new(reference, params)
}

/// Store a map in a TOML file, keeping any other groups already in it.
pub fn save_map_file(path: impl AsRef<Path>, group: &str, map: &AnyMap) -> MapResult<()> {
    let path = path.as_ref();
    let mut doc = match fs::read_to_string(path) {
        Ok(s) => toml::from_str::<Table>(&s)?,
        Err(e) if e.kind() == ErrorKind::NotFound => Table::new(),
        Err(e) => return Err(e.into()),
    };
    write_map(&mut doc, group, map)?;
    fs::write(path, toml::to_string(&doc)?)?;
    debug!(path = %path.display(), group, kind = %map.kind(), "saved map");
    Ok(())
}

pub fn load_map_file(path: impl AsRef<Path>, group: &str) -> MapResult<AnyMap> {
    let path = path.as_ref();
    let doc: Table = toml::from_str(&fs::read_to_string(path)?)?;
    let map = read_map(&doc, group)?;
    debug!(path = %path.display(), group, kind = %map.kind(), "loaded map");
    Ok(map)
}

fn analytic_keys() -> MapResult<Vec<String>> {
    match Value::try_from(AnalyticParams::default())? {
        Value::Table(t) => Ok(t.into_iter().map(|(key, _)| key).collect()),
        _ => Ok(Vec::new()),
    }
}

fn write_header(target: &mut Table, format: &str, reference: &ReferenceState) {
    target.insert("format".into(), Value::String(format.into()));
    target.insert("format_version".into(), Value::Integer(FORMAT_VERSION));
    target.insert(
        REFERENCE_TEMPERATURE.into(),
        Value::Float(reference.temperature().value),
    );
    target.insert(
        REFERENCE_PRESSURE.into(),
        Value::Float(reference.pressure().value),
    );
}

fn check_header(table: &Table, group: &str, expected: &str) -> MapResult<()> {
    let format = required_str(table, group, "format")?;
    if format != expected {
        return Err(MapError::Format {
            group: group.to_string(),
            what: format!("expected format `{expected}`, found `{format}`"),
        });
    }
    match required(table, group, "format_version")? {
        Value::Integer(FORMAT_VERSION) => Ok(()),
        other => Err(MapError::Format {
            group: group.to_string(),
            what: format!("unsupported format_version {other}"),
        }),
    }
}

fn read_reference(table: &Table, group: &str) -> MapResult<ReferenceState> {
    ReferenceState::new(
        k(required_f64(table, group, REFERENCE_TEMPERATURE)?),
        pa(required_f64(table, group, REFERENCE_PRESSURE)?),
    )
}

fn floats(values: &[f64]) -> Value {
    Value::Array(values.iter().map(|&v| Value::Float(v)).collect())
}

fn table_to_toml(table: &Table2D) -> Table {
    let mut t = Table::new();
    t.insert(
        "interpolation".into(),
        Value::String(table.interpolation().as_str().into()),
    );
    t.insert("xgrid".into(), floats(table.xgrid()));
    t.insert("ygrid".into(), floats(table.ygrid()));
    t.insert(
        "table".into(),
        Value::Array(table.rows().iter().map(|r| floats(r)).collect()),
    );
    t
}

fn table_from_toml(t: &Table, group: &str) -> MapResult<Table2D> {
    let interpolation: Interpolation = required_str(t, group, "interpolation")?.parse()?;
    let x = float_array(required(t, group, "xgrid")?, group, "xgrid")?;
    let y = float_array(required(t, group, "ygrid")?, group, "ygrid")?;
    let rows = match required(t, group, "table")? {
        Value::Array(rows) => rows
            .iter()
            .map(|r| float_array(r, group, "table"))
            .collect::<MapResult<Vec<_>>>()?,
        _ => return Err(type_error(group, "table", "an array of rows")),
    };
    Table2D::new(interpolation, x, y, rows)
}

/// Descend to `group`, creating missing tables along the way.
fn group_table_mut<'a>(doc: &'a mut Table, group: &str) -> MapResult<&'a mut Table> {
    let segments = split_group(group)?;
    let mut current = doc;
    for (depth, key) in segments.iter().enumerate() {
        let value = current
            .entry(key.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        match value {
            Value::Table(t) => current = t,
            _ => {
                return Err(MapError::GroupCollision {
                    group: group.to_string(),
                    at: segments[..=depth].join("."),
                });
            }
        }
    }
    Ok(current)
}

fn group_table<'a>(doc: &'a Table, group: &str) -> MapResult<&'a Table> {
    let segments = split_group(group)?;
    let mut current = doc;
    for (depth, key) in segments.iter().enumerate() {
        let parent = segments[..depth].join(".");
        current = match current.get(*key) {
            Some(Value::Table(t)) => t,
            Some(_) => {
                return Err(MapError::Format {
                    group: group.to_string(),
                    what: format!("`{}` is not a table", segments[..=depth].join(".")),
                });
            }
            None => {
                return Err(MapError::MissingKey {
                    group: parent,
                    key: key.to_string(),
                });
            }
        };
    }
    Ok(current)
}

fn split_group(group: &str) -> MapResult<Vec<&str>> {
    let segments: Vec<&str> = group.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(MapError::Format {
            group: group.to_string(),
            what: "group path has an empty segment".into(),
        });
    }
    Ok(segments)
}

fn required<'a>(t: &'a Table, group: &str, key: &str) -> MapResult<&'a Value> {
    t.get(key).ok_or_else(|| MapError::MissingKey {
        group: group.to_string(),
        key: key.to_string(),
    })
}

fn required_str<'a>(t: &'a Table, group: &str, key: &str) -> MapResult<&'a str> {
    required(t, group, key)?
        .as_str()
        .ok_or_else(|| type_error(group, key, "a string"))
}

fn required_table<'a>(t: &'a Table, group: &str, key: &str) -> MapResult<&'a Table> {
    required(t, group, key)?
        .as_table()
        .ok_or_else(|| type_error(group, key, "a table"))
}

fn required_f64(t: &Table, group: &str, key: &str) -> MapResult<f64> {
    as_f64(required(t, group, key)?).ok_or_else(|| type_error(group, key, "a number"))
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Float(f) => Some(*f),
        Value::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

fn float_array(v: &Value, group: &str, key: &str) -> MapResult<Vec<f64>> {
    v.as_array()
        .and_then(|a| a.iter().map(as_f64).collect::<Option<Vec<_>>>())
        .ok_or_else(|| type_error(group, key, "an array of numbers"))
}

fn type_error(group: &str, key: &str, expected: &str) -> MapError {
    MapError::Format {
        group: group.to_string(),
        what: format!("`{key}` must be {expected}"),
    }
}
