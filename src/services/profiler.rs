use crate::models::{ColumnProfile, Profile, SAMPLE_SIZE};
use crate::services::table::{CellValue, Column, ColumnType, Table};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::HashSet;

/// Computes a [`Profile`] from a [`Table`]. Holds no state; the same table
/// always produces an equal profile.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileComputer;

impl ProfileComputer {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, table: &Table) -> Profile {
        let row_count = table.row_count();

        // collect() keeps the source column order
        let columns: Vec<ColumnProfile> = table
            .columns()
            .par_iter()
            .map(|column| profile_column(column, row_count))
            .collect();

        Profile::new(row_count, columns)
    }
}

fn profile_column(column: &Column, row_count: usize) -> ColumnProfile {
    if column.is_homogeneous() {
        return summarize(column.name(), column.column_type(), column.values(), row_count);
    }

    tracing::warn!(
        "Column {} holds values that are not {}, profiling it as text",
        column.name(),
        column.column_type()
    );
    let as_text: Vec<CellValue> = column.values().iter().map(CellValue::to_text).collect();
    summarize(column.name(), ColumnType::Text, &as_text, row_count)
}

fn summarize(name: &str, dtype: ColumnType, values: &[CellValue], row_count: usize) -> ColumnProfile {
    let mut null_count = 0;
    let mut distinct: HashSet<&CellValue> = HashSet::new();
    let mut sample_values = SmallVec::<[CellValue; SAMPLE_SIZE]>::new();

    for value in values {
        if value.is_missing() {
            null_count += 1;
            continue;
        }
        distinct.insert(value);
        if sample_values.len() < SAMPLE_SIZE {
            sample_values.push(value.clone());
        }
    }

    tracing::debug!(
        "Column {}: {} nulls, {} distinct values",
        name,
        null_count,
        distinct.len()
    );

    ColumnProfile {
        name: name.to_string(),
        dtype,
        null_count,
        null_percentage: null_percentage(null_count, row_count),
        unique_count: distinct.len(),
        sample_values,
    }
}

/// `100 * null_count / row_count` rounded to two decimals, 0 for an empty table.
pub fn null_percentage(null_count: usize, row_count: usize) -> f64 {
    if row_count == 0 {
        return 0.0;
    }
    let pct = 100.0 * null_count as f64 / row_count as f64;
    (pct * 100.0).round() / 100.0
}
