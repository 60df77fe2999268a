// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use crate::table::column::Column;
use crate::table::common::{Result, TableError, TableId, TableMetadata};
use itertools::Itertools;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Table {
    columns: HashMap<String, Arc<Column>>,
    pub metadata: TableMetadata,
    column_order: Vec<String>,
}

impl Table {
    pub fn new(metadata: TableMetadata) -> Self {
        Self {
            columns: HashMap::new(),
            metadata,
            column_order: Vec::new(),
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(TableMetadata::named(name))
    }

    // Re-adding an existing name replaces the column in place and keeps its
    // position in the column order.
    pub fn add_column(&mut self, name: String, column: Column) -> Result<()> {
        if !self.columns.is_empty() {
            let expected = self.metadata.row_count;
            if column.len() != expected {
                return Err(TableError::LengthMismatch {
                    expected,
                    got: column.len(),
                });
            }
        }
        if !self.columns.contains_key(&name) {
            self.column_order.push(name.clone());
        }
        self.metadata.row_count = column.len();
        self.columns.insert(name, Arc::new(column));
        self.metadata.column_count = self.columns.len();
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.metadata.row_count
    }

    pub fn column_count(&self) -> usize {
        self.metadata.column_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_order
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name).map(|arc| arc.as_ref())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn select_rows(&self, indices: &[usize]) -> Result<Table> {
        let mut new_table = Table::new(TableMetadata {
            id: TableId::new(),
            name: format!("{}_filtered", self.metadata.name),
            row_count: indices.len(),
            column_count: self.column_count(),
            created_at: chrono::Utc::now(),
            source_path: None,
        });
        for name in &self.column_order {
            let column = &self.columns[name];
            let new_column = column.select_rows(indices)?;
            new_table.add_column(name.clone(), new_column)?;
        }
        Ok(new_table)
    }

    pub fn filter<P>(&self, predicate: P) -> Result<Table>
    where
        P: Fn(usize) -> bool + Send + Sync,
    {
        let indices: Vec<usize> = (0..self.row_count())
            .into_par_iter()
            .filter(|&i| predicate(i))
            .collect();
        self.select_rows(&indices)
    }

    // Keeps rows whose cell in `column` matches one of `allowed`. A missing
    // column keeps the table untouched; the caller decides whether that is
    // worth a warning.
    pub fn filter_isin(&self, column: &str, allowed: &[String]) -> Result<Table> {
        let Some(col) = self.get_column(column) else {
            return Ok(self.clone());
        };
        self.filter(|i| {
            col.get_string(i)
                .is_some_and(|v| allowed.iter().any(|a| a == &v))
        })
    }

    pub fn distinct_strings(&self, column: &str) -> Vec<String> {
        let Some(col) = self.get_column(column) else {
            return Vec::new();
        };
        (0..col.len())
            .filter_map(|i| col.get_string(i))
            .unique()
            .sorted()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        let mut table = Table::empty("sample");
        table
            .add_column(
                "Material".to_string(),
                Column::from_strings(vec![
                    Some("Huhn".to_string()),
                    Some("Lachs".to_string()),
                    Some("Huhn".to_string()),
                ]),
            )
            .unwrap();
        table
            .add_column(
                "Wert".to_string(),
                Column::from_f64s(vec![Some(1.0), Some(2.0), Some(3.0)]),
            )
            .unwrap();
        table
    }

    #[test]
    fn add_column_rejects_length_mismatch() {
        let mut table = sample_table();
        let result = table.add_column("kurz".to_string(), Column::from_f64s(vec![Some(1.0)]));
        assert!(matches!(
            result,
            Err(TableError::LengthMismatch { expected: 3, got: 1 })
        ));
    }

    #[test]
    fn replacing_a_column_keeps_its_position() {
        let mut table = sample_table();
        table
            .add_column(
                "Material".to_string(),
                Column::from_strings(vec![None, None, None]),
            )
            .unwrap();
        assert_eq!(table.column_names(), &["Material", "Wert"]);
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn filter_isin_is_an_order_preserving_subset() {
        let table = sample_table();
        let filtered = table
            .filter_isin("Material", &["Huhn".to_string()])
            .unwrap();
        assert_eq!(filtered.row_count(), 2);
        let values = filtered.get_column("Wert").unwrap().to_f64_vec();
        assert_eq!(values, vec![Some(1.0), Some(3.0)]);
    }

    #[test]
    fn filtering_by_all_distinct_values_is_identity() {
        let table = sample_table();
        let all = table.distinct_strings("Material");
        let filtered = table.filter_isin("Material", &all).unwrap();
        assert_eq!(filtered.row_count(), table.row_count());
        assert_eq!(
            filtered.get_column("Material").unwrap().to_string_vec(),
            table.get_column("Material").unwrap().to_string_vec()
        );
    }

    #[test]
    fn filter_on_absent_column_returns_the_table_unchanged() {
        let table = sample_table();
        let filtered = table
            .filter_isin("Enzym", &["Papain".to_string()])
            .unwrap();
        assert_eq!(filtered.row_count(), 3);
    }

    #[test]
    fn distinct_strings_are_sorted_and_deduplicated() {
        let table = sample_table();
        assert_eq!(
            table.distinct_strings("Material"),
            vec!["Huhn".to_string(), "Lachs".to_string()]
        );
        assert!(table.distinct_strings("fehlt").is_empty());
    }
}
