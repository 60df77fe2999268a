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

// Mean-aggregated pivot over a set of measurement columns, keyed by one
// grouping column. Rows are the measurement columns themselves (the melted
// MM-fraction axis), columns are the distinct group values; both are
// lexicographically ordered so series stay stable across sheet row order.

use crate::table::Table;
use log::warn;

#[derive(Debug, Clone)]
pub struct Pivot {
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl Pivot {
    // Duplicate rows for the same (group, column) combination are resolved
    // by averaging; the mean ignores missing cells, and a combination with
    // no data stays missing. A missing group column yields an empty pivot
    // rather than an error.
    pub fn mean(table: &Table, value_columns: &[String], group_column: &str) -> Pivot {
        let mut rows: Vec<String> = value_columns
            .iter()
            .filter(|c| table.has_column(c))
            .cloned()
            .collect();
        rows.sort();

        let Some(group) = table.get_column(group_column) else {
            warn!("pivot group column '{group_column}' is missing; returning an empty pivot");
            return Pivot {
                rows,
                cols: Vec::new(),
                values: Vec::new(),
            };
        };

        let cols = table.distinct_strings(group_column);
        let values = rows
            .iter()
            .map(|row_name| {
                let column = table.get_column(row_name);
                cols.iter()
                    .map(|group_value| {
                        let column = column?;
                        let mut sum = 0.0;
                        let mut count = 0usize;
                        for i in 0..table.row_count() {
                            if group.get_string(i).as_deref() != Some(group_value.as_str()) {
                                continue;
                            }
                            if let Some(v) = column.get_f64(i) {
                                sum += v;
                                count += 1;
                            }
                        }
                        if count == 0 {
                            None
                        } else {
                            Some(sum / count as f64)
                        }
                    })
                    .collect()
            })
            .collect();

        Pivot { rows, cols, values }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.cols.is_empty()
    }

    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        for cell in self.values.iter().flatten().flatten() {
            range = Some(match range {
                None => (*cell, *cell),
                Some((lo, hi)) => (lo.min(*cell), hi.max(*cell)),
            });
        }
        range
    }
}

// The colour-scale range two paired pivots share: min/max across both, with
// the 0-100 percentage default when either side has nothing to show.
pub fn shared_range(first: &Pivot, second: &Pivot) -> (f64, f64) {
    match (first.value_range(), second.value_range()) {
        (Some((lo1, hi1)), Some((lo2, hi2))) => (lo1.min(lo2), hi1.max(hi2)),
        _ => (0.0, 100.0),
    }
}
