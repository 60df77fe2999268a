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

use crate::table::common::{DataType, Result, TableError};
use rayon::prelude::*;
use std::sync::Arc;

// Cells are immutable after load; Arc-backed slices make row-subset copies
// cheap for the string variant and keep tables Send + Sync.
#[derive(Debug, Clone)]
pub enum Column {
    Float64(Arc<[Option<f64>]>),
    String(Arc<[Option<Arc<str>>]>),
}

impl Column {
    pub fn from_f64s(values: Vec<Option<f64>>) -> Self {
        Column::Float64(values.into())
    }

    pub fn from_strings(values: Vec<Option<String>>) -> Self {
        let data: Vec<Option<Arc<str>>> = values
            .into_iter()
            .map(|opt| opt.map(|s| Arc::from(s.as_str())))
            .collect();
        Column::String(data.into())
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Float64(data) => data.len(),
            Column::String(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Column::Float64(_) => DataType::Float64,
            Column::String(_) => DataType::String,
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            Column::Float64(data) => data.par_iter().filter(|v| v.is_none()).count(),
            Column::String(data) => data.par_iter().filter(|v| v.is_none()).count(),
        }
    }

    pub fn get_string(&self, index: usize) -> Option<String> {
        match self {
            Column::Float64(data) => data.get(index)?.as_ref().map(|v| v.to_string()),
            Column::String(data) => data.get(index)?.as_ref().map(|s| s.to_string()),
        }
    }

    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            Column::Float64(data) => data.get(index).copied()?,
            Column::String(data) => data
                .get(index)
                .and_then(|opt| opt.as_ref().and_then(|s| s.parse::<f64>().ok())),
        }
    }

    pub fn to_f64_vec(&self) -> Vec<Option<f64>> {
        (0..self.len()).map(|i| self.get_f64(i)).collect()
    }

    pub fn to_string_vec(&self) -> Vec<Option<String>> {
        (0..self.len()).map(|i| self.get_string(i)).collect()
    }

    pub fn select_rows(&self, indices: &[usize]) -> Result<Column> {
        match self {
            Column::Float64(data) => {
                let new_data: Result<Vec<Option<f64>>> = indices
                    .par_iter()
                    .map(|&i| {
                        if i >= data.len() {
                            Err(TableError::OutOfBounds(i))
                        } else {
                            Ok(data.get(i).copied().unwrap_or(None))
                        }
                    })
                    .collect();
                Ok(Column::Float64(new_data?.into()))
            }
            Column::String(data) => {
                let new_data: Result<Vec<Option<Arc<str>>>> = indices
                    .par_iter()
                    .map(|&i| {
                        if i >= data.len() {
                            Err(TableError::OutOfBounds(i))
                        } else {
                            Ok(data.get(i).cloned().unwrap_or(None))
                        }
                    })
                    .collect();
                Ok(Column::String(new_data?.into()))
            }
        }
    }

    // Propagates the last non-missing value downward; leading gaps stay
    // missing.
    pub fn forward_filled(&self) -> Column {
        match self {
            Column::Float64(data) => {
                let mut last: Option<f64> = None;
                let filled: Vec<Option<f64>> = data
                    .iter()
                    .map(|v| {
                        if v.is_some() {
                            last = *v;
                        }
                        last
                    })
                    .collect();
                Column::Float64(filled.into())
            }
            Column::String(data) => {
                let mut last: Option<Arc<str>> = None;
                let filled: Vec<Option<Arc<str>>> = data
                    .iter()
                    .map(|v| {
                        if v.is_some() {
                            last = v.clone();
                        }
                        last.clone()
                    })
                    .collect();
                Column::String(filled.into())
            }
        }
    }
}
