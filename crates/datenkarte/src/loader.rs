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

// Reads the workbook sheets and normalises them into canonical tables:
// header cleanup and de-aliasing, forward-filled Material column, and
// locale-aware numeric conversion per the dataset catalog.

use crate::catalog::{columns, DatasetCatalog, DatasetSpec};
use crate::error::{LoadError, LoadResult};
use crate::numeric::{as_percent_0_100, parse_number};
use crate::table::{Column, Table, TableMetadata};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

// A workbook directory holding one <SheetName>.csv file per sheet. Sheet
// CSVs use the German export convention: semicolon-delimited, comma decimal
// separator.
#[derive(Debug)]
pub struct Workbook {
    root: PathBuf,
    delimiter: u8,
}

impl Workbook {
    // A missing workbook is the one unrecoverable startup error.
    pub fn open<P: AsRef<Path>>(path: P) -> LoadResult<Self> {
        let root = path.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(LoadError::WorkbookMissing { path: root });
        }
        Ok(Self {
            root,
            delimiter: b';',
        })
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    fn sheet_path(&self, sheet: &str) -> PathBuf {
        self.root.join(format!("{sheet}.csv"))
    }

    // Short rows are padded with missing cells, surplus cells are dropped.
    pub fn read_sheet(&self, sheet: &str) -> LoadResult<RawSheet> {
        let path = self.sheet_path(sheet);
        if !path.is_file() {
            return Err(LoadError::SheetMissing {
                sheet: sheet.to_string(),
            });
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_path(&path)
            .map_err(|source| LoadError::SheetRead {
                sheet: sheet.to_string(),
                source,
            })?;

        let mut records = reader.records();
        let headers: Vec<String> = match records.next() {
            Some(record) => record
                .map_err(|source| LoadError::SheetRead {
                    sheet: sheet.to_string(),
                    source,
                })?
                .iter()
                .map(normalise_header)
                .collect(),
            None => Vec::new(),
        };

        let mut rows = Vec::new();
        for record in records {
            let record = record.map_err(|source| LoadError::SheetRead {
                sheet: sheet.to_string(),
                source,
            })?;
            let mut row: Vec<Option<String>> = record
                .iter()
                .take(headers.len())
                .map(|field| {
                    let trimmed = field.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        Some(trimmed.to_string())
                    }
                })
                .collect();
            row.resize(headers.len(), None);
            rows.push(row);
        }

        Ok(RawSheet {
            path,
            headers,
            rows,
        })
    }
}

#[derive(Debug)]
pub struct RawSheet {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

pub fn normalise_header(raw: &str) -> String {
    WHITESPACE_RUNS.replace_all(raw.trim(), " ").into_owned()
}

// A source spelling is renamed to its canonical name only when that name is
// not already taken, so aliasing can never collapse two distinct source
// columns into one.
pub fn apply_aliases(headers: &mut [String], aliases: &BTreeMap<String, String>) {
    for (from, to) in aliases {
        if headers.iter().any(|h| h == to) {
            continue;
        }
        if let Some(header) = headers.iter_mut().find(|h| *h == from) {
            debug!("renaming column '{from}' to '{to}'");
            *header = to.clone();
        }
    }
}

// A missing sheet is tolerated (the dataset stays empty); a missing workbook
// is not, and is surfaced by Workbook::open before this is ever called.
pub fn load_dataset(
    workbook: &Workbook,
    catalog: &DatasetCatalog,
    spec: &DatasetSpec,
) -> LoadResult<Table> {
    let raw = match workbook.read_sheet(&spec.sheet) {
        Ok(raw) => raw,
        Err(LoadError::SheetMissing { sheet }) => {
            warn!("sheet '{sheet}' is missing; dataset '{}' stays empty", spec.key.key());
            return Ok(Table::empty(&spec.sheet));
        }
        Err(e) => return Err(e),
    };

    let mut headers = raw.headers;
    apply_aliases(&mut headers, &catalog.aliases);

    let mut table = Table::new(TableMetadata::named(&spec.sheet).with_source(raw.path));
    for (idx, header) in headers.iter().enumerate() {
        let values: Vec<Option<String>> = raw
            .rows
            .iter()
            .map(|row| row.get(idx).cloned().unwrap_or(None))
            .collect();
        table.add_column(header.clone(), Column::from_strings(values))?;
    }

    let filled = table.get_column(columns::MATERIAL).map(Column::forward_filled);
    if let Some(filled) = filled {
        table.add_column(columns::MATERIAL.to_string(), filled)?;
    }

    for column in spec.percent_columns_for(&headers) {
        convert_column(&mut table, &column, as_percent_0_100)?;
    }
    for column in &spec.numeric_columns {
        convert_column(&mut table, column, parse_number)?;
    }

    info!(
        "loaded sheet '{}': {} rows, {} columns",
        spec.sheet,
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

fn convert_column(
    table: &mut Table,
    name: &str,
    convert: fn(Option<&str>) -> Option<f64>,
) -> LoadResult<()> {
    let Some(column) = table.get_column(name) else {
        debug!("numeric column '{name}' is absent; skipping conversion");
        return Ok(());
    };
    let converted: Vec<Option<f64>> = (0..column.len())
        .map(|i| convert(column.get_string(i).as_deref()))
        .collect();
    table.add_column(name.to_string(), Column::from_f64s(converted))?;
    Ok(())
}
