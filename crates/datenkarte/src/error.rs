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

use crate::table::TableError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatenkarteError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
    #[error("Table error: {0}")]
    Table(#[from] TableError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to parse catalog YAML: {source}")]
    YamlParseError {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Failed to read catalog file '{path}': {source}")]
    CatalogFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Duplicate dataset key found: '{key}'")]
    DuplicateDataset { key: String },
    #[error("Fallback dataset '{key}' is not declared in the catalog")]
    UnknownFallback { key: String },
    #[error("Catalog declares no datasets")]
    EmptyCatalog,
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Workbook not found at '{path}'")]
    WorkbookMissing { path: std::path::PathBuf },
    #[error("Sheet '{sheet}' not found in workbook")]
    SheetMissing { sheet: String },
    #[error("Failed to read sheet '{sheet}': {source}")]
    SheetRead {
        sheet: String,
        #[source]
        source: csv::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Table error: {0}")]
    Table(#[from] TableError),
}

pub type Result<T> = std::result::Result<T, DatenkarteError>;
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
pub type LoadResult<T> = std::result::Result<T, LoadError>;

impl DatenkarteError {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DatenkarteError::Load(LoadError::WorkbookMissing { .. })
                | DatenkarteError::Catalog(_)
        )
    }

    pub fn category(&self) -> &'static str {
        match self {
            DatenkarteError::Catalog(_) => "Catalog",
            DatenkarteError::Load(_) => "Load",
            DatenkarteError::Table(_) => "Table",
            DatenkarteError::Io(_) => "I/O",
            DatenkarteError::Serialisation(_) => "Serialisation",
        }
    }
}
