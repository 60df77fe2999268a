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

use crate::error::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

// Canonical column names shared between the loader and the chart mapper,
// in their post-normalisation spellings.
pub mod columns {
    pub const MATERIAL: &str = "Material";
    pub const ENZYM: &str = "Enzym";
    pub const TS_SUPERNATANT: &str = "TS Anteil ÜS [%]";
    pub const TS_SEDIMENT: &str = "TS Anteil Sedi [%]";
    pub const PH_BEFORE: &str = "pH (vor)";
    pub const PH_AFTER: &str = "pH (nach)";
    pub const DELTA_PH: &str = "abs(ΔpH)";
    pub const FILM_EXPERIMENT: &str = "Versuchsnr.";
    pub const FILM_TOTAL: &str = "Summe";
    pub const FILM_DETAILS: [&str; 6] = [
        "Homogenität",
        "Stabilität",
        "Adhäsion Schale",
        "Adhäsion Oberfläche",
        "Kohäsion",
        "Geruch",
    ];
}

const BUILTIN_CATALOG: &str = include_str!("../config/datasets.yml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Carb,
    Prot,
    Filme,
}

impl DatasetKind {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "carb" => Some(DatasetKind::Carb),
            "prot" => Some(DatasetKind::Prot),
            "filme" => Some(DatasetKind::Filme),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            DatasetKind::Carb => "carb",
            DatasetKind::Prot => "prot",
            DatasetKind::Filme => "filme",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlaySeries {
    pub column: String,
    pub label: String,
}

// One checkbox in the extra-series group. The declared order of these
// entries fixes the series/legend order regardless of the order the user
// ticked them in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayOption {
    pub tag: String,
    pub series: Vec<OverlaySeries>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub key: DatasetKind,
    pub sheet: String,
    pub label: String,
    #[serde(default)]
    pub percent_columns: Vec<String>,
    #[serde(default)]
    pub percent_prefixes: Vec<String>,
    #[serde(default)]
    pub numeric_columns: Vec<String>,
    #[serde(default)]
    pub default_options: Vec<String>,
    #[serde(default)]
    pub overlay_options: Vec<OverlayOption>,
}

impl DatasetSpec {
    // The variable-width MM* set for Proteases, in header order.
    pub fn prefixed_columns(&self, headers: &[String]) -> Vec<String> {
        headers
            .iter()
            .filter(|h| {
                self.percent_prefixes
                    .iter()
                    .any(|p| h.trim().starts_with(p.as_str()))
            })
            .cloned()
            .collect()
    }

    pub fn percent_columns_for(&self, headers: &[String]) -> Vec<String> {
        let mut cols = self.percent_columns.clone();
        for discovered in self.prefixed_columns(headers) {
            if !cols.contains(&discovered) {
                cols.push(discovered);
            }
        }
        cols
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetCatalog {
    pub fallback: DatasetKind,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    pub datasets: Vec<DatasetSpec>,
}

impl DatasetCatalog {
    pub fn builtin() -> CatalogResult<Self> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|source| CatalogError::CatalogFileError {
                path: path.as_ref().display().to_string(),
                source,
            })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> CatalogResult<Self> {
        let catalog: DatasetCatalog = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> CatalogResult<()> {
        if self.datasets.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }
        let mut seen = Vec::new();
        for spec in &self.datasets {
            if seen.contains(&spec.key) {
                return Err(CatalogError::DuplicateDataset {
                    key: spec.key.key().to_string(),
                });
            }
            seen.push(spec.key);
        }
        if !seen.contains(&self.fallback) {
            return Err(CatalogError::UnknownFallback {
                key: self.fallback.key().to_string(),
            });
        }
        Ok(())
    }

    pub fn spec(&self, kind: DatasetKind) -> Option<&DatasetSpec> {
        self.datasets.iter().find(|spec| spec.key == kind)
    }

    pub fn datasets(&self) -> &[DatasetSpec] {
        &self.datasets
    }

    pub fn fallback(&self) -> DatasetKind {
        self.fallback
    }

    // Anything unknown falls back to the configured default dataset.
    pub fn resolve_key(&self, key: &str) -> DatasetKind {
        DatasetKind::from_key(key)
            .filter(|kind| self.spec(*kind).is_some())
            .unwrap_or(self.fallback)
    }
}
