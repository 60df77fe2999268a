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

pub mod catalog;
pub mod chart;
pub mod controls;
pub mod error;
pub mod loader;
pub mod numeric;
pub mod pivot;
pub mod render;
pub mod table;

pub use catalog::{DatasetCatalog, DatasetKind, DatasetSpec};
pub use chart::{ChartSpec, Trace};
pub use controls::ControlState;
pub use error::{CatalogError, DatenkarteError, LoadError, Result};
pub use loader::Workbook;
pub use render::{ProtView, Selection};
pub use table::Table;

use std::collections::HashMap;
use std::path::Path;

// The immutable data context of one dashboard process: the dataset catalog
// plus the canonical tables, loaded once at startup. Render requests read
// it through shared references; nothing mutates it after construction, so
// concurrent readers need no locking.
pub struct DashboardContext {
    catalog: DatasetCatalog,
    tables: HashMap<DatasetKind, Table>,
}

impl DashboardContext {
    // A missing workbook is fatal; missing individual sheets degrade to
    // empty datasets.
    pub fn from_workbook<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_catalog(path, DatasetCatalog::builtin()?)
    }

    pub fn with_catalog<P: AsRef<Path>>(path: P, catalog: DatasetCatalog) -> Result<Self> {
        catalog.validate()?;
        let workbook = Workbook::open(path)?;
        let mut tables = HashMap::new();
        for spec in catalog.datasets() {
            let table = loader::load_dataset(&workbook, &catalog, spec)?;
            tables.insert(spec.key, table);
        }
        Ok(Self { catalog, tables })
    }

    pub fn catalog(&self) -> &DatasetCatalog {
        &self.catalog
    }

    pub fn table(&self, kind: DatasetKind) -> Option<&Table> {
        self.tables.get(&kind)
    }

    pub fn spec_and_table(&self, kind: DatasetKind) -> Option<(&DatasetSpec, &Table)> {
        Some((self.catalog.spec(kind)?, self.tables.get(&kind)?))
    }

    // Unknown keys land on the configured fallback dataset.
    pub fn resolve(&self, key: &str) -> (&DatasetSpec, &Table) {
        let kind = self.catalog.resolve_key(key);
        self.spec_and_table(kind)
            .or_else(|| self.spec_and_table(self.catalog.fallback()))
            .expect("every catalog dataset is loaded at construction")
    }

    pub fn render(&self, selection: &Selection) -> ChartSpec {
        render::render(self, selection)
    }

    pub fn controls(&self, dataset: &str, prot_view: ProtView) -> ControlState {
        controls::control_state(self, dataset, prot_view)
    }

    pub fn mm_fraction_columns(&self) -> Vec<String> {
        self.spec_and_table(DatasetKind::Prot)
            .map(|(spec, table)| spec.prefixed_columns(table.column_names()))
            .unwrap_or_default()
    }

    // The startup state: fallback dataset, per-dataset default option tags,
    // every MM fraction ticked.
    pub fn default_selection(&self) -> Selection {
        let option_defaults = |kind: DatasetKind| {
            self.catalog
                .spec(kind)
                .map(|spec| spec.default_options.clone())
                .unwrap_or_default()
        };
        Selection {
            dataset: self.catalog.fallback().key().to_string(),
            materials: Vec::new(),
            enzymes: Vec::new(),
            carb_options: option_defaults(DatasetKind::Carb),
            prot_options: option_defaults(DatasetKind::Prot),
            prot_view: ProtView::Distribution,
            mm_fractions: self.mm_fraction_columns(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_workbook_refuses_to_start() {
        let result = DashboardContext::from_workbook("/nonexistent/datamap");
        let err = result.err().unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn context_loads_every_catalog_dataset() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Proteasen.csv"),
            "Material;Enzym;MM1;MM2\nHuhn;Papain;0,5;40\n",
        )
        .unwrap();
        let ctx = DashboardContext::from_workbook(dir.path()).unwrap();
        assert!(ctx.table(DatasetKind::Prot).is_some());
        // Sheets absent from the workbook are present but empty.
        assert!(ctx.table(DatasetKind::Carb).unwrap().is_empty());
        assert!(ctx.table(DatasetKind::Filme).unwrap().is_empty());
        assert_eq!(
            ctx.mm_fraction_columns(),
            vec!["MM1".to_string(), "MM2".to_string()]
        );
    }

    #[test]
    fn default_selection_matches_the_catalog_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Proteasen.csv"),
            "Material;Enzym;MM1;MM2\nHuhn;Papain;0,5;40\n",
        )
        .unwrap();
        let ctx = DashboardContext::from_workbook(dir.path()).unwrap();
        let selection = ctx.default_selection();
        assert_eq!(selection.dataset, "carb");
        assert_eq!(selection.carb_options, vec!["loes", "glc", "deltaph"]);
        assert_eq!(selection.prot_options, vec!["loes", "dh", "deltaph"]);
        assert_eq!(selection.prot_view, ProtView::Distribution);
        assert_eq!(selection.mm_fractions, vec!["MM1", "MM2"]);
        assert!(selection.materials.is_empty());
        assert!(selection.enzymes.is_empty());
    }
}
