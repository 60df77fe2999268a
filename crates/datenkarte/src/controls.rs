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

// Derives what the UI shell shows: dropdown option lists from the loaded
// tables and control visibility as a pure function of the two discrete
// choices (dataset, Proteases view).

use crate::catalog::{columns, DatasetKind};
use crate::render::ProtView;
use crate::DashboardContext;

#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    // Sorted distinct values of the active dataset; enzymes stay empty when
    // the column is absent (Films).
    pub materials: Vec<String>,
    pub enzymes: Vec<String>,
    pub mm_fractions: Vec<String>,
    pub show_carb_options: bool,
    pub show_prot_options: bool,
    pub show_prot_ts_options: bool,
    pub show_mm_checklist: bool,
}

pub fn control_state(
    ctx: &DashboardContext,
    dataset: &str,
    prot_view: ProtView,
) -> ControlState {
    let kind = ctx.catalog().resolve_key(dataset);
    let (_, table) = ctx.resolve(dataset);
    let is_prot = kind == DatasetKind::Prot;
    ControlState {
        materials: table.distinct_strings(columns::MATERIAL),
        enzymes: table.distinct_strings(columns::ENZYM),
        mm_fractions: ctx.mm_fraction_columns(),
        show_carb_options: kind == DatasetKind::Carb,
        show_prot_options: is_prot,
        show_prot_ts_options: is_prot && prot_view == ProtView::Distribution,
        show_mm_checklist: is_prot && prot_view == ProtView::Heatmap,
    }
}
