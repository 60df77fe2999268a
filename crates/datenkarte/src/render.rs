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

// The selection-to-chart mapper. Every user interaction re-invokes render
// with the full selection state; the returned chart replaces the displayed
// one wholesale. User-input edge cases come back as placeholder charts,
// never as errors.

use crate::catalog::{columns, DatasetKind, DatasetSpec};
use crate::chart::{
    Axis, AxisPlacement, AxisSide, BarMode, BarTrace, ChartSpec, ColourAxis, HeatmapTrace,
    HoverValue, Layout, ScatterMode, ScatterTrace, Trace,
};
use crate::numeric::round2;
use crate::pivot::{shared_range, Pivot};
use crate::table::{Column, Table};
use crate::DashboardContext;
use itertools::Itertools;
use log::{debug, warn};

pub const EMPTY_SELECTION_TITLE: &str = "Bitte Daten auswählen";
pub const TOO_MANY_MATERIALS_TITLE: &str = "Proteasen — Zu viele Materialien für den Vergleich";
pub const TOO_MANY_MATERIALS_HINT: &str =
    "Bitte höchstens zwei Materialien für die Heatmap auswählen.";
pub const NO_MM_FRACTIONS_TITLE: &str = "Proteasen — Bitte MM-Fraktionen auswählen";

const TS_SUPERNATANT_LABEL: &str = "TS Überstand [%]";
const TS_SEDIMENT_LABEL: &str = "TS Sediment [%]";
const SECONDARY_AXIS_TITLE: &str = "Zusatzdaten";
const PRIMARY_AXIS_TITLE: &str = "TS [%]";
const HEATMAP_COLOURSCALE: &str = "Greens";
const HEATMAP_BAR_TITLE: &str = "Anteil [%]";
const HEATMAP_TEXT_FORMAT: &str = ".1f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtView {
    #[default]
    Distribution,
    Heatmap,
}

// The complete input state of one render request. The UI shell re-delivers
// all current values on any change, so this is rebuilt per request.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub dataset: String,
    pub materials: Vec<String>,
    pub enzymes: Vec<String>,
    pub carb_options: Vec<String>,
    pub prot_options: Vec<String>,
    pub prot_view: ProtView,
    pub mm_fractions: Vec<String>,
}

pub fn render(ctx: &DashboardContext, selection: &Selection) -> ChartSpec {
    let (spec, table) = ctx.resolve(&selection.dataset);
    let filtered = match filter_rows(table, selection) {
        Ok(table) => table,
        Err(e) => {
            warn!("row filtering failed: {e}");
            return ChartSpec::placeholder(EMPTY_SELECTION_TITLE);
        }
    };
    if filtered.is_empty() {
        return ChartSpec::placeholder(EMPTY_SELECTION_TITLE);
    }
    match spec.key {
        DatasetKind::Carb => distribution_chart(spec, &filtered, &selection.carb_options),
        DatasetKind::Prot => match selection.prot_view {
            ProtView::Distribution => {
                distribution_chart(spec, &filtered, &selection.prot_options)
            }
            ProtView::Heatmap => heatmap_chart(&filtered, selection),
        },
        DatasetKind::Filme => films_chart(&filtered),
    }
}

// Material/Enzym filters apply only when non-empty and the column exists;
// the result is always an order-preserving row-subset copy.
fn filter_rows(table: &Table, selection: &Selection) -> crate::table::Result<Table> {
    let mut filtered = if selection.materials.is_empty() {
        table.clone()
    } else {
        table.filter_isin(columns::MATERIAL, &selection.materials)?
    };
    if !selection.enzymes.is_empty() {
        filtered = filtered.filter_isin(columns::ENZYM, &selection.enzymes)?;
    }
    Ok(filtered)
}

fn distribution_chart(spec: &DatasetSpec, table: &Table, selected: &[String]) -> ChartSpec {
    let mut table = table.clone();
    attach_delta_ph(&mut table);

    let x = category_values(&table, columns::ENZYM);
    let mut chart = ChartSpec::new(
        Layout::white(format!("{} — TS-Verteilung & Zusatzdaten", spec.label))
            .with_bar_mode(BarMode::Stack)
            .with_x_axis(Axis::titled(columns::ENZYM))
            .with_y_axis(Axis::titled(PRIMARY_AXIS_TITLE).with_range(0.0, 105.0))
            .with_y_axis2(
                Axis::titled(SECONDARY_AXIS_TITLE)
                    .with_side(AxisPlacement::Right)
                    .overlaying_primary(),
            ),
    );

    chart.push(Trace::Bar(BarTrace {
        name: TS_SUPERNATANT_LABEL.to_string(),
        x: x.clone(),
        y: numeric_or_missing(&table, columns::TS_SUPERNATANT),
        axis: AxisSide::Primary,
        hover: None,
    }));
    chart.push(Trace::Bar(BarTrace {
        name: TS_SEDIMENT_LABEL.to_string(),
        x: x.clone(),
        y: numeric_or_missing(&table, columns::TS_SEDIMENT),
        axis: AxisSide::Primary,
        hover: None,
    }));

    // Walk the catalog's declared option order, not the user's selection
    // order, so the series and legend order is stable.
    for option in &spec.overlay_options {
        if !selected.iter().any(|tag| tag == &option.tag) {
            continue;
        }
        for series in &option.series {
            let Some(column) = table.get_column(&series.column) else {
                debug!(
                    "column '{}' is absent; option '{}' is a no-op",
                    series.column, option.tag
                );
                continue;
            };
            let y: Vec<Option<f64>> = column
                .to_f64_vec()
                .into_iter()
                .map(|v| v.map(round2))
                .collect();
            chart.push(Trace::Scatter(ScatterTrace {
                name: series.label.clone(),
                x: x.clone(),
                y,
                mode: ScatterMode::MarkersLines,
                axis: AxisSide::Secondary,
            }));
        }
    }
    chart
}

fn heatmap_chart(table: &Table, selection: &Selection) -> ChartSpec {
    if selection.materials.len() > 2 {
        return ChartSpec::placeholder(TOO_MANY_MATERIALS_TITLE)
            .with_annotation(TOO_MANY_MATERIALS_HINT);
    }

    let mm_present: Vec<String> = selection
        .mm_fractions
        .iter()
        .filter(|m| table.has_column(m))
        .cloned()
        .collect();
    if mm_present.is_empty() {
        return ChartSpec::placeholder(NO_MM_FRACTIONS_TITLE);
    }

    if let [first, second] = selection.materials.as_slice() {
        let mut pivots = Vec::with_capacity(2);
        for material in [first, second] {
            let subset = match table.filter_isin(columns::MATERIAL, std::slice::from_ref(material))
            {
                Ok(table) => table,
                Err(e) => {
                    warn!("material subset for '{material}' failed: {e}");
                    return ChartSpec::placeholder(EMPTY_SELECTION_TITLE);
                }
            };
            pivots.push((
                material.clone(),
                Pivot::mean(&subset, &mm_present, columns::ENZYM),
            ));
        }
        let (min, max) = shared_range(&pivots[0].1, &pivots[1].1);
        let mut chart = ChartSpec::new(
            Layout::white("Proteasen — Vergleich MM-Fraktionen").with_colour_axis(ColourAxis {
                colourscale: HEATMAP_COLOURSCALE.to_string(),
                min,
                max,
                bar_title: HEATMAP_BAR_TITLE.to_string(),
            }),
        );
        for (material, pivot) in pivots {
            chart.push(Trace::Heatmap(HeatmapTrace {
                name: Some(format!("Material: {material}")),
                x: pivot.cols,
                y: pivot.rows,
                z: pivot.values,
                text_format: HEATMAP_TEXT_FORMAT.to_string(),
            }));
        }
        return chart;
    }

    // Zero or one selected material: the table is already the right subset,
    // with zero materials averaging across everything that is left.
    let pivot = Pivot::mean(table, &mm_present, columns::ENZYM);
    let title = match selection.materials.as_slice() {
        [only] => format!("Proteasen — Heatmap MM-Fraktionen ({only})"),
        _ => "Proteasen — Heatmap MM-Fraktionen (Mittel über alle Materialien)".to_string(),
    };
    let (min, max) = pivot.value_range().unwrap_or((0.0, 100.0));
    let mut chart = ChartSpec::new(
        Layout::white(title)
            .with_x_axis(Axis::titled(columns::ENZYM).with_side(AxisPlacement::Top))
            .with_colour_axis(ColourAxis {
                colourscale: HEATMAP_COLOURSCALE.to_string(),
                min,
                max,
                bar_title: HEATMAP_BAR_TITLE.to_string(),
            }),
    );
    chart.push(Trace::Heatmap(HeatmapTrace {
        name: None,
        x: pivot.cols,
        y: pivot.rows,
        z: pivot.values,
        text_format: HEATMAP_TEXT_FORMAT.to_string(),
    }));
    chart
}

fn films_chart(table: &Table) -> ChartSpec {
    let mut chart = ChartSpec::new(
        Layout::white("Filme — Gesamtbewertung")
            .with_x_axis(Axis::titled(columns::FILM_EXPERIMENT))
            .with_y_axis(Axis::titled(columns::FILM_TOTAL))
            .with_legend_y(-0.2),
    );
    let Some(material) = table.get_column(columns::MATERIAL) else {
        warn!("Films table has no Material column; nothing to chart");
        return chart;
    };

    // One bar series per material, coloured by the legend; materials keep
    // their first-appearance order.
    let material_order: Vec<String> = (0..table.row_count())
        .filter_map(|i| material.get_string(i))
        .unique()
        .collect();
    for name in material_order {
        let indices: Vec<usize> = (0..table.row_count())
            .filter(|&i| material.get_string(i).as_deref() == Some(name.as_str()))
            .collect();
        let x: Vec<Option<String>> = indices
            .iter()
            .map(|&i| {
                table
                    .get_column(columns::FILM_EXPERIMENT)
                    .and_then(|c| c.get_string(i))
            })
            .collect();
        let y: Vec<Option<f64>> = indices
            .iter()
            .map(|&i| {
                table
                    .get_column(columns::FILM_TOTAL)
                    .and_then(|c| c.get_f64(i))
            })
            .collect();
        let hover: Vec<Vec<HoverValue>> = indices
            .iter()
            .map(|&i| {
                columns::FILM_DETAILS
                    .iter()
                    .map(|detail| HoverValue {
                        label: (*detail).to_string(),
                        value: table.get_column(detail).and_then(|c| c.get_f64(i)),
                    })
                    .collect()
            })
            .collect();
        chart.push(Trace::Bar(BarTrace {
            name,
            x,
            y,
            axis: AxisSide::Primary,
            hover: Some(hover),
        }));
    }
    chart
}

// The derived |pH(nach) - pH(vor)| column; a no-op when either pH column is
// absent, so the deltaph option silently degrades with it.
fn attach_delta_ph(table: &mut Table) {
    let delta: Vec<Option<f64>> = {
        let Some(before) = table.get_column(columns::PH_BEFORE) else {
            debug!("'{}' is absent; skipping {}", columns::PH_BEFORE, columns::DELTA_PH);
            return;
        };
        let Some(after) = table.get_column(columns::PH_AFTER) else {
            debug!("'{}' is absent; skipping {}", columns::PH_AFTER, columns::DELTA_PH);
            return;
        };
        (0..table.row_count())
            .map(|i| match (before.get_f64(i), after.get_f64(i)) {
                (Some(b), Some(a)) => Some((a - b).abs()),
                _ => None,
            })
            .collect()
    };
    if let Err(e) = table.add_column(columns::DELTA_PH.to_string(), Column::from_f64s(delta)) {
        warn!("could not attach '{}': {e}", columns::DELTA_PH);
    }
}

fn category_values(table: &Table, name: &str) -> Vec<Option<String>> {
    match table.get_column(name) {
        Some(column) => column.to_string_vec(),
        None => {
            warn!("category column '{name}' is absent");
            vec![None; table.row_count()]
        }
    }
}

fn numeric_or_missing(table: &Table, name: &str) -> Vec<Option<f64>> {
    match table.get_column(name) {
        Some(column) => column.to_f64_vec(),
        None => {
            warn!("measurement column '{name}' is absent; series carries only missing values");
            vec![None; table.row_count()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DashboardContext;
    use std::fs;
    use tempfile::TempDir;

    fn test_context() -> DashboardContext {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Carbohydratasen.csv"),
            "Material;Enzym;TS Anteil ÜS %;TS Anteil Sedi %;Löslichkeit [%];cglc [μM];pH (vor);pH (nach)\n\
             Huhn;Papain;0,4;0,6;75;12,5;6,8;6,2\n\
             Huhn;Alcalase;55;45;80;10;7,0;6,5\n\
             Lachs;Papain;30;70;60;8;6,9;6,4\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("Proteasen.csv"),
            "Material;Enzym;TS Anteil ÜS [%];TS Anteil Sedi [%];Löslichkeit [%];DH;MM1;MM2;pH (vor);pH (nach)\n\
             Huhn;Papain;40;60;70;0,12;0,25;30;6,8;6,1\n\
             Huhn;Alcalase;50;50;75;0,2;35;40;7,1;6,6\n\
             Lachs;Papain;45;55;65;0,15;20;25;6,7;6,3\n\
             Lachs;Alcalase;35;65;60;0,18;15;22;7,0;6,2\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("Filme.csv"),
            "Versuchsnr.;Material;Homogenität;Stabilität;Adhäsion Schale;Adhäsion Oberfläche;Kohäsion;Geruch;Summe\n\
             V1;Huhn;4;5;3;4;5;2;23\n\
             V2;Huhn;3;4;4;3;4;3;21\n\
             V3;Lachs;5;5;4;4;4;4;26\n",
        )
        .unwrap();
        DashboardContext::from_workbook(dir.path()).unwrap()
    }

    fn selection(dataset: &str) -> Selection {
        Selection {
            dataset: dataset.to_string(),
            ..Selection::default()
        }
    }

    #[test]
    fn carb_with_one_option_gives_two_bars_and_one_line() {
        let ctx = test_context();
        let mut sel = selection("carb");
        sel.carb_options = vec!["loes".to_string()];
        let chart = render(&ctx, &sel);
        assert_eq!(chart.title(), "Carbohydratasen — TS-Verteilung & Zusatzdaten");
        assert_eq!(chart.traces.len(), 3);
        assert_eq!(
            chart.series_names(),
            vec!["TS Überstand [%]", "TS Sediment [%]", "Proteinlöslichkeit [%]"]
        );
        assert_eq!(chart.traces[2].axis(), Some(AxisSide::Secondary));
        assert_eq!(chart.layout.bar_mode, Some(crate::chart::BarMode::Stack));
        assert_eq!(chart.layout.y_axis.as_ref().unwrap().range, Some([0.0, 105.0]));
    }

    #[test]
    fn series_order_is_fixed_regardless_of_selection_order() {
        let ctx = test_context();
        let expected = vec![
            "TS Überstand [%]",
            "TS Sediment [%]",
            "Proteinlöslichkeit [%]",
            "Reduzierende Zucker [µM]",
            "abs(ΔpH)",
            "pH (vor)",
            "pH (nach)",
        ];
        for tags in [
            vec!["loes", "glc", "deltaph", "ph"],
            vec!["ph", "deltaph", "glc", "loes"],
            vec!["deltaph", "loes", "ph", "glc"],
        ] {
            let mut sel = selection("carb");
            sel.carb_options = tags.iter().map(|t| t.to_string()).collect();
            let chart = render(&ctx, &sel);
            assert_eq!(chart.series_names(), expected);
        }
    }

    #[test]
    fn percent_normalisation_and_rounding_flow_into_the_series() {
        let ctx = test_context();
        let mut sel = selection("carb");
        sel.carb_options = vec!["deltaph".to_string()];
        let chart = render(&ctx, &sel);
        let Trace::Bar(bars) = &chart.traces[0] else {
            panic!("first trace is the supernatant bar");
        };
        // "0,4" was a fraction, the rest already 0-100.
        assert_eq!(bars.y, vec![Some(40.0), Some(55.0), Some(30.0)]);
        let Trace::Scatter(delta) = &chart.traces[2] else {
            panic!("third trace is abs(ΔpH)");
        };
        assert_eq!(delta.y, vec![Some(0.6), Some(0.5), Some(0.5)]);
    }

    #[test]
    fn prot_distribution_uses_the_dh_overlay() {
        let ctx = test_context();
        let mut sel = selection("prot");
        sel.prot_options = vec!["dh".to_string()];
        let chart = render(&ctx, &sel);
        assert_eq!(chart.title(), "Proteasen — TS-Verteilung & Zusatzdaten");
        assert_eq!(
            chart.series_names(),
            vec!["TS Überstand [%]", "TS Sediment [%]", "Hydrolysegrad [%]"]
        );
        let Trace::Scatter(dh) = &chart.traces[2] else {
            panic!("third trace is the DH overlay");
        };
        assert_eq!(dh.y, vec![Some(12.0), Some(20.0), Some(15.0), Some(18.0)]);
    }

    #[test]
    fn enzyme_filter_is_an_order_preserving_subset() {
        let ctx = test_context();
        let mut sel = selection("carb");
        sel.enzymes = vec!["Papain".to_string()];
        let chart = render(&ctx, &sel);
        let Trace::Bar(bars) = &chart.traces[0] else {
            panic!("first trace is a bar");
        };
        assert_eq!(bars.y, vec![Some(40.0), Some(30.0)]);
    }

    #[test]
    fn empty_filter_result_is_a_placeholder() {
        let ctx = test_context();
        let mut sel = selection("carb");
        sel.materials = vec!["Ente".to_string()];
        let chart = render(&ctx, &sel);
        assert!(chart.is_placeholder());
        assert_eq!(chart.title(), EMPTY_SELECTION_TITLE);
    }

    #[test]
    fn unknown_dataset_falls_back_to_carb() {
        let ctx = test_context();
        let chart = render(&ctx, &selection("banane"));
        assert_eq!(chart.title(), "Carbohydratasen — TS-Verteilung & Zusatzdaten");
    }

    #[test]
    fn three_materials_gate_the_heatmap_regardless_of_other_inputs() {
        let ctx = test_context();
        let mut sel = selection("prot");
        sel.prot_view = ProtView::Heatmap;
        sel.materials = vec!["Huhn".to_string(), "Lachs".to_string(), "Ente".to_string()];
        sel.mm_fractions = vec!["MM1".to_string()];
        let chart = render(&ctx, &sel);
        assert!(chart.is_placeholder());
        assert_eq!(chart.title(), TOO_MANY_MATERIALS_TITLE);
        assert_eq!(chart.layout.annotations.len(), 1);

        // Still gated with no fractions selected at all.
        sel.mm_fractions.clear();
        let chart = render(&ctx, &sel);
        assert_eq!(chart.title(), TOO_MANY_MATERIALS_TITLE);
    }

    #[test]
    fn no_selected_fractions_gate_the_heatmap() {
        let ctx = test_context();
        let mut sel = selection("prot");
        sel.prot_view = ProtView::Heatmap;
        sel.materials = vec!["Huhn".to_string()];
        let chart = render(&ctx, &sel);
        assert!(chart.is_placeholder());
        assert_eq!(chart.title(), NO_MM_FRACTIONS_TITLE);

        // Fractions that do not exist as columns count as none selected.
        sel.mm_fractions = vec!["MM9".to_string()];
        let chart = render(&ctx, &sel);
        assert_eq!(chart.title(), NO_MM_FRACTIONS_TITLE);
    }

    #[test]
    fn two_materials_give_paired_heatmaps_with_one_shared_range() {
        let ctx = test_context();
        let mut sel = selection("prot");
        sel.prot_view = ProtView::Heatmap;
        sel.materials = vec!["Huhn".to_string(), "Lachs".to_string()];
        sel.mm_fractions = vec!["MM1".to_string()];
        let chart = render(&ctx, &sel);
        assert_eq!(chart.title(), "Proteasen — Vergleich MM-Fraktionen");
        assert_eq!(chart.traces.len(), 2);
        assert!(chart.traces.iter().all(Trace::is_heatmap));
        assert_eq!(chart.traces[0].name(), "Material: Huhn");
        assert_eq!(chart.traces[1].name(), "Material: Lachs");
        let colour_axis = chart.layout.colour_axis.as_ref().unwrap();
        // Huhn MM1: 25 ("0,25" rescaled) and 35; Lachs MM1: 20 and 15.
        assert_eq!(colour_axis.min, 15.0);
        assert_eq!(colour_axis.max, 35.0);
    }

    #[test]
    fn one_material_names_the_single_heatmap() {
        let ctx = test_context();
        let mut sel = selection("prot");
        sel.prot_view = ProtView::Heatmap;
        sel.materials = vec!["Lachs".to_string()];
        sel.mm_fractions = vec!["MM1".to_string(), "MM2".to_string()];
        let chart = render(&ctx, &sel);
        assert_eq!(chart.title(), "Proteasen — Heatmap MM-Fraktionen (Lachs)");
        assert_eq!(chart.traces.len(), 1);
        assert_eq!(
            chart.layout.x_axis.as_ref().unwrap().side,
            Some(AxisPlacement::Top)
        );
    }

    #[test]
    fn zero_materials_average_across_everything() {
        let ctx = test_context();
        let mut sel = selection("prot");
        sel.prot_view = ProtView::Heatmap;
        sel.mm_fractions = vec!["MM1".to_string()];
        let chart = render(&ctx, &sel);
        assert_eq!(
            chart.title(),
            "Proteasen — Heatmap MM-Fraktionen (Mittel über alle Materialien)"
        );
        let Trace::Heatmap(heatmap) = &chart.traces[0] else {
            panic!("single heatmap trace");
        };
        assert_eq!(heatmap.x, vec!["Alcalase".to_string(), "Papain".to_string()]);
        // Papain MM1 averages Huhn 25 and Lachs 20.
        assert_eq!(heatmap.z[0][1], Some(22.5));
    }

    #[test]
    fn films_chart_groups_by_material_with_hover_detail() {
        let ctx = test_context();
        let chart = render(&ctx, &selection("filme"));
        assert_eq!(chart.title(), "Filme — Gesamtbewertung");
        assert_eq!(chart.series_names(), vec!["Huhn", "Lachs"]);
        let Trace::Bar(huhn) = &chart.traces[0] else {
            panic!("bar per material");
        };
        assert_eq!(
            huhn.x,
            vec![Some("V1".to_string()), Some("V2".to_string())]
        );
        assert_eq!(huhn.y, vec![Some(23.0), Some(21.0)]);
        let hover = huhn.hover.as_ref().unwrap();
        assert_eq!(hover[0].len(), 6);
        assert_eq!(hover[0][0].label, "Homogenität");
        assert_eq!(hover[0][0].value, Some(4.0));
    }

    #[test]
    fn absent_overlay_columns_are_a_no_op() {
        let ctx = test_context();
        let mut sel = selection("prot");
        // "glc" exists only in the Carbohydrates catalog entry, so Proteases
        // simply does not offer it; an unknown tag changes nothing either.
        sel.prot_options = vec!["glc".to_string(), "unsinn".to_string()];
        let chart = render(&ctx, &sel);
        assert_eq!(
            chart.series_names(),
            vec!["TS Überstand [%]", "TS Sediment [%]"]
        );
    }
}
