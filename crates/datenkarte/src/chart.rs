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

// The chart specification handed to a rendering surface: series data plus
// layout, no drawing calls.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSide {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisPlacement {
    Right,
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BarMode {
    Stack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScatterMode {
    #[serde(rename = "markers+lines")]
    MarkersLines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendOrientation {
    Horizontal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub orientation: LegendOrientation,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<AxisPlacement>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub overlays_primary: bool,
}

impl Axis {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            range: None,
            side: None,
            overlays_primary: false,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some([min, max]);
        self
    }

    pub fn with_side(mut self, side: AxisPlacement) -> Self {
        self.side = Some(side);
        self
    }

    pub fn overlaying_primary(mut self) -> Self {
        self.overlays_primary = true;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ColourAxis {
    pub colourscale: String,
    pub min: f64,
    pub max: f64,
    pub bar_title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: String,
    pub white_background: bool,
    pub legend: Legend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_mode: Option<BarMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis2: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour_axis: Option<ColourAxis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Layout {
    // The base every chart shares: white background, horizontal legend below
    // the plot area, explicit title.
    pub fn white(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            white_background: true,
            legend: Legend {
                orientation: LegendOrientation::Horizontal,
                y: -0.25,
            },
            bar_mode: None,
            x_axis: None,
            y_axis: None,
            y_axis2: None,
            colour_axis: None,
            annotations: Vec::new(),
        }
    }

    pub fn with_bar_mode(mut self, mode: BarMode) -> Self {
        self.bar_mode = Some(mode);
        self
    }

    pub fn with_x_axis(mut self, axis: Axis) -> Self {
        self.x_axis = Some(axis);
        self
    }

    pub fn with_y_axis(mut self, axis: Axis) -> Self {
        self.y_axis = Some(axis);
        self
    }

    pub fn with_y_axis2(mut self, axis: Axis) -> Self {
        self.y_axis2 = Some(axis);
        self
    }

    pub fn with_colour_axis(mut self, axis: ColourAxis) -> Self {
        self.colour_axis = Some(axis);
        self
    }

    pub fn with_legend_y(mut self, y: f64) -> Self {
        self.legend.y = y;
        self
    }
}

// Per-point inspectable detail (the Films quality sub-scores).
#[derive(Debug, Clone, Serialize)]
pub struct HoverValue {
    pub label: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BarTrace {
    pub name: String,
    pub x: Vec<Option<String>>,
    pub y: Vec<Option<f64>>,
    pub axis: AxisSide,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover: Option<Vec<Vec<HoverValue>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterTrace {
    pub name: String,
    pub x: Vec<Option<String>>,
    pub y: Vec<Option<f64>>,
    pub mode: ScatterMode,
    pub axis: AxisSide,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapTrace {
    // Subplot caption for paired heatmaps ("Material: <name>").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: Vec<String>,
    pub y: Vec<String>,
    pub z: Vec<Vec<Option<f64>>>,
    pub text_format: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trace {
    Bar(BarTrace),
    Scatter(ScatterTrace),
    Heatmap(HeatmapTrace),
}

impl Trace {
    pub fn name(&self) -> &str {
        match self {
            Trace::Bar(t) => &t.name,
            Trace::Scatter(t) => &t.name,
            Trace::Heatmap(t) => t.name.as_deref().unwrap_or(""),
        }
    }

    pub fn axis(&self) -> Option<AxisSide> {
        match self {
            Trace::Bar(t) => Some(t.axis),
            Trace::Scatter(t) => Some(t.axis),
            Trace::Heatmap(_) => None,
        }
    }

    pub fn is_heatmap(&self) -> bool {
        matches!(self, Trace::Heatmap(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub traces: Vec<Trace>,
    pub layout: Layout,
}

impl ChartSpec {
    pub fn new(layout: Layout) -> Self {
        Self {
            traces: Vec::new(),
            layout,
        }
    }

    // An empty chart carrying only a title, used for the "nothing to show"
    // edge cases instead of an error.
    pub fn placeholder(title: impl Into<String>) -> Self {
        Self::new(Layout::white(title))
    }

    pub fn with_annotation(mut self, text: impl Into<String>) -> Self {
        self.layout.annotations.push(Annotation { text: text.into() });
        self
    }

    pub fn push(&mut self, trace: Trace) {
        self.traces.push(trace);
    }

    pub fn title(&self) -> &str {
        &self.layout.title
    }

    pub fn is_placeholder(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn series_names(&self) -> Vec<&str> {
        self.traces.iter().map(Trace::name).collect()
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
