//! Plot layouts and the instructions they install.
//!
//! A layout fixes the subplot grid and a list of [`PlotInstruction`]s. Instructions name
//! the series they draw by model path and are evaluated against whatever result is
//! current when the figure renders, so they survive across runs.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::engine::result::TIME;

use super::{figure::PresentationError, style::LineStyle};

const GLUCOSE: &str = "bioreactor.c[2]";
const ETHANOL: &str = "bioreactor.c[3]";
const CELLS: &str = "bioreactor.c[1]";
const GROWTH_RATE: &str = "bioreactor.culture.mu";
const OXYGEN_UPTAKE: &str = "bioreactor.culture.qO2";

const TIME_LABEL: &str = "Time [h]";

/// Available plot layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlotLayout {
    /// Glucose, ethanol and cells over time, stacked
    #[default]
    TimeSeries,
    /// Cells, growth rate and glucose with ethanol over time, stacked
    TimeSeries2,
    /// Two by two grid adding the oxygen uptake rate
    Extended,
    /// Glucose against cells
    PhasePlane,
}

impl FromStr for PlotLayout {
    type Err = PresentationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TimeSeries" => Ok(PlotLayout::TimeSeries),
            "TimeSeries2" => Ok(PlotLayout::TimeSeries2),
            "Extended" => Ok(PlotLayout::Extended),
            "PhasePlane" => Ok(PlotLayout::PhasePlane),
            _ => Err(PresentationError::LayoutNotRecognised(s.to_string())),
        }
    }
}

impl fmt::Display for PlotLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlotLayout::TimeSeries => "TimeSeries",
            PlotLayout::TimeSeries2 => "TimeSeries2",
            PlotLayout::Extended => "Extended",
            PlotLayout::PhasePlane => "PhasePlane",
        };
        write!(f, "{name}")
    }
}

/// One cell of the subplot grid. Axes are numbered from 1 in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subplot {
    /// Axis number, 1 for the top left cell
    pub axis: usize,
    /// Only the bottom row carries a time label
    pub x_label: Option<String>,
    pub y_label: String,
    /// Whether the cell shows a legend of its traces
    pub legend: bool,
}

impl Subplot {
    fn new(axis: usize, y_label: &str) -> Self {
        Self {
            axis,
            x_label: None,
            y_label: y_label.to_string(),
            legend: false,
        }
    }

    fn x_label(mut self, label: &str) -> Self {
        self.x_label = Some(label.to_string());
        self
    }

    fn with_legend(mut self) -> Self {
        self.legend = true;
        self
    }
}

/// How an instruction picks its line style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StyleRule {
    /// Use the style of the current render
    Cycle,
    /// Always draw with this style
    Fixed(LineStyle),
}

/// A deferred draw command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotInstruction {
    /// Subplot the trace is drawn into
    pub axis: usize,
    /// Series on the horizontal axis, usually [`TIME`]
    pub x: String,
    /// Model path of the series on the vertical axis
    pub y: String,
    /// Legend entry
    pub label: String,
    /// Line color as understood by plotly
    pub color: String,
    pub style: StyleRule,
}

impl PlotInstruction {
    fn over_time(axis: usize, y: &str, label: &str, color: &str, style: StyleRule) -> Self {
        Self {
            axis,
            x: TIME.to_string(),
            y: y.to_string(),
            label: label.to_string(),
            color: color.to_string(),
            style,
        }
    }

    /// The style this instruction draws with when the render's style is `current`.
    pub fn resolve(&self, current: LineStyle) -> LineStyle {
        match self.style {
            StyleRule::Cycle => current,
            StyleRule::Fixed(style) => style,
        }
    }
}

impl PlotLayout {
    /// Rows and columns of the subplot grid.
    pub fn grid(&self) -> (usize, usize) {
        match self {
            PlotLayout::TimeSeries | PlotLayout::TimeSeries2 => (3, 1),
            PlotLayout::Extended => (2, 2),
            PlotLayout::PhasePlane => (1, 1),
        }
    }

    /// Axis labels and legends of the grid cells, in axis order.
    pub fn subplots(&self) -> Vec<Subplot> {
        match self {
            PlotLayout::TimeSeries => vec![
                Subplot::new(1, "G [g/L]"),
                Subplot::new(2, "E [g/L]"),
                Subplot::new(3, "X [g/L]").x_label(TIME_LABEL),
            ],
            PlotLayout::TimeSeries2 => vec![
                Subplot::new(1, "X [g/L]"),
                Subplot::new(2, "mu [1/h]"),
                Subplot::new(3, "G, E [g/L]")
                    .x_label(TIME_LABEL)
                    .with_legend(),
            ],
            PlotLayout::Extended => vec![
                Subplot::new(1, "G and E [g/L]"),
                Subplot::new(2, "mu [1/h]"),
                Subplot::new(3, "X [g/L]").x_label(TIME_LABEL),
                Subplot::new(4, "qO2 [mole/(g*h)]").x_label(TIME_LABEL),
            ],
            PlotLayout::PhasePlane => vec![Subplot::new(1, "G").x_label("X")],
        }
    }

    /// Instructions installed by this layout.
    pub fn instructions(&self) -> Vec<PlotInstruction> {
        use PlotInstruction as P;
        use StyleRule::{Cycle, Fixed};

        let solid = Fixed(LineStyle::Solid);
        match self {
            PlotLayout::TimeSeries => vec![
                P::over_time(1, GLUCOSE, "G", "blue", Cycle),
                P::over_time(2, ETHANOL, "E", "blue", Cycle),
                P::over_time(3, CELLS, "X", "blue", Cycle),
            ],
            PlotLayout::TimeSeries2 => vec![
                P::over_time(1, CELLS, "X", "red", Cycle),
                P::over_time(2, GROWTH_RATE, "mu", "red", Cycle),
                P::over_time(3, GLUCOSE, "G", "blue", Cycle),
                P::over_time(3, ETHANOL, "E", "green", Cycle),
            ],
            PlotLayout::Extended => vec![
                P::over_time(1, GLUCOSE, "G", "blue", solid),
                P::over_time(1, ETHANOL, "E", "red", solid),
                P::over_time(3, CELLS, "X", "blue", solid),
                P::over_time(2, GROWTH_RATE, "mu", "blue", solid),
                P::over_time(4, OXYGEN_UPTAKE, "qO2", "blue", solid),
            ],
            PlotLayout::PhasePlane => vec![PlotInstruction {
                axis: 1,
                x: CELLS.to_string(),
                y: GLUCOSE.to_string(),
                label: "G".to_string(),
                color: "blue".to_string(),
                style: Cycle,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_from_str() {
        assert_eq!(
            "TimeSeries2".parse::<PlotLayout>().unwrap(),
            PlotLayout::TimeSeries2
        );
        assert!(matches!(
            "Timeseries".parse::<PlotLayout>(),
            Err(PresentationError::LayoutNotRecognised(_))
        ));
    }

    #[test]
    fn test_instructions_fit_grid() {
        for layout in [
            PlotLayout::TimeSeries,
            PlotLayout::TimeSeries2,
            PlotLayout::Extended,
            PlotLayout::PhasePlane,
        ] {
            let (rows, columns) = layout.grid();
            let cells = rows * columns;
            assert_eq!(layout.subplots().len(), cells, "{layout}");
            assert!(
                layout.instructions().iter().all(|i| i.axis <= cells),
                "{layout}"
            );
        }
    }

    #[test]
    fn test_extended_is_always_solid() {
        for instruction in PlotLayout::Extended.instructions() {
            assert_eq!(instruction.resolve(LineStyle::Dot), LineStyle::Solid);
        }
    }

    #[test]
    fn test_phase_plane_plots_glucose_against_cells() {
        let instructions = PlotLayout::PhasePlane.instructions();
        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].x, "bioreactor.c[1]");
        assert_eq!(instructions[0].y, "bioreactor.c[2]");
    }
}
