//! The figure a session draws into.
//!
//! Renders accumulate: each run adds its traces on top of the earlier ones, drawn with
//! the next style of the cycle, so consecutive runs can be compared in one figure.
//! Declaring a new layout starts a fresh figure.

use std::{fmt, path::Path};

use plotly::{
    common::{Line, Mode},
    layout::{Axis, GridPattern, LayoutGrid},
    Layout, Plot, Scatter,
};
use thiserror::Error;

use crate::engine::result::RunResult;

use super::{
    layout::{PlotInstruction, PlotLayout, Subplot},
    style::{LineStyle, StyleCycle},
};

/// Title of a figure when none is given.
pub const DEFAULT_TITLE: &str = "Batch cultivation";
const SUBPLOT_HEIGHT: usize = 250;

/// A plotly figure together with the layout it was declared with and the style cycle
/// of its renders.
pub struct Figure {
    layout: PlotLayout,
    title: String,
    instructions: Vec<PlotInstruction>,
    cycle: StyleCycle,
    plot: Plot,
    history: Vec<LineStyle>,
}

impl fmt::Debug for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Figure")
            .field("layout", &self.layout)
            .field("title", &self.title)
            .field("instructions", &self.instructions)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl Default for Figure {
    fn default() -> Self {
        Self::new(PlotLayout::default(), DEFAULT_TITLE)
    }
}

impl Figure {
    /// Creates an empty figure with the subplots of `layout`.
    ///
    /// # Arguments
    ///
    /// * `layout` - The diagram layout
    /// * `title` - Title shown above the figure
    pub fn new(layout: PlotLayout, title: &str) -> Self {
        let mut figure = Self {
            layout,
            title: title.to_string(),
            instructions: Vec::new(),
            cycle: StyleCycle::default(),
            plot: Plot::new(),
            history: Vec::new(),
        };
        figure.declare(layout, title);
        figure
    }

    /// Replaces the layout, its instructions and the figure, and restarts the style cycle.
    pub fn declare(&mut self, layout: PlotLayout, title: &str) {
        log::debug!("declaring plot layout {layout} '{title}'");
        self.layout = layout;
        self.title = title.to_string();
        self.instructions = layout.instructions();
        self.cycle.reset();
        self.history.clear();

        let mut plot = Plot::new();
        plot.set_layout(plot_layout(layout, title));
        self.plot = plot;
    }

    pub fn layout(&self) -> PlotLayout {
        self.layout
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Series drawn by each render.
    pub fn instructions(&self) -> &[PlotInstruction] {
        &self.instructions
    }

    /// Styles handed out by the renders since the layout was declared.
    pub fn history(&self) -> &[LineStyle] {
        &self.history
    }

    /// The underlying plotly figure.
    pub fn plot(&self) -> &Plot {
        &self.plot
    }

    /// Draws every instruction against `result` and returns the style of this render.
    ///
    /// Instructions with a fixed style keep it; the cycle still advances. Nothing is
    /// drawn if any series is missing from the result.
    pub fn render(&mut self, result: &RunResult) -> Result<LineStyle, PresentationError> {
        let mut traces = Vec::with_capacity(self.instructions.len());
        for instruction in &self.instructions {
            let x = series(result, &instruction.x)?;
            let y = series(result, &instruction.y)?;
            traces.push((instruction, x, y));
        }

        let style = self.cycle.next_style();
        let subplots = self.layout.subplots();
        for (instruction, x, y) in traces {
            let legend = subplots
                .iter()
                .find(|s| s.axis == instruction.axis)
                .is_some_and(|s| s.legend);

            let trace = Scatter::new(x, y)
                .name(instruction.label.as_str())
                .mode(Mode::Lines)
                .x_axis(&format!("x{}", instruction.axis))
                .y_axis(&format!("y{}", instruction.axis))
                .show_legend(legend)
                .line(
                    Line::new()
                        .width(1.5)
                        .dash(instruction.resolve(style).dash())
                        .color(instruction.color.clone()),
                );
            self.plot.add_trace(trace);
        }

        self.history.push(style);
        Ok(style)
    }

    /// Writes the figure as a standalone HTML page.
    pub fn write_html(&self, path: impl AsRef<Path>) -> Result<(), PresentationError> {
        std::fs::write(path, self.plot.to_html())?;
        Ok(())
    }

    /// Opens the figure in the default browser.
    pub fn display(&self) {
        self.plot.show();
    }
}

fn series(result: &RunResult, key: &str) -> Result<Vec<f64>, PresentationError> {
    result
        .get(key)
        .map(<[f64]>::to_vec)
        .ok_or_else(|| PresentationError::SeriesMissing(key.to_string()))
}

fn axis(title: Option<&String>) -> Axis {
    let axis = Axis::new().show_grid(true);
    match title {
        Some(title) => axis.title(title.as_str()),
        None => axis,
    }
}

fn plot_layout(layout: PlotLayout, title: &str) -> Layout {
    let (rows, columns) = layout.grid();
    let mut plot_layout = Layout::new()
        .title(title)
        .show_legend(true)
        .height(SUBPLOT_HEIGHT * rows)
        .grid(
            LayoutGrid::new()
                .rows(rows)
                .columns(columns)
                .pattern(GridPattern::Independent),
        );

    for Subplot {
        axis: index,
        x_label,
        y_label,
        ..
    } in layout.subplots()
    {
        let x = axis(x_label.as_ref());
        let y = axis(Some(&y_label));
        plot_layout = match index {
            1 => plot_layout.x_axis(x).y_axis(y),
            2 => plot_layout.x_axis2(x).y_axis2(y),
            3 => plot_layout.x_axis3(x).y_axis3(y),
            _ => plot_layout.x_axis4(x).y_axis4(y),
        };
    }

    plot_layout
}

/// Errors raised while drawing or writing a figure.
#[derive(Error, Debug)]
pub enum PresentationError {
    #[error("Plot window type '{0}' not recognised")]
    LayoutNotRecognised(String),
    /// Nothing of the render is drawn.
    #[error("Series '{0}' is not in the result")]
    SeriesMissing(String),
    #[error("Failed to write figure: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> RunResult {
        let mut result = RunResult::new(vec![0.0, 1.0, 2.0]);
        for key in [
            "bioreactor.c[1]",
            "bioreactor.c[2]",
            "bioreactor.c[3]",
            "bioreactor.culture.mu",
            "bioreactor.culture.qO2",
        ] {
            result.add_series(key.to_string(), vec![1.0, 2.0, 3.0]);
        }
        result
    }

    #[test]
    fn test_renders_cycle_styles() {
        let mut figure = Figure::default();
        let result = result();
        let styles: Vec<LineStyle> = (0..5).map(|_| figure.render(&result).unwrap()).collect();

        assert_eq!(styles[0], LineStyle::Solid);
        assert_eq!(styles[1], LineStyle::Dash);
        assert_eq!(styles[2], LineStyle::Dot);
        assert_eq!(styles[3], LineStyle::DashDot);
        assert_eq!(styles[4], LineStyle::Solid);
        assert_eq!(figure.history().len(), 5);
    }

    #[test]
    fn test_declare_resets_cycle_and_instructions() {
        let mut figure = Figure::default();
        figure.render(&result()).unwrap();
        figure.declare(PlotLayout::Extended, "Extended view");

        assert_eq!(figure.instructions().len(), 5);
        assert!(figure.history().is_empty());
        assert_eq!(figure.render(&result()).unwrap(), LineStyle::Solid);
        assert_eq!(figure.title(), "Extended view");
    }

    #[test]
    fn test_missing_series_draws_nothing() {
        let mut figure = Figure::default();
        let result = RunResult::new(vec![0.0, 1.0]);

        let err = figure.render(&result).unwrap_err();
        assert!(matches!(err, PresentationError::SeriesMissing(_)));
        assert!(figure.history().is_empty());
    }

    #[test]
    fn test_write_html() {
        let mut figure = Figure::default();
        figure.render(&result()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figure.html");
        figure.write_html(&path).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("Batch cultivation"));
    }
}
