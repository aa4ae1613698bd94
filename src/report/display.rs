use std::fmt::{Display, Formatter};

use colored::Colorize;

use crate::report::CoverageComparison;

const BAR_WIDTH: usize = 40;

impl Display for CoverageComparison {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|(s, _, _)| s.len())
            .max()
            .unwrap_or(0)
            .max("Session".len());
        writeln!(
            f,
            "{:<width$}  {:>8}  {:>8}",
            "Session", self.left, self.right
        )?;
        for (session, l, r) in &self.rows {
            let right = format!("{r:>8.3}");
            let right = if r > l {
                right.green()
            } else if r < l {
                right.red()
            } else {
                right.normal()
            };
            writeln!(f, "{session:<width$}  {l:>8.3}  {right}")?;
        }
        let (l, r) = self.means();
        write!(f, "{:<width$}  {l:>8.3}  {r:>8.3}", "mean")
    }
}

/// Horizontal bars of both runs' coverage ratios, one pair of bars per
/// session.
pub struct CoverageBarChart<'a> {
    pub(crate) comparison: &'a CoverageComparison,
}

impl CoverageComparison {
    pub fn bar_chart(&self) -> CoverageBarChart<'_> {
        CoverageBarChart { comparison: self }
    }
}

fn bar(ratio: f64) -> String {
    let filled = (ratio.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

impl Display for CoverageBarChart<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let c = self.comparison;
        let width = c
            .rows
            .iter()
            .map(|(s, _, _)| s.len())
            .chain([c.left.len(), c.right.len()])
            .max()
            .unwrap_or(0);
        writeln!(f, "{} {}  {} {}", "#".blue(), c.left, "#".yellow(), c.right)?;
        for (session, l, r) in &c.rows {
            writeln!(f, "{session:<width$} |{}| {l:.2}", bar(*l).blue())?;
            writeln!(f, "{:<width$} |{}| {r:.2}", "", bar(*r).yellow())?;
        }
        Ok(())
    }
}
