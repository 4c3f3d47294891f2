use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// The relative change of the iterate fell below the tolerance.
    Converged,
    /// The iteration cap was hit first; the last iterate is still returned.
    MaxIterations,
}

#[derive(Debug, Clone)]
pub struct SolverStats {
    pub status: SolveStatus,
    pub iterations: usize,
    /// Last `||v - v_prev|| / (||v|| + eps)`, or `None` if `v` stayed zero.
    pub relative_change: Option<f64>,
    pub nonzeros: usize,
}

/// One greedy step of orthogonal matching pursuit.
#[derive(Debug, Clone)]
pub struct OmpIterationReport {
    pub iteration: usize,
    pub selected: usize,
    pub projection: f64,
    pub support_size: usize,
    pub residual_norm: f64,
}

/// One ADMM sweep.
#[derive(Debug, Clone)]
pub struct AdmmIterationReport {
    pub iteration: usize,
    pub relative_change: Option<f64>,
    pub v_norm: f64,
    pub dual_norm: f64,
    pub nonzeros: usize,
}

pub(crate) fn emit_line(line: &str) {
    if log::log_enabled!(log::Level::Info) {
        log::info!("{line}");
    } else {
        println!("{line}");
    }
}

pub trait Reporter {
    fn on_omp_iteration(&mut self, _report: &OmpIterationReport) {}
    fn on_admm_iteration(&mut self, _report: &AdmmIterationReport) {}
    fn on_finish(&mut self) {}
}

pub struct StdoutReporter {
    omp_rows: Vec<OmpIterationReport>,
    admm_rows: Vec<AdmmIterationReport>,
}

impl StdoutReporter {
    pub fn new() -> Self {
        Self {
            omp_rows: Vec::new(),
            admm_rows: Vec::new(),
        }
    }
}

impl Default for StdoutReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn right(content: impl ToString) -> Cell {
    Cell::new(content.to_string()).set_alignment(CellAlignment::Right)
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

impl Reporter for StdoutReporter {
    fn on_omp_iteration(&mut self, report: &OmpIterationReport) {
        self.omp_rows.push(report.clone());
    }

    fn on_admm_iteration(&mut self, report: &AdmmIterationReport) {
        self.admm_rows.push(report.clone());
    }

    fn on_finish(&mut self) {
        if self.omp_rows.is_empty() && self.admm_rows.is_empty() {
            return;
        }
        if !log::log_enabled!(log::Level::Info) {
            println!();
        }

        if !self.omp_rows.is_empty() {
            let mut table = new_table();
            table.set_header(vec![
                right("iter"),
                right("atom"),
                right("|proj|"),
                right("support"),
                right("residual"),
            ]);
            for row in &self.omp_rows {
                table.add_row(vec![
                    right(row.iteration),
                    right(row.selected),
                    right(format!("{:.4e}", row.projection)),
                    right(row.support_size),
                    right(format!("{:.4e}", row.residual_norm)),
                ]);
            }
            for line in table.to_string().lines() {
                emit_line(line);
            }
        }

        if !self.admm_rows.is_empty() {
            let mut table = new_table();
            table.set_header(vec![
                right("iter"),
                right("rel change"),
                right("|v|"),
                right("|u|"),
                right("nnz"),
            ]);
            for row in &self.admm_rows {
                let change = match row.relative_change {
                    Some(change) => format!("{change:.3e}"),
                    None => "-".to_string(),
                };
                table.add_row(vec![
                    right(row.iteration),
                    right(change),
                    right(format!("{:.4e}", row.v_norm)),
                    right(format!("{:.4e}", row.dual_norm)),
                    right(row.nonzeros),
                ]);
            }
            for line in table.to_string().lines() {
                emit_line(line);
            }
        }

        self.omp_rows.clear();
        self.admm_rows.clear();
    }
}

pub(crate) enum ReporterSlot<'a> {
    External(&'a mut dyn Reporter),
    Local(StdoutReporter),
    None,
}

impl<'a> ReporterSlot<'a> {
    pub(crate) fn new(reporter: Option<&'a mut dyn Reporter>, verbose: bool) -> Self {
        match reporter {
            Some(r) => Self::External(r),
            None if verbose => Self::Local(StdoutReporter::new()),
            None => Self::None,
        }
    }

    pub(crate) fn as_mut(&mut self) -> Option<&mut dyn Reporter> {
        match self {
            Self::External(r) => Some(*r),
            Self::Local(r) => Some(r),
            Self::None => None,
        }
    }

    pub(crate) fn finish(&mut self) {
        if let Some(reporter) = self.as_mut() {
            reporter.on_finish();
        }
    }
}
