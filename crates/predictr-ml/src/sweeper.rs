//! Removes registry entries whose artifacts can never load again.

use predictr_core::Symbol;
use predictr_warehouse::ModelRecord;
use serde::Serialize;
use tracing::{info, warn};

use crate::context::ForecastContext;
use crate::ForecastError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub examined: usize,
    pub removed: usize,
    /// Records left alone because training held the lock, the load
    /// failure was not a compatibility problem, or removal itself failed.
    pub skipped: usize,
}

/// Deletes records whose artifact is missing or incompatible.
///
/// Corrupt artifacts and storage errors are left in place; a later
/// prediction reports them. Symbols being trained are skipped, as are
/// records whose removal fails, so the next sweep retries them.
#[derive(Clone)]
pub struct Sweeper {
    ctx: ForecastContext,
}

enum Verdict {
    Keep,
    Remove { delete_artifact: bool },
    Skip,
}

impl Sweeper {
    pub fn new(ctx: ForecastContext) -> Self {
        Self { ctx }
    }

    pub fn sweep(&self) -> Result<SweepReport, ForecastError> {
        let mut report = SweepReport::default();

        for record in self.ctx.models.list()? {
            report.examined += 1;

            let symbol = match Symbol::parse(&record.symbol) {
                Ok(symbol) => symbol,
                Err(error) => {
                    warn!(symbol = %record.symbol, error = %error, "registry holds an invalid symbol");
                    report.skipped += 1;
                    continue;
                }
            };
            let Some(_guard) = self.ctx.locks.try_lock(&symbol) else {
                report.skipped += 1;
                continue;
            };

            match self.inspect(&record) {
                Verdict::Keep => {}
                Verdict::Skip => report.skipped += 1,
                Verdict::Remove { delete_artifact } => match self.remove(&record, delete_artifact) {
                    Ok(()) => report.removed += 1,
                    Err(error) => {
                        warn!(symbol = %record.symbol, error = %error, "failed to remove model; will retry next sweep");
                        report.skipped += 1;
                    }
                },
            }
        }

        info!(
            examined = report.examined,
            removed = report.removed,
            skipped = report.skipped,
            "model sweep finished"
        );
        Ok(report)
    }

    fn remove(&self, record: &ModelRecord, delete_artifact: bool) -> Result<(), ForecastError> {
        if delete_artifact {
            self.ctx.artifacts.delete(&record.model_path)?;
        }
        self.ctx.models.delete(&record.symbol)?;
        Ok(())
    }

    fn inspect(&self, record: &ModelRecord) -> Verdict {
        match self.ctx.load_model(record) {
            Ok(_) => Verdict::Keep,
            Err(ForecastError::ArtifactMissing { path }) => {
                info!(symbol = %record.symbol, %path, "artifact missing; removing record");
                Verdict::Remove {
                    delete_artifact: false,
                }
            }
            Err(error) if error.is_compatibility() => {
                info!(symbol = %record.symbol, error = %error, "incompatible artifact; removing");
                Verdict::Remove {
                    delete_artifact: true,
                }
            }
            Err(error) => {
                warn!(symbol = %record.symbol, error = %error, "artifact failed to load; leaving in place");
                Verdict::Skip
            }
        }
    }
}
