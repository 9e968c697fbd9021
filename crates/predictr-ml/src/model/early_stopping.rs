//! Patience-based early stopping on the training loss.

use tracing::{debug, info};

/// Decision after observing one epoch's loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochVerdict {
    /// New best loss; snapshot the weights.
    Improved,
    Continue,
    Stop,
}

#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: u32,
    min_delta: f64,
    best_loss: Option<f64>,
    best_epoch: u32,
    epochs_without_improvement: u32,
}

impl EarlyStopping {
    pub fn new(patience: u32, min_delta: f64) -> Self {
        Self {
            patience,
            min_delta,
            best_loss: None,
            best_epoch: 0,
            epochs_without_improvement: 0,
        }
    }

    pub fn best_loss(&self) -> Option<f64> {
        self.best_loss
    }

    pub fn best_epoch(&self) -> u32 {
        self.best_epoch
    }

    fn is_improvement(&self, loss: f64) -> bool {
        match self.best_loss {
            None => loss.is_finite(),
            Some(best) => loss < best - self.min_delta,
        }
    }

    pub fn observe(&mut self, epoch: u32, loss: f64) -> EpochVerdict {
        if self.is_improvement(loss) {
            debug!(epoch, loss, previous = ?self.best_loss, "training loss improved");
            self.best_loss = Some(loss);
            self.best_epoch = epoch;
            self.epochs_without_improvement = 0;
            return EpochVerdict::Improved;
        }

        self.epochs_without_improvement += 1;
        if self.epochs_without_improvement >= self.patience {
            info!(
                epoch,
                best_epoch = self.best_epoch,
                patience = self.patience,
                "stopping early"
            );
            return EpochVerdict::Stop;
        }
        EpochVerdict::Continue
    }
}
