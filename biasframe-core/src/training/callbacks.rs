//! Training callbacks.

/// Action a callback can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Continue,
    Stop,
}

/// Stops once `patience` consecutive epochs have failed to set a new best
/// selection score. Whether an epoch improved is decided by
/// [`TrainingHistory::record_epoch`](super::TrainingHistory::record_epoch).
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    pub patience: usize,
    counter: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            counter: 0,
        }
    }

    pub fn on_epoch_end(&mut self, improved: bool) -> CallbackAction {
        if improved {
            self.counter = 0;
            return CallbackAction::Continue;
        }
        self.counter += 1;
        if self.patience > 0 && self.counter >= self.patience {
            CallbackAction::Stop
        } else {
            CallbackAction::Continue
        }
    }
}
