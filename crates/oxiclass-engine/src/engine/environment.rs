use crate::{Dataset, Instance};

/// Sequential cursor over the training data.
///
/// Training consumes instances in order, wrapping back to the start after
/// the last one. Evaluations that need to scan the data can save and later
/// restore the cursor so training resumes where it left off.
#[derive(Debug, Clone)]
pub struct Environment {
    dataset: Dataset,
    cursor: usize,
    saved_cursor: usize,
    epoch: usize,
}

impl Environment {
    #[must_use]
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            cursor: 0,
            saved_cursor: 0,
            epoch: 0,
        }
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    #[must_use]
    pub fn current_instance(&self) -> &Instance {
        self.dataset.train_instance(self.cursor)
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.cursor
    }

    /// Number of completed passes over the training data.
    #[must_use]
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Moves to the next training instance, wrapping after the last one.
    pub fn advance(&mut self) {
        if self.cursor + 1 < self.dataset.num_train_instances() {
            self.cursor += 1;
        } else {
            self.cursor = 0;
            self.epoch += 1;
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Remembers the training position before an evaluation scan.
    pub fn begin_evaluation(&mut self) {
        self.saved_cursor = self.cursor;
    }

    /// Restores the training position saved by [`Self::begin_evaluation`].
    pub fn end_evaluation(&mut self) {
        self.cursor = self.saved_cursor;
    }
}
