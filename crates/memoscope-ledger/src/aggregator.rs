use memoscope_core::{MemoRecord, UserMemoIndex};

/// Accumulates memo records per sending account, preserving arrival order.
#[derive(Debug, Clone, Default)]
pub struct UserMemoAggregator {
    index: UserMemoIndex,
    record_count: usize,
}

impl UserMemoAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue from a previously persisted index, e.g. a checkpoint.
    pub fn from_index(index: UserMemoIndex) -> Self {
        let record_count = index.values().map(Vec::len).sum();
        Self {
            index,
            record_count,
        }
    }

    pub fn add(&mut self, record: MemoRecord) {
        self.index
            .entry(record.sender.clone())
            .or_default()
            .push(record);
        self.record_count += 1;
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = MemoRecord>) {
        for record in records {
            self.add(record);
        }
    }

    /// Independent copy of the current state.
    pub fn snapshot(&self) -> UserMemoIndex {
        self.index.clone()
    }

    pub fn index(&self) -> &UserMemoIndex {
        &self.index
    }

    pub fn into_index(self) -> UserMemoIndex {
        self.index
    }

    pub fn account_count(&self) -> usize {
        self.index.len()
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}
