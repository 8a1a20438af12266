/// Actions that cannot run until some readiness condition holds (a live
/// connection, a loaded game). Entries are kept in arrival order and handed
/// out exactly once, when the condition goes from false to true.
#[derive(Debug)]
pub struct PendingQueue<T> {
    items: Vec<T>,
    ready: bool,
}

impl<T> Default for PendingQueue<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            ready: false,
        }
    }
}

impl<T> PendingQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Records the current state of the readiness condition. On a
    /// false→true transition the queued items are returned in order and the
    /// queue is emptied; any other call returns nothing.
    pub fn observe(&mut self, ready: bool) -> Vec<T> {
        let was_ready = self.ready;
        self.ready = ready;
        if ready && !was_ready {
            std::mem::take(&mut self.items)
        } else {
            Vec::new()
        }
    }

    /// Keeps only the queued entries matching `keep`, in order. Readiness
    /// is unchanged.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.items.retain(keep);
    }
}
