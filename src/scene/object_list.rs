/// Ordered list with lock / clone-on-write iteration.
///
/// While at least one lock is held, mutations go to a pending clone; the running iteration keeps
/// seeing the snapshot it started with. The final [`LockedList::unlock`] swaps the clone in.
/// Reads through [`LockedList::as_slice`] always see the latest state.
#[derive(Clone, Debug)]
pub struct LockedList<T: Clone> {
    items: Vec<T>,
    pending: Option<Vec<T>>,
    locks: u32,
}

impl<T: Clone> Default for LockedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pending: None,
            locks: 0,
        }
    }
}

impl<T: Clone> LockedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&mut self) -> &mut Vec<T> {
        if self.locks == 0 {
            return &mut self.items;
        }
        let items = &self.items;
        self.pending.get_or_insert_with(|| items.clone())
    }

    /// Latest view, including mutations made under a lock.
    pub fn as_slice(&self) -> &[T] {
        self.pending.as_deref().unwrap_or(&self.items)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// The items an iteration started under the current lock sees.
    pub fn snapshot(&self) -> &[T] {
        &self.items
    }

    pub fn push(&mut self, item: T) {
        self.write().push(item);
    }

    /// Insert at `index`, clamped to the list length.
    pub fn insert(&mut self, index: usize, item: T) {
        let list = self.write();
        let index = index.min(list.len());
        list.insert(index, item);
    }

    pub fn remove(&mut self, index: usize) -> Option<T> {
        let list = self.write();
        (index < list.len()).then(|| list.remove(index))
    }

    pub fn clear(&mut self) {
        self.write().clear();
    }

    pub fn is_locked(&self) -> bool {
        self.locks > 0
    }

    pub fn lock(&mut self) {
        self.locks += 1;
    }

    /// Release one lock; the last one publishes pending mutations.
    pub fn unlock(&mut self) {
        crate::contract!(self.locks > 0, "unlock without a matching lock");
        self.locks = self.locks.saturating_sub(1);
        if self.locks == 0
            && let Some(pending) = self.pending.take()
        {
            self.items = pending;
        }
    }
}

impl<T: Clone + PartialEq> LockedList<T> {
    pub fn position(&self, item: &T) -> Option<usize> {
        self.as_slice().iter().position(|x| x == item)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.position(item).is_some()
    }

    /// Remove the first occurrence of `item`. Returns whether it was present.
    pub fn remove_item(&mut self, item: &T) -> bool {
        match self.position(item) {
            Some(i) => {
                self.remove(i);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/object_list.rs"]
mod tests;
