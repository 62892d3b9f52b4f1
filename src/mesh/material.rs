/// Ordered material slots of a mesh. A slot may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialSlots {
    slots: Vec<Option<String>>,
}

impl MaterialSlots {
    /// Creates slots from a list of optional names.
    #[must_use]
    pub fn from_names(slots: Vec<Option<String>>) -> Self {
        Self { slots }
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if there are no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Name of the material in slot `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.slots.get(index).and_then(|s| s.as_deref())
    }

    /// All slots in order.
    #[must_use]
    pub fn slots(&self) -> &[Option<String>] {
        &self.slots
    }

    /// Assigned material names in slot order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter_map(|s| s.as_deref())
    }

    /// First slot holding `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.as_deref() == Some(name))
    }

    /// Appends a slot.
    pub fn push(&mut self, name: Option<String>) {
        self.slots.push(name);
    }

    /// Assigns slot `index`, growing the list with empty slots if needed.
    pub fn set(&mut self, index: usize, name: Option<String>) {
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = name;
    }

    /// Grows or truncates to exactly `len` slots.
    pub fn resize(&mut self, len: usize) {
        self.slots.resize(len, None);
    }

    /// Removes slot `index` and returns its name.
    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index < self.slots.len() {
            self.slots.remove(index)
        } else {
            None
        }
    }

    /// Index of the first empty slot, appending one when every slot is
    /// assigned.
    pub fn empty_slot(&mut self) -> usize {
        if let Some(index) = self.slots.iter().position(Option::is_none) {
            return index;
        }
        self.slots.push(None);
        self.slots.len() - 1
    }

    /// Appends every named material of `other` not already present here.
    ///
    /// Existing slots keep their order; returns the number of slots added.
    pub fn append_missing(&mut self, other: &MaterialSlots) -> usize {
        let mut added = 0;
        for name in other.names() {
            if self.position(name).is_none() {
                self.slots.push(Some(name.to_owned()));
                added += 1;
            }
        }
        added
    }
}
