use super::{ComponentReference, ReferencedComponent, RegistryListener};

/// Slot of the reference table.
#[derive(Debug, Clone, Copy, Default)]
struct ReferenceEntry {
    /// Position in the dense component array, if the slot is occupied.
    component: Option<usize>,
    /// Current version. Bumped on every removal.
    version: u8,
}

/// Hands out reference indices, reusing released ones first.
struct IndexAllocator {
    next: u32,
    /// Recyclable indices (LIFO stack).
    free_list: Vec<u32>,
    max_index: u32,
}

impl IndexAllocator {
    fn new(max_index: u32) -> Self {
        Self {
            next: 1,
            free_list: Vec::new(),
            max_index,
        }
    }

    fn allocate(&mut self) -> Option<u32> {
        if let Some(index) = self.free_list.pop() {
            return Some(index);
        }
        if self.next > self.max_index {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(index)
    }

    fn release(&mut self, index: u32) {
        self.free_list.push(index);
    }
}

/// Dense component storage with versioned reference handles.
///
/// A component added with a non-null reference keeps it if the slot is
/// free, so references stored in saved data stay valid after loading.
/// The reference table grows on demand and never shrinks.
pub struct ReferencedComponentRegistry<T, L = ()> {
    components: Vec<T>,
    entries: Vec<ReferenceEntry>,
    allocator: IndexAllocator,
    listener: L,
}

impl<T: ReferencedComponent> ReferencedComponentRegistry<T> {
    pub fn new() -> Self {
        Self::with_listener(())
    }
}

impl<T: ReferencedComponent> Default for ReferencedComponentRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ReferencedComponent, L: RegistryListener<T>> ReferencedComponentRegistry<T, L> {
    pub fn with_listener(listener: L) -> Self {
        Self {
            components: Vec::new(),
            entries: Vec::new(),
            allocator: IndexAllocator::new(ComponentReference::MAX_INDEX),
            listener,
        }
    }

    #[cfg(test)]
    fn with_index_limit(listener: L, max_index: u32) -> Self {
        let mut registry = Self::with_listener(listener);
        registry.allocator = IndexAllocator::new(max_index);
        registry
    }

    /// Stores a component and returns its reference.
    ///
    /// The component's current reference is kept when its slot is free.
    /// Otherwise a new reference is allocated. If no index is left the
    /// component is stored with [`ComponentReference::NONE`].
    pub fn add_tracked_component(&mut self, mut component: T) -> ComponentReference {
        let carried = component.component_reference();
        let reference = if !carried.is_none() && self.is_slot_free(carried.index()) {
            let entry = self.entry_mut(carried.index());
            entry.version = carried.version();
            carried
        } else {
            if !carried.is_none() {
                log::warn!(
                    "Component reference {carried} is already in use, a new reference is assigned"
                );
            }
            match self.allocate_reference_index() {
                0 => ComponentReference::NONE,
                index => ComponentReference::new(index, self.entry_mut(index).version),
            }
        };

        let dense_index = self.components.len();
        if !reference.is_none() {
            self.entry_mut(reference.index()).component = Some(dense_index);
        }
        component.set_tracked_index(Some(dense_index));
        component.set_component_reference(reference);
        self.components.push(component);
        self.listener
            .on_component_added(&mut self.components[dense_index]);
        reference
    }

    /// Removes the component at dense position `index`.
    ///
    /// The component's reference becomes stale: its slot version is
    /// bumped and the index is recycled.
    pub fn remove_tracked_component(&mut self, index: usize) -> Option<T> {
        if index >= self.components.len() {
            return None;
        }

        let mut removed = self.components.swap_remove(index);
        if let Some(moved) = self.components.get_mut(index) {
            moved.set_tracked_index(Some(index));
            let moved_reference = moved.component_reference();
            if !moved_reference.is_none() {
                self.entries[moved_reference.index() as usize].component = Some(index);
            }
        }

        let reference = removed.component_reference();
        if !reference.is_none() {
            let entry = &mut self.entries[reference.index() as usize];
            entry.component = None;
            entry.version = entry.version.wrapping_add(1);
            self.allocator.release(reference.index());
        }

        removed.set_tracked_index(None);
        removed.set_component_reference(ComponentReference::NONE);
        self.listener.on_component_removed(&mut removed);
        Some(removed)
    }

    /// Removes the component a reference points to. Stale references
    /// remove nothing.
    pub fn remove_by_reference(&mut self, reference: ComponentReference) -> Option<T> {
        let index = self.dense_index(reference, true)?;
        self.remove_tracked_component(index)
    }

    /// Resolves a reference. Without `check_version` a stale reference
    /// resolves to whatever component occupies the slot now.
    pub fn tracked_component_by_reference(
        &self,
        reference: ComponentReference,
        check_version: bool,
    ) -> Option<&T> {
        let index = self.dense_index(reference, check_version)?;
        self.components.get(index)
    }

    pub fn tracked_component_by_reference_mut(
        &mut self,
        reference: ComponentReference,
        check_version: bool,
    ) -> Option<&mut T> {
        let index = self.dense_index(reference, check_version)?;
        self.components.get_mut(index)
    }

    pub fn tracked_component(&self, index: usize) -> Option<&T> {
        self.components.get(index)
    }

    pub fn tracked_component_mut(&mut self, index: usize) -> Option<&mut T> {
        self.components.get_mut(index)
    }

    pub fn num_tracked_components(&self) -> usize {
        self.components.len()
    }

    /// Size of the reference table, including the reserved slot 0.
    pub fn reference_capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.components.iter()
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Returns a free reference index, or 0 if all indices are taken.
    ///
    /// Indices claimed by carried references may still sit in the
    /// allocator; those are skipped.
    fn allocate_reference_index(&mut self) -> u32 {
        loop {
            let Some(index) = self.allocator.allocate() else {
                log::error!(
                    "Out of component reference indices ({} components registered)",
                    self.components.len()
                );
                return 0;
            };
            if self.is_slot_free(index) {
                self.entry_mut(index);
                return index;
            }
        }
    }

    fn is_slot_free(&self, index: u32) -> bool {
        self.entries
            .get(index as usize)
            .is_none_or(|entry| entry.component.is_none())
    }

    /// Returns the slot, growing the table if needed.
    fn entry_mut(&mut self, index: u32) -> &mut ReferenceEntry {
        let index = index as usize;
        if self.entries.len() <= index {
            self.entries.resize(index + 1, ReferenceEntry::default());
        }
        &mut self.entries[index]
    }

    fn dense_index(&self, reference: ComponentReference, check_version: bool) -> Option<usize> {
        if reference.is_none() {
            return None;
        }
        let entry = self.entries.get(reference.index() as usize)?;
        if check_version && entry.version != reference.version() {
            return None;
        }
        entry.component
    }
}
