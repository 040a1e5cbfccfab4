use super::{RegistryListener, TrackedComponent};

/// Dense storage of components that know their own index.
pub struct TrackedComponentRegistry<T, L = ()> {
    components: Vec<T>,
    listener: L,
}

impl<T: TrackedComponent> TrackedComponentRegistry<T> {
    pub fn new() -> Self {
        Self::with_listener(())
    }
}

impl<T: TrackedComponent> Default for TrackedComponentRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TrackedComponent, L: RegistryListener<T>> TrackedComponentRegistry<T, L> {
    pub fn with_listener(listener: L) -> Self {
        Self {
            components: Vec::new(),
            listener,
        }
    }

    /// Stores a component and returns its index.
    pub fn add_tracked_component(&mut self, mut component: T) -> usize {
        let index = self.components.len();
        component.set_tracked_index(Some(index));
        self.components.push(component);
        self.listener.on_component_added(&mut self.components[index]);
        index
    }

    /// Removes the component at `index`. The last component takes its place.
    pub fn remove_tracked_component(&mut self, index: usize) -> Option<T> {
        if index >= self.components.len() {
            return None;
        }
        let mut removed = self.components.swap_remove(index);
        if let Some(moved) = self.components.get_mut(index) {
            moved.set_tracked_index(Some(index));
        }
        removed.set_tracked_index(None);
        self.listener.on_component_removed(&mut removed);
        Some(removed)
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

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.components.iter()
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Body {
        mass: u32,
        index: Option<usize>,
    }

    impl Body {
        fn new(mass: u32) -> Self {
            Self { mass, index: None }
        }
    }

    impl TrackedComponent for Body {
        fn tracked_index(&self) -> Option<usize> {
            self.index
        }

        fn set_tracked_index(&mut self, index: Option<usize>) {
            self.index = index;
        }
    }

    #[derive(Default)]
    struct Counter {
        added: Vec<u32>,
        removed: Vec<u32>,
    }

    impl RegistryListener<Body> for Counter {
        fn on_component_added(&mut self, component: &mut Body) {
            self.added.push(component.mass);
        }

        fn on_component_removed(&mut self, component: &mut Body) {
            self.removed.push(component.mass);
        }
    }

    fn assert_indices_consistent<L: RegistryListener<Body>>(registry: &TrackedComponentRegistry<Body, L>) {
        for (index, body) in registry.iter().enumerate() {
            assert_eq!(body.tracked_index(), Some(index));
        }
    }

    #[test]
    fn add_assigns_sequential_indices() {
        let mut registry = TrackedComponentRegistry::new();
        assert_eq!(registry.add_tracked_component(Body::new(1)), 0);
        assert_eq!(registry.add_tracked_component(Body::new(2)), 1);
        assert_eq!(registry.add_tracked_component(Body::new(3)), 2);
        assert_eq!(registry.num_tracked_components(), 3);
        assert_indices_consistent(&registry);
    }

    #[test]
    fn swap_remove_fixes_moved_index() {
        let mut registry = TrackedComponentRegistry::new();
        for mass in 1..=4 {
            registry.add_tracked_component(Body::new(mass));
        }

        let removed = registry.remove_tracked_component(1).unwrap();
        assert_eq!(removed.mass, 2);
        assert_eq!(removed.tracked_index(), None);

        assert_eq!(registry.tracked_component(1).unwrap().mass, 4);
        assert_indices_consistent(&registry);

        let last = registry.remove_tracked_component(2).unwrap();
        assert_eq!(last.mass, 3);
        assert_indices_consistent(&registry);
        assert_eq!(registry.num_tracked_components(), 2);
    }

    #[test]
    fn remove_out_of_range() {
        let mut registry: TrackedComponentRegistry<Body> = TrackedComponentRegistry::new();
        assert!(registry.remove_tracked_component(0).is_none());
    }

    #[test]
    fn listener_sees_additions_and_removals() {
        let mut registry = TrackedComponentRegistry::with_listener(Counter::default());
        registry.add_tracked_component(Body::new(10));
        registry.add_tracked_component(Body::new(20));
        registry.remove_tracked_component(0);

        assert_eq!(registry.listener().added, [10, 20]);
        assert_eq!(registry.listener().removed, [10]);
    }
}
