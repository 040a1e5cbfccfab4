//! Dense component registries.
//!
//! - [`TrackedComponentRegistry`]: a dense array where every component
//!   knows its own position
//! - [`ReferencedComponentRegistry`]: additionally hands out
//!   [`ComponentReference`] handles that detect stale access through a
//!   per-slot version
//!
//! Removal is swap-and-pop: the last component moves into the freed
//! position and its stored index is updated.

mod reference;
mod referenced;
mod tracked;

pub use reference::ComponentReference;
pub use referenced::ReferencedComponentRegistry;
pub use tracked::TrackedComponentRegistry;

/// A component that stores its position in a registry.
pub trait TrackedComponent {
    fn tracked_index(&self) -> Option<usize>;
    fn set_tracked_index(&mut self, index: Option<usize>);
}

/// A tracked component that also stores its reference handle.
pub trait ReferencedComponent: TrackedComponent {
    fn component_reference(&self) -> ComponentReference;
    fn set_component_reference(&mut self, reference: ComponentReference);
}

/// Hooks invoked by registries when components enter or leave them.
pub trait RegistryListener<T> {
    /// Called after the component is stored and its index assigned.
    fn on_component_added(&mut self, _component: &mut T) {}

    /// Called after the component is taken out of the registry.
    fn on_component_removed(&mut self, _component: &mut T) {}
}

impl<T> RegistryListener<T> for () {}
