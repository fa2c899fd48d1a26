// Handler registry: the ordered set of handler types to wire at build time

use crate::{Handler, HandlerRegistration};
use std::any::TypeId;
use std::collections::HashSet;

/// Ordered collection of handler registrations.
///
/// Registration order is preserved because it determines the order routes are
/// wired in; re-registering the same type is a no-op, so repeated bootstrap
/// code cannot inflate the route table.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    registrations: Vec<HandlerRegistration>,
    seen: HashSet<TypeId>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler type with its factory. Duplicate registrations of
    /// the same type are ignored.
    pub fn register<H, F>(&mut self, factory: F)
    where
        H: Handler,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let registration = HandlerRegistration::new(factory);
        if !self.seen.insert(registration.type_id) {
            tracing::debug!(handler = registration.type_name, "Handler already registered, skipping");
            return;
        }
        tracing::debug!(handler = registration.type_name, "Registered handler");
        self.registrations.push(registration);
    }

    pub fn is_registered<H: Handler>(&self) -> bool {
        self.seen.contains(&TypeId::of::<H>())
    }

    pub fn iter(&self) -> impl Iterator<Item = &HandlerRegistration> {
        self.registrations.iter()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
