//! Reference stack for cycle diagnostics
//!
//! Every public lookup starts a fresh [`ReferenceStack`] and threads it
//! `&mut` through the recursive resolution calls. When a lookup reaches a
//! holder that is mid-resolution on the same call chain, the rendered stack
//! names every definition in flight, in order, so the offending cycle can be
//! read straight out of the error message.

use std::fmt::Write as _;

use crate::definition::ComponentDefinition;
use crate::key::TypeKey;

/// In-flight trace of the definitions currently being resolved.
///
/// Ephemeral and per call chain: it is created by the public lookup that
/// starts a resolution, not shared across threads or stored on the
/// container.
#[derive(Debug, Default)]
pub struct ReferenceStack {
    frames: Vec<Frame>,
}

#[derive(Debug)]
struct Frame {
    id: String,
    name: String,
    type_name: &'static str,
    lookup_type: Option<TypeKey>,
}

impl ReferenceStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a definition entering resolution
    pub fn push(&mut self, definition: &ComponentDefinition) {
        self.push_frame(definition, None);
    }

    /// Record a definition entering resolution through a by-type lookup
    pub fn push_for_type(&mut self, definition: &ComponentDefinition, lookup_type: TypeKey) {
        self.push_frame(definition, Some(lookup_type));
    }

    /// Drop the most recent frame
    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Number of frames currently in flight
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Render the stack for a cycle diagnostic
    pub fn render(&self) -> String {
        let mut out = String::from("\nReference stack is below.\n");
        for frame in &self.frames {
            let _ = write!(
                out,
                "\tid=[{}] name=[{}] component type=[{}]",
                frame.id, frame.name, frame.type_name
            );
            if let Some(lookup) = frame.lookup_type {
                let _ = write!(out, " lookup type=[{lookup}]");
            }
            out.push('\n');
        }
        out
    }

    fn push_frame(&mut self, definition: &ComponentDefinition, lookup_type: Option<TypeKey>) {
        self.frames.push(Frame {
            id: definition.id().to_string(),
            name: definition.name().unwrap_or("").to_string(),
            type_name: definition.type_key().name(),
            lookup_type,
        });
    }
}
