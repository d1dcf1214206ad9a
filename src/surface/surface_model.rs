use std::fmt::Debug;
use std::sync::Arc;

use crate::agent::error::SurfaceError;

/// Platform side of one live node in the surface tree.
///
/// Implementations answer from the live tree on every call; nothing here is
/// expected to be cached between calls.
pub trait SurfaceElementImpl: Send + Sync + Debug {
    /// Identifier used to address the node from a plan (view id, automation id, ...).
    fn id(&self) -> Option<String>;
    fn text(&self) -> Option<String>;
    fn description(&self) -> Option<String>;
    fn children(&self) -> Vec<SurfaceElement>;

    /// Primitive "activate" (click / tap).
    fn activate(&self) -> Result<(), SurfaceError>;

    /// Primitive "set text" with the text passed as the action argument.
    fn set_text(&self, text: &str) -> Result<(), SurfaceError>;

    /// Native lookup by identifier over this subtree, self included.
    /// Returning `None` makes the caller fall back to a tree walk.
    fn find_by_id(&self, _id: &str) -> Option<Vec<SurfaceElement>> {
        None
    }
}

/// Cheap, cloneable handle to a live surface node.
#[derive(Clone, Debug)]
pub struct SurfaceElement {
    inner: Arc<dyn SurfaceElementImpl>,
}

impl SurfaceElement {
    pub fn new(inner: Arc<dyn SurfaceElementImpl>) -> Self {
        Self { inner }
    }

    pub fn id(&self) -> Option<String> {
        self.inner.id()
    }

    pub fn text(&self) -> Option<String> {
        self.inner.text()
    }

    pub fn description(&self) -> Option<String> {
        self.inner.description()
    }

    pub fn children(&self) -> Vec<SurfaceElement> {
        self.inner.children()
    }

    pub fn activate(&self) -> Result<(), SurfaceError> {
        self.inner.activate()
    }

    pub fn set_text(&self, text: &str) -> Result<(), SurfaceError> {
        self.inner.set_text(text)
    }

    /// Every element in this subtree (self included) whose identifier is `id`,
    /// in pre-order. Identifiers are not unique, so this may return many nodes.
    pub fn find_by_id(&self, id: &str) -> Vec<SurfaceElement> {
        if let Some(found) = self.inner.find_by_id(id) {
            return found;
        }

        let mut matches = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(element) = stack.pop() {
            if element.id().as_deref() == Some(id) {
                matches.push(element.clone());
            }
            stack.extend(element.children().into_iter().rev());
        }
        matches
    }
}

/// The triggering collaborator's view of the current surface.
pub trait Surface: Send + Sync {
    /// Root of the surface currently shown, if any.
    fn root(&self) -> Option<SurfaceElement>;

    /// Best-effort label for the application owning the surface.
    fn app_name(&self) -> Option<String> {
        None
    }
}
