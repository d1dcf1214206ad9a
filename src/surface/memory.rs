use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use serde::{Deserialize, Serialize};

use crate::agent::error::SurfaceError;
use crate::surface::surface_model::{Surface, SurfaceElement, SurfaceElementImpl};

// ============================================================================
// Fixture model (YAML / JSON)
// ============================================================================

/// Declarative description of one node of an in-memory surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,

    /// Activating this node replaces the root's children with these nodes,
    /// the way a button press swaps in the next screen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_activate: Option<Vec<NodeSpec>>,
}

fn default_true() -> bool {
    true
}

impl Default for NodeSpec {
    fn default() -> Self {
        Self {
            id: None,
            text: None,
            description: None,
            enabled: true,
            children: vec![],
            on_activate: None,
        }
    }
}

impl NodeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::default()
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn on_activate(mut self, next: Vec<NodeSpec>) -> Self {
        self.on_activate = Some(next);
        self
    }
}

/// Top-level fixture file: an optional app label and an optional root.
/// A fixture without a root models a surface with nothing on screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceFixture {
    #[serde(default)]
    pub app_name: Option<String>,

    #[serde(default)]
    pub root: Option<NodeSpec>,
}

// ============================================================================
// Recorded primitive calls
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "primitive", content = "payload", rename_all = "snake_case")]
pub enum Primitive {
    Activate,
    SetText(String),
}

/// One primitive operation that reached a live node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimitiveCall {
    /// Pre-order build index, unique per surface.
    pub serial: usize,
    pub element_id: Option<String>,
    #[serde(flatten)]
    pub primitive: Primitive,
}

// ============================================================================
// Live in-memory tree
// ============================================================================

#[derive(Debug, Default)]
struct Shared {
    root: RwLock<Option<Arc<MemoryNode>>>,
    calls: Mutex<Vec<PrimitiveCall>>,
    next_serial: AtomicUsize,
}

#[derive(Debug)]
struct MemoryNode {
    serial: usize,
    id: Option<String>,
    text: Mutex<Option<String>>,
    description: Option<String>,
    enabled: bool,
    attached: AtomicBool,
    on_activate: Option<Vec<NodeSpec>>,
    children: Mutex<Vec<Arc<MemoryNode>>>,
    shared: Weak<Shared>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn build(spec: &NodeSpec, shared: &Arc<Shared>) -> Arc<MemoryNode> {
    let serial = shared.next_serial.fetch_add(1, Ordering::SeqCst);
    let children = spec.children.iter().map(|c| build(c, shared)).collect();

    Arc::new(MemoryNode {
        serial,
        id: spec.id.clone(),
        text: Mutex::new(spec.text.clone()),
        description: spec.description.clone(),
        enabled: spec.enabled,
        attached: AtomicBool::new(true),
        on_activate: spec.on_activate.clone(),
        children: Mutex::new(children),
        shared: Arc::downgrade(shared),
    })
}

fn detach(node: &MemoryNode) {
    node.attached.store(false, Ordering::SeqCst);
    for child in lock(&node.children).iter() {
        detach(child);
    }
}

impl Shared {
    fn current_root(&self) -> Option<Arc<MemoryNode>> {
        self.root
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_root_children(self: &Arc<Self>, specs: &[NodeSpec]) {
        let Some(root) = self.current_root() else {
            return;
        };
        let fresh: Vec<_> = specs.iter().map(|s| build(s, self)).collect();
        let old = std::mem::replace(&mut *lock(&root.children), fresh);
        for node in &old {
            detach(node);
        }
    }

    fn record(&self, node: &MemoryNode, primitive: Primitive) {
        lock(&self.calls).push(PrimitiveCall {
            serial: node.serial,
            element_id: node.id.clone(),
            primitive,
        });
    }
}

impl MemoryNode {
    fn label(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("#{}", self.serial))
    }

    fn ensure_usable(&self) -> Result<Arc<Shared>, SurfaceError> {
        let shared = self
            .shared
            .upgrade()
            .ok_or_else(|| SurfaceError::Detached(self.label()))?;
        if !self.attached.load(Ordering::SeqCst) {
            return Err(SurfaceError::Detached(self.label()));
        }
        if !self.enabled {
            return Err(SurfaceError::NotEnabled(self.label()));
        }
        Ok(shared)
    }
}

impl SurfaceElementImpl for MemoryNode {
    fn id(&self) -> Option<String> {
        self.id.clone()
    }

    fn text(&self) -> Option<String> {
        lock(&self.text).clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn children(&self) -> Vec<SurfaceElement> {
        lock(&self.children)
            .iter()
            .map(|child| SurfaceElement::new(child.clone()))
            .collect()
    }

    fn activate(&self) -> Result<(), SurfaceError> {
        let shared = self.ensure_usable()?;
        shared.record(self, Primitive::Activate);
        if let Some(next) = &self.on_activate {
            shared.replace_root_children(next);
        }
        Ok(())
    }

    fn set_text(&self, text: &str) -> Result<(), SurfaceError> {
        let shared = self.ensure_usable()?;
        *lock(&self.text) = Some(text.to_string());
        shared.record(self, Primitive::SetText(text.to_string()));
        Ok(())
    }
}

/// Surface backed by an in-memory tree that records every primitive call.
///
/// Used as the triggering collaborator by the CLI and the tests.
#[derive(Debug)]
pub struct MemorySurface {
    shared: Arc<Shared>,
    app_name: Option<String>,
}

impl MemorySurface {
    pub fn new(fixture: SurfaceFixture) -> Self {
        let surface = Self {
            shared: Arc::new(Shared::default()),
            app_name: fixture.app_name,
        };
        surface.set_root(fixture.root);
        surface
    }

    pub fn from_root(root: NodeSpec) -> Self {
        Self::new(SurfaceFixture {
            app_name: None,
            root: Some(root),
        })
    }

    /// A surface with nothing on screen.
    pub fn without_root() -> Self {
        Self::new(SurfaceFixture::default())
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        let fixture: SurfaceFixture = serde_yaml::from_str(content)?;
        Ok(Self::new(fixture))
    }

    /// Swap the whole tree. Handles into the old tree become detached.
    pub fn set_root(&self, root: Option<NodeSpec>) {
        let fresh = root.map(|spec| build(&spec, &self.shared));
        let old = std::mem::replace(
            &mut *self.shared.root.write().unwrap_or_else(PoisonError::into_inner),
            fresh,
        );
        if let Some(old) = old {
            detach(&old);
        }
    }

    /// Replace the root's children, keeping the root itself.
    pub fn replace_children(&self, children: Vec<NodeSpec>) {
        self.shared.replace_root_children(&children);
    }

    /// Primitive calls recorded so far, in the order they happened.
    pub fn calls(&self) -> Vec<PrimitiveCall> {
        lock(&self.shared.calls).clone()
    }

    /// Current text of every live node with the given identifier.
    pub fn texts_of(&self, id: &str) -> Vec<Option<String>> {
        self.root()
            .map(|root| root.find_by_id(id).iter().map(|e| e.text()).collect())
            .unwrap_or_default()
    }
}

impl Surface for MemorySurface {
    fn root(&self) -> Option<SurfaceElement> {
        self.shared
            .current_root()
            .map(|node| SurfaceElement::new(node))
    }

    fn app_name(&self) -> Option<String> {
        self.app_name.clone()
    }
}
