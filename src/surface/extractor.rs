use tracing::debug;

use crate::agent::error::ExtractError;
use crate::plan::plan_model::{Element, Snapshot};
use crate::surface::surface_model::{Surface, SurfaceElement};

/// Element id sent for nodes that carry no identifier.
pub const NO_ID: &str = "no_id";

/// App label used when neither the surface nor the configuration provides one.
pub const UNKNOWN_APP: &str = "UnknownApp";

/// Describe one node. Missing text stays `None`; an empty label stays `Some("")`.
pub fn element_from_node(node: &SurfaceElement) -> Element {
    let id = node.id();
    Element {
        element_id: id.clone().unwrap_or_else(|| NO_ID.to_string()),
        text: node.text(),
        description: node.description(),
        resource_id: id,
    }
}

/// Snapshot of the root's immediate children, in child order.
///
/// Grandchildren are not visited; the payload stays bounded by the width of
/// the top level.
pub fn extract_snapshot(root: &SurfaceElement, app_name: &str) -> Snapshot {
    let elements: Vec<Element> = root.children().iter().map(element_from_node).collect();

    Snapshot {
        app_name: app_name.to_string(),
        elements,
    }
}

/// Read the current surface. Returns the live root alongside the snapshot so
/// the plan answering this snapshot is applied to the same tree.
pub fn extract(
    surface: &dyn Surface,
    configured_app_name: Option<&str>,
) -> Result<(SurfaceElement, Snapshot), ExtractError> {
    let root = surface.root().ok_or(ExtractError::RootUnavailable)?;

    let app_name = surface
        .app_name()
        .or_else(|| configured_app_name.map(str::to_string))
        .unwrap_or_else(|| UNKNOWN_APP.to_string());

    let snapshot = extract_snapshot(&root, &app_name);
    debug!(
        app = %snapshot.app_name,
        elements = snapshot.elements.len(),
        "extracted surface snapshot"
    );

    Ok((root, snapshot))
}
