//! The whiteboard scene graph.
//!
//! A flat id-indexed element map plus an ordered list of top-level ids.
//! Groups hold child id lists; parents are derived on demand, so there are
//! no cycles and no back references. Every operation is idempotent and
//! tolerates unknown ids (benign races with remote cleanup).

use crate::whiteboard::path::Polyline;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A scene element: a stroked polyline or a group of other elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    Path { d: String },
    Group { children: Vec<String> },
}

/// All elements of a drawing, keyed by their globally unique id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneGraph {
    elements: HashMap<String, Element>,
    /// Ids of root elements, back to front.
    top_level: Vec<String>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Root element ids, back to front.
    pub fn top_level(&self) -> &[String] {
        &self.top_level
    }

    /// Add a new path element. Ignored if the id already exists.
    pub fn draw(&mut self, id: &str, d: &str) {
        if self.elements.contains_key(id) {
            return;
        }
        self.elements
            .insert(id.to_string(), Element::Path { d: d.to_string() });
        self.top_level.push(id.to_string());
    }

    /// Remove an element and, for groups, every descendant. Ignored if the
    /// id is unknown.
    pub fn remove(&mut self, id: &str) {
        if !self.elements.contains_key(id) {
            return;
        }
        self.top_level.retain(|t| t != id);
        // The element may be a grouped child removed out from under its
        // parent; keep the parent's child list consistent.
        for element in self.elements.values_mut() {
            if let Element::Group { children } = element {
                children.retain(|c| c != id);
            }
        }
        self.remove_recursive(id);
    }

    fn remove_recursive(&mut self, id: &str) {
        if let Some(Element::Group { children }) = self.elements.remove(id) {
            for child in children {
                self.remove_recursive(&child);
            }
        }
    }

    /// Replace a path's vertex list. Ignored for unknown ids and groups.
    pub fn edit(&mut self, id: &str, d: &str) {
        match self.elements.get_mut(id) {
            Some(Element::Path { d: existing }) => *existing = d.to_string(),
            _ => log::debug!("edit of unknown path {id} ignored"),
        }
    }

    /// Collect existing top-level elements into a new group, which joins
    /// the top level in their place. Ignored if the group id already
    /// exists; children that are unknown or already inside another group
    /// are skipped, so no element ever has two parents.
    pub fn group(&mut self, group_id: &str, children: &[String]) {
        if self.elements.contains_key(group_id) {
            return;
        }
        let members: Vec<String> = children
            .iter()
            .filter(|id| self.top_level.contains(*id))
            .cloned()
            .collect();
        self.top_level.retain(|id| !members.contains(id));
        self.elements
            .insert(group_id.to_string(), Element::Group { children: members });
        self.top_level.push(group_id.to_string());
    }

    /// Dissolve a group: its children rejoin the top level in order and
    /// the empty group disappears. Ignored for unknown ids and paths.
    pub fn ungroup(&mut self, group_id: &str) {
        let children = match self.elements.get(group_id) {
            Some(Element::Group { children }) => children.clone(),
            _ => return,
        };
        self.top_level.retain(|id| id != group_id);
        self.top_level.extend(children);
        self.elements.remove(group_id);
    }

    /// Ids of every path inside the element, depth first.
    pub fn path_ids_in(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_path_ids(id, &mut out);
        out
    }

    fn collect_path_ids(&self, id: &str, out: &mut Vec<String>) {
        match self.elements.get(id) {
            Some(Element::Path { .. }) => out.push(id.to_string()),
            Some(Element::Group { children }) => {
                for child in children {
                    self.collect_path_ids(child, out);
                }
            }
            None => {}
        }
    }

    /// Bounding box of an element, unioned over its paths.
    pub fn bounds_of(&self, id: &str) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        for path_id in self.path_ids_in(id) {
            if let Some(Element::Path { d }) = self.elements.get(&path_id) {
                if let Some(rect) = Polyline::parse(d).and_then(|p| p.bounds()) {
                    bounds = Some(match bounds {
                        Some(b) => b.union(rect),
                        None => rect,
                    });
                }
            }
        }
        bounds
    }

    /// Translate every path inside the element, returning the ids whose
    /// vertex lists changed.
    pub fn translate(&mut self, id: &str, delta: Vec2) -> Vec<String> {
        let mut changed = Vec::new();
        for path_id in self.path_ids_in(id) {
            if let Some(Element::Path { d }) = self.elements.get_mut(&path_id) {
                if let Some(mut path) = Polyline::parse(d) {
                    path.translate(delta);
                    *d = path.format();
                    changed.push(path_id);
                }
            }
        }
        changed
    }

    /// Minimum distance from a point to any path of the element.
    pub fn distance_to(&self, id: &str, point: Point) -> Option<f64> {
        let mut best: Option<f64> = None;
        for path_id in self.path_ids_in(id) {
            if let Some(Element::Path { d }) = self.elements.get(&path_id) {
                if let Some(path) = Polyline::parse(d) {
                    let dist = crate::geometry::point_to_polyline_dist(point, &path.points);
                    best = Some(match best {
                        Some(b) => b.min(dist),
                        None => dist,
                    });
                }
            }
        }
        best
    }

    /// Serialize the whole scene to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore a scene from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
