//! The whiteboard engine.
//!
//! Owns the replicated scene graph and the local tool state, turns pointer
//! events into scene mutations plus outbound messages, and applies inbound
//! messages. Every operation is keyed by a globally unique element id and
//! is idempotent, so no rebase queue is needed: the server relays events
//! without echoing them back to their sender.

use crate::geometry::{point_in_rect, segment_intersects_rect, segments_intersect};
use crate::protocol::BoardMessage;
use crate::whiteboard::path::{regular_polygon, Polyline};
use crate::whiteboard::scene::{Element, SceneGraph};
use crate::whiteboard::tools::{Modifiers, ToolKind, ToolManager, ToolState};
use kurbo::Point;
use uuid::Uuid;

/// How close (in drawing-area units) a click must land to a stroke to
/// select it.
const HIT_TOLERANCE: f64 = 6.0;

pub struct Whiteboard {
    scene: SceneGraph,
    tools: ToolManager,
    outgoing: Vec<BoardMessage>,
    read_only: bool,
    /// Per-client random component of generated element ids.
    id_nonce: String,
    next_id: u64,
}

impl Whiteboard {
    pub fn new(read_only: bool) -> Self {
        let mut nonce = Uuid::new_v4().simple().to_string();
        nonce.truncate(8);
        Self {
            scene: SceneGraph::new(),
            tools: ToolManager::new(),
            outgoing: Vec::new(),
            read_only,
            id_nonce: nonce,
            next_id: 0,
        }
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn selection(&self) -> &[String] {
        self.tools.selection()
    }

    pub fn current_tool(&self) -> ToolKind {
        self.tools.current
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tools.set_tool(tool);
    }

    /// Drain the outbound message queue.
    pub fn take_outgoing(&mut self) -> Vec<BoardMessage> {
        std::mem::take(&mut self.outgoing)
    }

    /// Generated ids are `draw-<nonce>-<counter>`: unique across clients by
    /// the nonce, within a client by the counter.
    fn next_element_id(&mut self) -> String {
        let id = format!("draw-{}-{}", self.id_nonce, self.next_id);
        self.next_id += 1;
        id
    }

    // --- Inbound events ---

    pub fn handle_message(&mut self, msg: BoardMessage) {
        match msg {
            BoardMessage::Draw { id, d } => self.scene.draw(&id, &d),
            BoardMessage::Remove { id } => {
                self.scene.remove(&id);
                self.tools.deselect(&id);
            }
            BoardMessage::Edit { id, d } => self.scene.edit(&id, &d),
            BoardMessage::Group { group_id, children } => {
                self.scene.group(&group_id, &children);
            }
            BoardMessage::Ungroup { group_id } => self.scene.ungroup(&group_id),
        }
    }

    // --- Pointer events (drawing-area coordinates) ---

    pub fn pointer_down(&mut self, position: Point, modifiers: Modifiers) {
        match self.tools.current {
            ToolKind::Pen => {
                if self.read_only {
                    return;
                }
                self.tools.state = ToolState::Drawing {
                    points: vec![position],
                };
            }
            ToolKind::Shape(_) => {
                if self.read_only {
                    return;
                }
                self.tools.state = ToolState::ShapeDrag {
                    start: position,
                    current: position,
                };
            }
            ToolKind::Eraser => {
                if self.read_only {
                    return;
                }
                self.tools.state = ToolState::Erasing { last: position };
            }
            ToolKind::Selector => {
                match self.hit_top_level(position) {
                    Some(id) => {
                        if modifiers.toggles_selection() {
                            self.tools.toggle(&id);
                        } else {
                            self.tools.select(&id);
                        }
                    }
                    None => self.tools.clear_selection(),
                }
                self.tools.state = ToolState::Moving {
                    last: position,
                    changed: Vec::new(),
                };
            }
        }
    }

    pub fn pointer_move(&mut self, position: Point) {
        match std::mem::take(&mut self.tools.state) {
            ToolState::Idle => {}
            ToolState::Drawing { mut points } => {
                points.push(position);
                self.tools.state = ToolState::Drawing { points };
            }
            ToolState::ShapeDrag { start, .. } => {
                self.tools.state = ToolState::ShapeDrag {
                    start,
                    current: position,
                };
            }
            ToolState::Erasing { last } => {
                self.erase_stroke(last, position);
                self.tools.state = ToolState::Erasing { last: position };
            }
            ToolState::Moving { last, mut changed } => {
                let delta = position - last;
                if !self.read_only && (delta.x != 0.0 || delta.y != 0.0) {
                    for id in self.tools.selection().to_vec() {
                        for path_id in self.scene.translate(&id, delta) {
                            if !changed.contains(&path_id) {
                                changed.push(path_id);
                            }
                        }
                    }
                }
                self.tools.state = ToolState::Moving {
                    last: position,
                    changed,
                };
            }
        }
    }

    pub fn pointer_up(&mut self, position: Point) {
        let state = std::mem::take(&mut self.tools.state);
        match state {
            ToolState::Idle | ToolState::Erasing { .. } => {}
            ToolState::Drawing { points } => {
                if points.is_empty() {
                    return;
                }
                let id = self.next_element_id();
                let d = Polyline::from_points(points).format();
                self.scene.draw(&id, &d);
                self.outgoing.push(BoardMessage::Draw { id, d });
            }
            ToolState::ShapeDrag { start, .. } => {
                let ToolKind::Shape(sides) = self.tools.current else {
                    return;
                };
                let id = self.next_element_id();
                let d = regular_polygon(sides, start, position).format();
                self.scene.draw(&id, &d);
                self.outgoing.push(BoardMessage::Draw { id, d });
            }
            ToolState::Moving { changed, .. } => {
                for id in changed {
                    if let Some(Element::Path { d }) = self.scene.get(&id) {
                        self.outgoing.push(BoardMessage::Edit {
                            id: id.clone(),
                            d: d.clone(),
                        });
                    }
                }
            }
        }
    }

    /// The in-flight stroke or shape, for rendering before pointer-up
    /// commits it.
    pub fn preview(&self) -> Option<Polyline> {
        match &self.tools.state {
            ToolState::Drawing { points } => Some(Polyline::from_points(points.clone())),
            ToolState::ShapeDrag { start, current } => match self.tools.current {
                ToolKind::Shape(sides) => Some(regular_polygon(sides, *start, *current)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Group the selection (two or more elements), or dissolve it when it
    /// is a single group.
    pub fn group_or_ungroup(&mut self) {
        if self.read_only {
            return;
        }
        let selection = self.tools.selection().to_vec();
        if selection.len() >= 2 {
            // Children keep their z-order, not the click order.
            let children: Vec<String> = self
                .scene
                .top_level()
                .iter()
                .filter(|id| selection.contains(id))
                .cloned()
                .collect();
            if children.len() < 2 {
                return;
            }
            let group_id = self.next_element_id();
            self.scene.group(&group_id, &children);
            self.outgoing.push(BoardMessage::Group {
                group_id: group_id.clone(),
                children,
            });
            self.tools.set_selection(vec![group_id]);
        } else if selection.len() == 1 {
            let id = &selection[0];
            if let Some(Element::Group { children }) = self.scene.get(id) {
                let children = children.clone();
                self.scene.ungroup(id);
                self.outgoing.push(BoardMessage::Ungroup {
                    group_id: id.clone(),
                });
                self.tools.set_selection(children);
            }
        }
    }

    /// Front-most top-level element within click tolerance of the point.
    fn hit_top_level(&self, position: Point) -> Option<String> {
        self.scene
            .top_level()
            .iter()
            .rev()
            .find(|id| {
                self.scene
                    .distance_to(id, position)
                    .is_some_and(|d| d <= HIT_TOLERANCE)
            })
            .cloned()
    }

    /// Erase every top-level element one of whose path segments crosses
    /// the eraser segment. The bounding box test prunes the candidates.
    fn erase_stroke(&mut self, from: Point, to: Point) {
        for id in self.scene.top_level().to_vec() {
            let Some(bounds) = self.scene.bounds_of(&id) else {
                continue;
            };
            let tl = Point::new(bounds.x0, bounds.y0);
            let br = Point::new(bounds.x1, bounds.y1);
            if !segment_intersects_rect(from, to, tl, br) && !point_in_rect(to, tl, br) {
                continue;
            }

            let hit = self.scene.path_ids_in(&id).iter().any(|path_id| {
                match self.scene.get(path_id) {
                    Some(Element::Path { d }) => Polyline::parse(d)
                        .map(|path| path.segments().any(|(a, b)| segments_intersect(from, to, a, b)))
                        .unwrap_or(false),
                    _ => false,
                }
            });
            if hit {
                self.scene.remove(&id);
                self.tools.deselect(&id);
                self.outgoing.push(BoardMessage::Remove { id });
            }
        }
    }
}
