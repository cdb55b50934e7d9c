//! Styled-range table.
//!
//! A property is either flagless (one set of ranges) or flagged (ranges
//! keyed by a parameter string, e.g. an alignment direction). The shape is
//! fixed by the first application; within one (property, flag) the stored
//! spans are disjoint and non-empty.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A half-open char range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn covers(&self, start: usize, end: usize) -> bool {
        self.start <= start && end <= self.end
    }
}

/// One property's ranges, flagless or keyed by flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Property {
    Basic(Vec<Span>),
    Flagged(BTreeMap<String, Vec<Span>>),
}

/// All properties on a document, keyed by name. Ordered storage keeps
/// rendering and replica comparison deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyTable {
    properties: BTreeMap<String, Property>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn get(&self, property: &str) -> Option<&Property> {
        self.properties.get(property)
    }

    pub fn clear(&mut self) {
        self.properties.clear();
    }

    /// Every (property, flag, span) triple, in deterministic order.
    pub fn iter_spans(&self) -> impl Iterator<Item = (&str, Option<&str>, Span)> {
        self.properties.iter().flat_map(|(name, prop)| {
            let spans: Vec<(&str, Option<&str>, Span)> = match prop {
                Property::Basic(spans) => spans
                    .iter()
                    .map(|s| (name.as_str(), None, *s))
                    .collect(),
                Property::Flagged(buckets) => buckets
                    .iter()
                    .flat_map(|(flag, spans)| {
                        spans.iter().map(move |s| (name.as_str(), Some(flag.as_str()), *s))
                    })
                    .collect(),
            };
            spans
        })
    }

    /// True if a single existing span of (property, flag) fully covers
    /// `[start, end)`. Drives the add/remove decision in toggling.
    pub fn is_covered(&self, start: usize, end: usize, property: &str, flag: Option<&str>) -> bool {
        let spans = match (self.properties.get(property), flag) {
            (Some(Property::Basic(spans)), None) => spans,
            (Some(Property::Flagged(buckets)), Some(flag)) => match buckets.get(flag) {
                Some(spans) => spans,
                None => return false,
            },
            _ => return false,
        };
        spans.iter().any(|s| s.covers(start, end))
    }

    /// Apply `[start, end)` for (property, flag).
    ///
    /// Overlapping spans of the same property are cleared first, then the
    /// new span is merged with any span it touches. A flag mismatch with
    /// the property's established shape rejects the write.
    pub fn add(&mut self, start: usize, end: usize, property: &str, flag: Option<&str>) {
        if start >= end {
            return;
        }

        // A flag mismatch with the established shape rejects the write
        // before anything is touched; a dropped write must not disturb the
        // spans it overlapped.
        match (self.properties.get(property), flag) {
            (Some(Property::Basic(_)), Some(_)) => {
                log::warn!("dropping flagged write to flagless property {property}");
                return;
            }
            (Some(Property::Flagged(_)), None) => {
                log::warn!("dropping flagless write to flagged property {property}");
                return;
            }
            _ => {}
        }

        if self.properties.contains_key(property) {
            self.remove(start, end, property);
        }

        match self.properties.get_mut(property) {
            None => {
                let prop = match flag {
                    Some(flag) => {
                        let mut buckets = BTreeMap::new();
                        buckets.insert(flag.to_string(), vec![Span::new(start, end)]);
                        Property::Flagged(buckets)
                    }
                    None => Property::Basic(vec![Span::new(start, end)]),
                };
                self.properties.insert(property.to_string(), prop);
            }
            Some(Property::Basic(spans)) => merge_span(spans, start, end),
            Some(Property::Flagged(buckets)) => {
                let Some(flag) = flag else { return };
                let spans = buckets.entry(flag.to_string()).or_default();
                merge_span(spans, start, end);
            }
        }
    }

    /// Clear `[start, end)` from every flag bucket of `property`, splitting
    /// spans that straddle the boundary.
    pub fn remove(&mut self, start: usize, end: usize, property: &str) {
        let Some(prop) = self.properties.get_mut(property) else {
            return;
        };
        match prop {
            Property::Basic(spans) => *spans = cut_overlaps(spans, start, end),
            Property::Flagged(buckets) => {
                for spans in buckets.values_mut() {
                    *spans = cut_overlaps(spans, start, end);
                }
            }
        }
        self.prune();
    }

    /// Shift every span endpoint through `shift`.
    pub fn shift_positions(&mut self, shift: impl Fn(usize) -> usize) {
        for prop in self.properties.values_mut() {
            match prop {
                Property::Basic(spans) => {
                    for span in spans.iter_mut() {
                        span.start = shift(span.start);
                        span.end = shift(span.end);
                    }
                }
                Property::Flagged(buckets) => {
                    for spans in buckets.values_mut() {
                        for span in spans.iter_mut() {
                            span.start = shift(span.start);
                            span.end = shift(span.end);
                        }
                    }
                }
            }
        }
    }

    /// Drop empty spans, empty flag buckets and empty properties.
    pub fn prune(&mut self) {
        for prop in self.properties.values_mut() {
            match prop {
                Property::Basic(spans) => spans.retain(|s| !s.is_empty()),
                Property::Flagged(buckets) => {
                    for spans in buckets.values_mut() {
                        spans.retain(|s| !s.is_empty());
                    }
                    buckets.retain(|_, spans| !spans.is_empty());
                }
            }
        }
        self.properties.retain(|_, prop| match prop {
            Property::Basic(spans) => !spans.is_empty(),
            Property::Flagged(buckets) => !buckets.is_empty(),
        });
    }
}

/// Add `[start, end)` into `spans`, extending a span that ends at `start`
/// or begins at `end` instead of pushing a new one.
fn merge_span(spans: &mut Vec<Span>, start: usize, end: usize) {
    for span in spans.iter_mut() {
        if span.end == start {
            span.end = end;
            return;
        }
        if span.start == end {
            span.start = start;
            return;
        }
    }
    spans.push(Span::new(start, end));
}

/// Remove `[start, end)` from each span, keeping the parts outside it.
fn cut_overlaps(spans: &[Span], start: usize, end: usize) -> Vec<Span> {
    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        let left = Span::new(span.start, span.end.min(start));
        let right = Span::new(span.start.max(end), span.end);
        if !left.is_empty() {
            out.push(left);
        }
        if !right.is_empty() {
            out.push(right);
        }
    }
    out
}
