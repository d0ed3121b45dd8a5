#![deny(missing_docs)]

//! # Diff Calculation
//!
//! Compares a baseline document against a working document and emits an ordered
//! list of [`ChangeRecord`]s covering paths, operations and named schemas.
//!
//! Every level is compared the same way: key-set difference first, then a
//! recursive comparison of the shared keys. Keys are walked in the working
//! document's order, followed by keys that only exist in the baseline; HTTP
//! methods always use the canonical [`Method`] order. The output is therefore
//! deterministic for a given pair of documents.

use crate::oas::models::{DocumentModel, Method, Operation, Parameter, PathItem, Payload};
use crate::oas::resolver::resolve;
use crate::oas::schemas::{RefToken, SchemaNode};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display};
use std::hash::Hash;

/// Whether something appeared, disappeared or changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Present only in the working revision.
    Added,
    /// Present only in the baseline revision.
    Removed,
    /// Present in both, with different content.
    Modified,
}

impl Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::Modified => "modified",
        })
    }
}

/// What exactly changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeDetail {
    /// A path was added.
    PathAdded,
    /// A path was removed.
    PathRemoved,
    /// A method was added to a path.
    OperationAdded,
    /// A method was removed from a path.
    OperationRemoved,
    /// `operationId` changed.
    OperationIdChanged,
    /// A parameter was added.
    ParameterAdded,
    /// A parameter was removed.
    ParameterRemoved,
    /// A parameter's location, required flag or schema changed.
    ParameterChanged,
    /// A request body was added.
    RequestBodyAdded,
    /// A request body was removed.
    RequestBodyRemoved,
    /// A response status code was added.
    ResponseAdded,
    /// A response status code was removed.
    ResponseRemoved,
    /// A media type was added to a body or response.
    ContentAdded,
    /// A media type was removed from a body or response.
    ContentRemoved,
    /// A named schema was added.
    SchemaAdded,
    /// A named schema was removed.
    SchemaRemoved,
    /// A primitive's type or format changed.
    TypeChanged,
    /// An object gained a property.
    PropertyAdded,
    /// An object lost a property.
    PropertyRemoved,
    /// A property became required.
    RequiredAdded,
    /// A property stopped being required.
    RequiredRemoved,
    /// A composite's branches changed.
    VariantBranchesChanged,
    /// The schema variant (or composite combinator) changed.
    KindChanged,
    /// A reference that cannot be resolved now points elsewhere.
    ReferenceChanged,
    /// An unmodelled schema changed.
    OpaqueChanged,
}

impl ChangeDetail {
    /// The kebab-case tag, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeDetail::PathAdded => "path-added",
            ChangeDetail::PathRemoved => "path-removed",
            ChangeDetail::OperationAdded => "operation-added",
            ChangeDetail::OperationRemoved => "operation-removed",
            ChangeDetail::OperationIdChanged => "operation-id-changed",
            ChangeDetail::ParameterAdded => "parameter-added",
            ChangeDetail::ParameterRemoved => "parameter-removed",
            ChangeDetail::ParameterChanged => "parameter-changed",
            ChangeDetail::RequestBodyAdded => "request-body-added",
            ChangeDetail::RequestBodyRemoved => "request-body-removed",
            ChangeDetail::ResponseAdded => "response-added",
            ChangeDetail::ResponseRemoved => "response-removed",
            ChangeDetail::ContentAdded => "content-added",
            ChangeDetail::ContentRemoved => "content-removed",
            ChangeDetail::SchemaAdded => "schema-added",
            ChangeDetail::SchemaRemoved => "schema-removed",
            ChangeDetail::TypeChanged => "type-changed",
            ChangeDetail::PropertyAdded => "property-added",
            ChangeDetail::PropertyRemoved => "property-removed",
            ChangeDetail::RequiredAdded => "required-added",
            ChangeDetail::RequiredRemoved => "required-removed",
            ChangeDetail::VariantBranchesChanged => "variant-branches-changed",
            ChangeDetail::KindChanged => "kind-changed",
            ChangeDetail::ReferenceChanged => "reference-changed",
            ChangeDetail::OpaqueChanged => "opaque-changed",
        }
    }
}

impl Display for ChangeDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural difference between two revisions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    /// Added, removed or modified.
    pub kind: ChangeKind,
    /// Structural path, e.g. `["paths", "/pets", "get", "responses", "200"]`.
    pub location: Vec<String>,
    /// Snapshot from the baseline revision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    /// Snapshot from the working revision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
    /// Sub-kind tag.
    pub detail: ChangeDetail,
}

impl ChangeRecord {
    /// The location rendered as a JSON Pointer (`/paths/~1pets/get`).
    pub fn pointer(&self) -> String {
        self.location
            .iter()
            .map(|seg| format!("/{}", seg.replace('~', "~0").replace('/', "~1")))
            .collect()
    }

    /// Whether the location starts with `prefix`.
    pub fn is_under(&self, prefix: &[&str]) -> bool {
        self.location.len() >= prefix.len()
            && self.location.iter().zip(prefix).all(|(seg, p)| seg == p)
    }
}

impl Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.pointer(), self.detail)
    }
}

/// Calculates the ordered change list between `baseline` and `working`.
///
/// Paths first, then named schemas. Reference resolution failures never abort
/// the diff; they surface as `reference-changed` records where they matter.
pub fn diff(baseline: &DocumentModel, working: &DocumentModel) -> Vec<ChangeRecord> {
    let mut engine = DiffEngine {
        baseline,
        working,
        records: Vec::new(),
    };
    engine.paths();
    engine.schemas();
    engine.records
}

/// Compares two schemas, resolving references against their own revision.
///
/// Records are located under `location`.
pub fn compare_schemas(
    baseline: &DocumentModel,
    working: &DocumentModel,
    location: &[String],
    before: &SchemaNode,
    after: &SchemaNode,
) -> Vec<ChangeRecord> {
    let mut cmp = SchemaComparison::new(baseline, working);
    cmp.compare(location, before, after);
    cmp.records
}

/// Membership of one key across the two revisions.
enum Pair<'a, V> {
    Added(&'a V),
    Removed(&'a V),
    Both(&'a V, &'a V),
}

/// Working keys in order, then baseline-only keys in order.
fn key_pairs<'a, K, V>(
    baseline: &'a IndexMap<K, V>,
    working: &'a IndexMap<K, V>,
) -> Vec<(&'a K, Pair<'a, V>)>
where
    K: Hash + Eq,
{
    let mut out: Vec<(&K, Pair<V>)> = working
        .iter()
        .map(|(key, after)| match baseline.get(key) {
            Some(before) => (key, Pair::Both(before, after)),
            None => (key, Pair::Added(after)),
        })
        .collect();
    out.extend(
        baseline
            .iter()
            .filter(|(key, _)| !working.contains_key(*key))
            .map(|(key, before)| (key, Pair::Removed(before))),
    );
    out
}

fn at(location: &[String], segment: impl Into<String>) -> Vec<String> {
    let mut out = location.to_vec();
    out.push(segment.into());
    out
}

fn snapshot<T: Serialize + ?Sized>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}

fn record(
    kind: ChangeKind,
    location: Vec<String>,
    before: Option<Value>,
    after: Option<Value>,
    detail: ChangeDetail,
) -> ChangeRecord {
    ChangeRecord {
        kind,
        location,
        before,
        after,
        detail,
    }
}

struct DiffEngine<'a> {
    baseline: &'a DocumentModel,
    working: &'a DocumentModel,
    records: Vec<ChangeRecord>,
}

impl<'a> DiffEngine<'a> {
    fn push(
        &mut self,
        kind: ChangeKind,
        location: Vec<String>,
        before: Option<Value>,
        after: Option<Value>,
        detail: ChangeDetail,
    ) {
        self.records.push(record(kind, location, before, after, detail));
    }

    fn paths(&mut self) {
        let (baseline, working) = (self.baseline, self.working);
        for (path, pair) in key_pairs(&baseline.paths, &working.paths) {
            let loc = vec!["paths".to_string(), path.clone()];
            match pair {
                Pair::Added(item) => {
                    self.push(ChangeKind::Added, loc, None, snapshot(item), ChangeDetail::PathAdded)
                }
                Pair::Removed(item) => self.push(
                    ChangeKind::Removed,
                    loc,
                    snapshot(item),
                    None,
                    ChangeDetail::PathRemoved,
                ),
                Pair::Both(before, after) => self.path_item(&loc, before, after),
            }
        }
    }

    fn path_item(&mut self, loc: &[String], before: &PathItem, after: &PathItem) {
        for method in Method::ALL {
            let loc = at(loc, method.as_str());
            match (before.operations.get(&method), after.operations.get(&method)) {
                (None, None) => {}
                (None, Some(op)) => self.push(
                    ChangeKind::Added,
                    loc,
                    None,
                    snapshot(op),
                    ChangeDetail::OperationAdded,
                ),
                (Some(op), None) => self.push(
                    ChangeKind::Removed,
                    loc,
                    snapshot(op),
                    None,
                    ChangeDetail::OperationRemoved,
                ),
                (Some(b), Some(w)) => self.operation(&loc, b, w),
            }
        }
    }

    fn operation(&mut self, loc: &[String], before: &Operation, after: &Operation) {
        if before.operation_id != after.operation_id {
            self.push(
                ChangeKind::Modified,
                at(loc, "operationId"),
                snapshot(&before.operation_id),
                snapshot(&after.operation_id),
                ChangeDetail::OperationIdChanged,
            );
        }

        self.parameters(&at(loc, "parameters"), &before.parameters, &after.parameters);

        let body_loc = at(loc, "requestBody");
        match (&before.request_body, &after.request_body) {
            (None, None) => {}
            (None, Some(body)) => self.push(
                ChangeKind::Added,
                body_loc,
                None,
                snapshot(body),
                ChangeDetail::RequestBodyAdded,
            ),
            (Some(body), None) => self.push(
                ChangeKind::Removed,
                body_loc,
                snapshot(body),
                None,
                ChangeDetail::RequestBodyRemoved,
            ),
            (Some(b), Some(w)) => self.payload(&body_loc, b, w),
        }

        let responses_loc = at(loc, "responses");
        for (code, pair) in key_pairs(&before.responses, &after.responses) {
            let loc = at(&responses_loc, code.clone());
            match pair {
                Pair::Added(resp) => self.push(
                    ChangeKind::Added,
                    loc,
                    None,
                    snapshot(resp),
                    ChangeDetail::ResponseAdded,
                ),
                Pair::Removed(resp) => self.push(
                    ChangeKind::Removed,
                    loc,
                    snapshot(resp),
                    None,
                    ChangeDetail::ResponseRemoved,
                ),
                Pair::Both(b, w) => self.payload(&loc, b, w),
            }
        }
    }

    /// Parameters are matched by `(name, in)`, so reordering is not a change.
    fn parameters(&mut self, loc: &[String], before: &[Parameter], after: &[Parameter]) {
        let before = by_key(before);
        let after = by_key(after);
        for (key, pair) in key_pairs(&before, &after) {
            let loc = at(loc, parameter_segment(key, &before, &after));
            match pair {
                Pair::Added(param) => self.push(
                    ChangeKind::Added,
                    loc,
                    None,
                    snapshot(*param),
                    ChangeDetail::ParameterAdded,
                ),
                Pair::Removed(param) => self.push(
                    ChangeKind::Removed,
                    loc,
                    snapshot(*param),
                    None,
                    ChangeDetail::ParameterRemoved,
                ),
                Pair::Both(b, w) => {
                    if self.parameter_changed(&loc, b, w) {
                        self.push(
                            ChangeKind::Modified,
                            loc,
                            snapshot(*b),
                            snapshot(*w),
                            ChangeDetail::ParameterChanged,
                        );
                    }
                }
            }
        }
    }

    fn parameter_changed(&self, loc: &[String], before: &Parameter, after: &Parameter) -> bool {
        if before.required != after.required {
            return true;
        }
        match (&before.schema, &after.schema) {
            (None, None) => false,
            (Some(b), Some(w)) => {
                !compare_schemas(self.baseline, self.working, &at(loc, "schema"), b, w).is_empty()
            }
            _ => true,
        }
    }

    fn payload(&mut self, loc: &[String], before: &Payload, after: &Payload) {
        for (media, pair) in key_pairs(&before.content, &after.content) {
            let loc = at(loc, media.clone());
            match pair {
                Pair::Added(schema) => self.push(
                    ChangeKind::Added,
                    loc,
                    None,
                    snapshot(schema),
                    ChangeDetail::ContentAdded,
                ),
                Pair::Removed(schema) => self.push(
                    ChangeKind::Removed,
                    loc,
                    snapshot(schema),
                    None,
                    ChangeDetail::ContentRemoved,
                ),
                Pair::Both(b, w) => {
                    let found = compare_schemas(self.baseline, self.working, &loc, b, w);
                    self.records.extend(found);
                }
            }
        }
    }

    fn schemas(&mut self) {
        let (baseline, working) = (self.baseline, self.working);
        for (name, pair) in key_pairs(&baseline.schemas, &working.schemas) {
            let loc = vec!["components".to_string(), "schemas".to_string(), name.clone()];
            match pair {
                Pair::Added(schema) => self.push(
                    ChangeKind::Added,
                    loc,
                    None,
                    snapshot(schema),
                    ChangeDetail::SchemaAdded,
                ),
                Pair::Removed(schema) => self.push(
                    ChangeKind::Removed,
                    loc,
                    snapshot(schema),
                    None,
                    ChangeDetail::SchemaRemoved,
                ),
                Pair::Both(b, w) => {
                    let found = compare_schemas(self.baseline, self.working, &loc, b, w);
                    self.records.extend(found);
                }
            }
        }
    }
}

type ParamKey<'p> = (&'p str, &'p str);

/// First parameter wins when `(name, in)` repeats.
fn by_key(params: &[Parameter]) -> IndexMap<ParamKey<'_>, &Parameter> {
    let mut out = IndexMap::new();
    for param in params {
        out.entry((param.name.as_str(), param.location.as_str())).or_insert(param);
    }
    out
}

/// The bare name, or `name@in` when the name is used in more than one location.
fn parameter_segment(
    (name, location): &ParamKey<'_>,
    before: &IndexMap<ParamKey<'_>, &Parameter>,
    after: &IndexMap<ParamKey<'_>, &Parameter>,
) -> String {
    let shared = before
        .keys()
        .chain(after.keys())
        .any(|(other, other_location)| other == name && other_location != location);
    if shared {
        format!("{name}@{location}")
    } else {
        name.to_string()
    }
}

/// Structural comparison of two schema trees.
///
/// `stack` holds the (baseline, working) reference pairs currently being
/// compared; meeting one again means the branch is recursive and is taken as
/// equal, since the outer comparison already covers it. `outcomes` remembers
/// whether a fully compared pair differs and `reported` which pairs already have
/// their records in `records`, so every pair is expanded at most once while
/// reporting and once while probing composite branches.
struct SchemaComparison<'a> {
    baseline: &'a DocumentModel,
    working: &'a DocumentModel,
    stack: Vec<RefPair>,
    outcomes: HashMap<RefPair, bool>,
    reported: HashSet<RefPair>,
    probing: usize,
    records: Vec<ChangeRecord>,
}

type RefPair = (RefToken, RefToken);

impl<'a> SchemaComparison<'a> {
    fn new(baseline: &'a DocumentModel, working: &'a DocumentModel) -> Self {
        Self {
            baseline,
            working,
            stack: Vec::new(),
            outcomes: HashMap::new(),
            reported: HashSet::new(),
            probing: 0,
            records: Vec::new(),
        }
    }

    fn modified(
        &mut self,
        loc: &[String],
        before: &SchemaNode,
        after: &SchemaNode,
        detail: ChangeDetail,
    ) {
        self.records.push(record(
            ChangeKind::Modified,
            loc.to_vec(),
            snapshot(before),
            snapshot(after),
            detail,
        ));
    }

    /// Compares `before` with `after`, recording differences. Returns whether they differ.
    fn compare(&mut self, loc: &[String], before: &SchemaNode, after: &SchemaNode) -> bool {
        match (before, after) {
            // The named schema itself is compared once, under `components/schemas`.
            (SchemaNode::Reference(b), SchemaNode::Reference(w)) if b == w => false,
            (SchemaNode::Reference(_), _) | (_, SchemaNode::Reference(_)) => {
                self.compare_resolved(loc, before, after)
            }
            (
                SchemaNode::Primitive { ty: bt, format: bf },
                SchemaNode::Primitive { ty: wt, format: wf },
            ) => {
                let changed = bt != wt || bf != wf;
                if changed {
                    self.modified(loc, before, after, ChangeDetail::TypeChanged);
                }
                changed
            }
            (
                SchemaNode::Object {
                    properties: bp,
                    required: br,
                },
                SchemaNode::Object {
                    properties: wp,
                    required: wr,
                },
            ) => {
                let mut changed = false;
                let props_loc = at(loc, "properties");
                for (name, pair) in key_pairs(bp, wp) {
                    let loc = at(&props_loc, name.clone());
                    match pair {
                        Pair::Added(prop) => {
                            changed = true;
                            self.records.push(record(
                                ChangeKind::Modified,
                                loc,
                                None,
                                snapshot(prop),
                                ChangeDetail::PropertyAdded,
                            ));
                        }
                        Pair::Removed(prop) => {
                            changed = true;
                            self.records.push(record(
                                ChangeKind::Modified,
                                loc,
                                snapshot(prop),
                                None,
                                ChangeDetail::PropertyRemoved,
                            ));
                        }
                        Pair::Both(b, w) => changed |= self.compare(&loc, b, w),
                    }
                }

                let required_loc = at(loc, "required");
                for name in wr.iter().filter(|name| !br.contains(*name)) {
                    changed = true;
                    self.records.push(record(
                        ChangeKind::Added,
                        at(&required_loc, name.clone()),
                        None,
                        Some(Value::String(name.clone())),
                        ChangeDetail::RequiredAdded,
                    ));
                }
                for name in br.iter().filter(|name| !wr.contains(*name)) {
                    changed = true;
                    self.records.push(record(
                        ChangeKind::Removed,
                        at(&required_loc, name.clone()),
                        Some(Value::String(name.clone())),
                        None,
                        ChangeDetail::RequiredRemoved,
                    ));
                }
                changed
            }
            (SchemaNode::Array { items: bi }, SchemaNode::Array { items: wi }) => {
                self.compare(&at(loc, "items"), bi, wi)
            }
            (
                SchemaNode::Composite {
                    kind: bk,
                    branches: bb,
                },
                SchemaNode::Composite {
                    kind: wk,
                    branches: wb,
                },
            ) => {
                let detail = if bk != wk {
                    Some(ChangeDetail::KindChanged)
                } else if bb.len() != wb.len()
                    || bb
                        .iter()
                        .zip(wb)
                        .enumerate()
                        .any(|(i, (b, w))| self.differs(&at(loc, i.to_string()), b, w))
                {
                    Some(ChangeDetail::VariantBranchesChanged)
                } else {
                    None
                };
                match detail {
                    Some(detail) => {
                        self.modified(loc, before, after, detail);
                        true
                    }
                    None => false,
                }
            }
            (SchemaNode::Unknown(b), SchemaNode::Unknown(w)) => {
                let changed = b != w;
                if changed {
                    self.modified(loc, before, after, ChangeDetail::OpaqueChanged);
                }
                changed
            }
            _ => {
                self.modified(loc, before, after, ChangeDetail::KindChanged);
                true
            }
        }
    }

    /// Runs a comparison only to learn whether it finds anything.
    fn differs(&mut self, loc: &[String], before: &SchemaNode, after: &SchemaNode) -> bool {
        let mark = self.records.len();
        self.probing += 1;
        let changed = self.compare(loc, before, after);
        self.probing -= 1;
        self.records.truncate(mark);
        changed
    }

    fn compare_resolved(
        &mut self,
        loc: &[String],
        before: &SchemaNode,
        after: &SchemaNode,
    ) -> bool {
        // Only reference-to-reference pairs can recur; an inline side is finite.
        let key = match (before, after) {
            (SchemaNode::Reference(b), SchemaNode::Reference(w)) => Some((b.clone(), w.clone())),
            _ => None,
        };
        if let Some(key) = &key {
            if self.stack.contains(key) {
                return false;
            }
            if let Some(&changed) = self.outcomes.get(key) {
                if self.probing > 0 || self.reported.contains(key) {
                    return changed;
                }
            }
        }

        let changed = match (
            resolve_side(self.baseline, before),
            resolve_side(self.working, after),
        ) {
            (Some(b), Some(w)) => {
                if let Some(key) = &key {
                    self.stack.push(key.clone());
                }
                let changed = self.compare(loc, b, w);
                if key.is_some() {
                    self.stack.pop();
                }
                changed
            }
            _ => {
                self.modified(loc, before, after, ChangeDetail::ReferenceChanged);
                true
            }
        };

        if let Some(key) = key {
            self.outcomes.insert(key.clone(), changed);
            if self.probing == 0 {
                self.reported.insert(key);
            }
        }
        changed
    }
}

/// Inline nodes resolve to themselves; references that fail to resolve yield `None`.
fn resolve_side<'a>(doc: &'a DocumentModel, node: &'a SchemaNode) -> Option<&'a SchemaNode> {
    match node {
        SchemaNode::Reference(token) => match resolve(doc, token) {
            Ok(resolved) => Some(resolved),
            Err(err) => {
                tracing::debug!(error = %err, "comparing reference opaquely");
                None
            }
        },
        inline => Some(inline),
    }
}
