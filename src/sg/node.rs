//! Scene graph nodes
//!
//! A [`Node`] is a named, typed tree element holding a dynamically typed
//! [`Value`], UI hints and an insertion-ordered set of uniquely named
//! children. Nodes are shared as [`NodePtr`] and never copied; a node has at
//! most one parent, referenced weakly.
//!
//! ## Modification tracking
//!
//! Every node records three [`TimeStamp`]s: when it was last modified, the
//! newest modification anywhere below it, and when it was last committed.
//! Mutations stamp the node and push the stamp up through all ancestors, so
//! [`Node::is_modified`] answers "did anything in this subtree change since
//! the last commit" without walking the subtree.
//!
//! A fourth stamp, [`Node::last_value_edit`], moves only when
//! [`Node::set_value`] actually changes the value. Hooks that pick between
//! competing sources of the same data compare these, so forcing a recommit
//! with [`Node::mark_as_modified`] never reorders edits.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use super::factory;
use super::timestamp::TimeStamp;
use super::value::{DataArray, FromValue, Value};
use super::visitors::{TraversalContext, Visitor};
use crate::device::{ObjectHandle, ObjectKind, ObjectRef, RenderDevice};
use crate::error::{Result, SgError};

/// Shared pointer to a node; the only way nodes are handed around
pub type NodePtr = Arc<Node>;

/// Role of a node in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Generic,
    Parameter,
    Frame,
    FrameBuffer,
    Renderer,
    Camera,
    World,
    Transform,
    Geometry,
    Volume,
    TransferFunction,
    Light,
    Lights,
    Material,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Presentation and visibility hints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeHints {
    /// Valid range for UI editing; not enforced by `set_value`
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub read_only: bool,
    /// Not pushed to the renderer object of the parent
    pub sg_only: bool,
    /// Hidden from generated UI
    pub no_ui: bool,
}

/// Subtype-specific commit hooks
///
/// Called by the commit visitor around the generic parameter push. Hooks run
/// only for modified subtrees.
pub trait NodeBehavior: Send + Sync + 'static {
    fn pre_commit(&self, _node: &Node) -> Result<()> {
        Ok(())
    }

    fn post_commit(&self, _node: &Node) -> Result<()> {
        Ok(())
    }
}

struct NoBehavior;

impl NodeBehavior for NoBehavior {}

/// Renderer object a node is backed by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSpec {
    pub kind: ObjectKind,
    pub subtype: String,
}

struct NodeState {
    value: Value,
    hints: NodeHints,
    description: String,
    children: Vec<NodePtr>,
}

/// A scene graph node
pub struct Node {
    name: String,
    subtype: String,
    node_type: NodeType,
    object_spec: Option<ObjectSpec>,
    behavior: Box<dyn NodeBehavior>,

    self_ref: Weak<Node>,
    parent: RwLock<Weak<Node>>,
    state: RwLock<NodeState>,
    object: Mutex<Option<ObjectRef>>,

    last_modified: AtomicU64,
    child_last_modified: AtomicU64,
    last_committed: AtomicU64,
    last_value_edit: AtomicU64,
}

/// Builder for nodes, used by the factory constructors
pub struct NodeBuilder {
    name: String,
    subtype: String,
    node_type: NodeType,
    value: Value,
    hints: NodeHints,
    description: String,
    object_spec: Option<ObjectSpec>,
    behavior: Option<Box<dyn NodeBehavior>>,
}

impl NodeBuilder {
    pub fn new(name: &str, subtype: &str, node_type: NodeType) -> Self {
        Self {
            name: name.to_string(),
            subtype: subtype.to_string(),
            node_type,
            value: Value::None,
            hints: NodeHints::default(),
            description: String::new(),
            object_spec: None,
            behavior: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_min_max(mut self, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        self.hints.min = Some(min.into());
        self.hints.max = Some(max.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.hints.read_only = true;
        self
    }

    pub fn sg_only(mut self) -> Self {
        self.hints.sg_only = true;
        self
    }

    pub fn no_ui(mut self) -> Self {
        self.hints.no_ui = true;
        self
    }

    /// Backs the node with a renderer object of `kind`
    pub fn with_object(mut self, kind: ObjectKind, subtype: &str) -> Self {
        self.object_spec = Some(ObjectSpec {
            kind,
            subtype: subtype.to_string(),
        });
        self
    }

    pub fn with_behavior(mut self, behavior: impl NodeBehavior) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    pub fn build(self) -> NodePtr {
        let stamp = TimeStamp::now().value();
        Arc::new_cyclic(|self_ref| Node {
            name: self.name,
            subtype: self.subtype,
            node_type: self.node_type,
            object_spec: self.object_spec,
            behavior: self.behavior.unwrap_or_else(|| Box::new(NoBehavior)),
            self_ref: self_ref.clone(),
            parent: RwLock::new(Weak::new()),
            state: RwLock::new(NodeState {
                value: self.value,
                hints: self.hints,
                description: self.description,
                children: Vec::new(),
            }),
            object: Mutex::new(None),
            last_modified: AtomicU64::new(stamp),
            child_last_modified: AtomicU64::new(0),
            last_committed: AtomicU64::new(0),
            last_value_edit: AtomicU64::new(0),
        })
    }
}

impl Node {
    // Identity

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn description(&self) -> String {
        self.state.read().description.clone()
    }

    pub fn set_description(&self, description: &str) {
        self.state.write().description = description.to_string();
    }

    /// This node as a shared pointer
    ///
    /// Always succeeds while `&self` is reachable, since nodes only exist
    /// inside an `Arc`.
    pub fn ptr(&self) -> Option<NodePtr> {
        self.self_ref.upgrade()
    }

    // Values

    pub fn value(&self) -> Value {
        self.state.read().value.clone()
    }

    /// Typed copy of the value
    pub fn value_as<T: FromValue>(&self) -> Result<T> {
        let state = self.state.read();
        T::from_value(&state.value).ok_or_else(|| SgError::TypeMismatch {
            node: self.name.clone(),
            expected: T::KIND,
            actual: state.value.kind(),
        })
    }

    /// Replaces the value, returning whether it changed
    ///
    /// The new value must have the same kind as the current one unless the
    /// node holds no value yet. Only an actual change marks the node as
    /// modified.
    pub fn set_value(&self, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        {
            let mut state = self.state.write();
            if !state.value.is_none() && state.value.kind() != value.kind() {
                return Err(SgError::TypeMismatch {
                    node: self.name.clone(),
                    expected: state.value.kind(),
                    actual: value.kind(),
                });
            }
            if state.value == value {
                return Ok(false);
            }
            state.value = value;
        }
        self.last_value_edit
            .store(TimeStamp::now().value(), Ordering::Release);
        self.mark_as_modified();
        Ok(true)
    }

    // Hints

    pub fn hints(&self) -> NodeHints {
        self.state.read().hints.clone()
    }

    pub fn set_min_max(&self, min: impl Into<Value>, max: impl Into<Value>) {
        let mut state = self.state.write();
        state.hints.min = Some(min.into());
        state.hints.max = Some(max.into());
    }

    pub fn min_max(&self) -> Option<(Value, Value)> {
        let state = self.state.read();
        match (&state.hints.min, &state.hints.max) {
            (Some(min), Some(max)) => Some((min.clone(), max.clone())),
            _ => None,
        }
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.state.write().hints.read_only = read_only;
    }

    pub fn is_read_only(&self) -> bool {
        self.state.read().hints.read_only
    }

    /// Hides the node from the renderer; a visibility change counts as a
    /// modification
    pub fn set_sg_only(&self, sg_only: bool) {
        let changed = {
            let mut state = self.state.write();
            std::mem::replace(&mut state.hints.sg_only, sg_only) != sg_only
        };
        if changed {
            self.mark_as_modified();
        }
    }

    pub fn is_sg_only(&self) -> bool {
        self.state.read().hints.sg_only
    }

    pub fn set_sg_no_ui(&self, no_ui: bool) {
        self.state.write().hints.no_ui = no_ui;
    }

    pub fn is_sg_no_ui(&self) -> bool {
        self.state.read().hints.no_ui
    }

    // Tree structure

    pub fn parent(&self) -> Option<NodePtr> {
        self.parent.read().upgrade()
    }

    /// Attaches `child`, replacing any existing child with the same name
    ///
    /// Fails if `child` already belongs to another parent or is an ancestor
    /// of this node. The child's parent link stays write-locked from the
    /// check to the insert, so concurrent adds of one orphan cannot both win.
    pub fn add(&self, child: NodePtr) -> Result<NodePtr> {
        let mut child_parent = child.parent.write();
        if let Some(current) = child_parent.upgrade() {
            if std::ptr::eq(Arc::as_ptr(&current), self) {
                drop(child_parent);
                return Ok(child);
            }
            return Err(SgError::AlreadyParented {
                child: child.name.clone(),
                parent: current.name.clone(),
            });
        }

        // Compared before reading each parent link, so the walk stops at
        // `child` without touching its locked link
        let mut ancestor = self.ptr();
        while let Some(node) = ancestor {
            if Arc::ptr_eq(&node, &child) {
                return Err(SgError::Cycle {
                    child: child.name.clone(),
                    parent: self.name.clone(),
                });
            }
            ancestor = node.parent();
        }

        let replaced = {
            let mut state = self.state.write();
            match state.children.iter().position(|c| c.name == child.name) {
                Some(index) => Some(std::mem::replace(&mut state.children[index], child.clone())),
                None => {
                    state.children.push(child.clone());
                    None
                }
            }
        };
        *child_parent = self.self_ref.clone();
        drop(child_parent);
        if let Some(old) = replaced {
            *old.parent.write() = Weak::new();
        }

        // Pull in whatever the new subtree has not committed yet
        child.mark_as_modified();
        Ok(child)
    }

    /// Detaches and returns the child called `name`
    pub fn remove(&self, name: &str) -> Option<NodePtr> {
        let removed = {
            let mut state = self.state.write();
            let index = state.children.iter().position(|c| c.name == name)?;
            state.children.remove(index)
        };
        *removed.parent.write() = Weak::new();
        self.mark_as_modified();
        Some(removed)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.state.read().children.iter().any(|c| c.name == name)
    }

    pub fn child(&self, name: &str) -> Result<NodePtr> {
        self.try_child(name).ok_or_else(|| SgError::ChildNotFound {
            node: self.name.clone(),
            child: name.to_string(),
        })
    }

    pub fn try_child(&self, name: &str) -> Option<NodePtr> {
        self.state
            .read()
            .children
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    /// Children in insertion order
    pub fn children(&self) -> Vec<NodePtr> {
        self.state.read().children.clone()
    }

    pub fn child_names(&self) -> Vec<String> {
        self.state
            .read()
            .children
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn num_children(&self) -> usize {
        self.state.read().children.len()
    }

    /// Typed value of a direct child
    pub fn child_value_as<T: FromValue>(&self, name: &str) -> Result<T> {
        self.child(name)?.value_as::<T>()
    }

    /// Sets the value of a direct child
    pub fn set_child_value(&self, name: &str, value: impl Into<Value>) -> Result<bool> {
        self.child(name)?.set_value(value)
    }

    /// Creates a node of `subtype` through the factory and attaches it
    pub fn create_child(&self, name: &str, subtype: &str) -> Result<NodePtr> {
        self.add(factory::create_node(name, subtype)?)
    }

    pub fn create_child_with_value(
        &self,
        name: &str,
        subtype: &str,
        value: impl Into<Value>,
    ) -> Result<NodePtr> {
        self.add(factory::create_node_with_value(name, subtype, value)?)
    }

    /// Creates a `DataVector*` child holding `data`
    pub fn create_child_data(&self, name: &str, data: impl Into<DataArray>) -> Result<NodePtr> {
        self.add(factory::create_data_node(name, data))
    }

    // Traversal

    /// Walks the subtree depth first, parent before children
    ///
    /// The visitor's post-order hook runs for every visited node, also when
    /// it declined to descend.
    pub fn traverse<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<()> {
        self.traverse_at(visitor, TraversalContext::default())
    }

    fn traverse_at<V: Visitor + ?Sized>(&self, visitor: &mut V, ctx: TraversalContext) -> Result<()> {
        if visitor.visit(self, &ctx)? {
            let child_ctx = ctx.descend();
            // Snapshot so visitors may restructure the tree
            for child in self.children() {
                child.traverse_at(visitor, child_ctx)?;
            }
        }
        visitor.post_children(self, &ctx)
    }

    // Modification tracking

    /// Stamps this node and propagates the stamp to all ancestors
    pub fn mark_as_modified(&self) {
        let stamp = TimeStamp::now().value();
        self.last_modified.store(stamp, Ordering::Release);

        let mut ancestor = self.parent();
        while let Some(node) = ancestor {
            node.child_last_modified.fetch_max(stamp, Ordering::AcqRel);
            ancestor = node.parent();
        }
    }

    /// True if this node or any descendant changed since the last commit
    pub fn is_modified(&self) -> bool {
        let newest = self
            .last_modified
            .load(Ordering::Acquire)
            .max(self.child_last_modified.load(Ordering::Acquire));
        newest > self.last_committed.load(Ordering::Acquire)
    }

    pub fn mark_as_committed(&self) {
        self.last_committed
            .store(TimeStamp::now().value(), Ordering::Release);
    }

    pub fn last_modified(&self) -> TimeStamp {
        TimeStamp::from_raw(self.last_modified.load(Ordering::Acquire))
    }

    pub fn child_last_modified(&self) -> TimeStamp {
        TimeStamp::from_raw(self.child_last_modified.load(Ordering::Acquire))
    }

    pub fn last_committed(&self) -> TimeStamp {
        TimeStamp::from_raw(self.last_committed.load(Ordering::Acquire))
    }

    /// When `set_value` last changed the value; zero for the built-in value
    pub fn last_value_edit(&self) -> TimeStamp {
        TimeStamp::from_raw(self.last_value_edit.load(Ordering::Acquire))
    }

    // Renderer object

    pub fn object_spec(&self) -> Option<&ObjectSpec> {
        self.object_spec.as_ref()
    }

    pub fn is_object(&self) -> bool {
        self.object_spec.is_some()
    }

    /// Handle of the backing renderer object, once created
    pub fn handle(&self) -> Option<ObjectHandle> {
        self.object.lock().as_ref().map(|o| o.handle())
    }

    /// Creates the backing object on `device` if it does not exist there yet
    pub(crate) fn ensure_object(&self, device: &Arc<dyn RenderDevice>) -> Result<Option<ObjectHandle>> {
        let Some(spec) = &self.object_spec else {
            return Ok(None);
        };
        let mut object = self.object.lock();
        match object.as_ref() {
            Some(existing) if existing.is_on(device) => Ok(Some(existing.handle())),
            _ => {
                let created = ObjectRef::create(device, spec.kind, &spec.subtype)?;
                let handle = created.handle();
                *object = Some(created);
                Ok(Some(handle))
            }
        }
    }

    pub(crate) fn behavior(&self) -> &dyn NodeBehavior {
        self.behavior.as_ref()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("subtype", &self.subtype)
            .field("type", &self.node_type)
            .field("value", &self.value())
            .field("children", &self.child_names())
            .finish()
    }
}
