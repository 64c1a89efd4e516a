//! Node templates and per-instance projections.
//!
//! Templates in this ecosystem are declarative node trees, not markup
//! strings - the same shape the primitives build by hand, captured as data.
//! A [`NodeTemplate`] describes the shape once; a [`NodeSequenceFactory`]
//! stencils a fresh [`NodeSequence`] out of it for every instantiation.
//!
//! Nodes that instructions apply to are flagged as *targets* in the
//! template. Targets are collected depth-first while stenciling, so the
//! projection already knows its targets in document order - instruction row
//! `i` of a definition always lines up with target `i`.
//!
//! Layout and terminal output are downstream concerns; a [`Node`] here only
//! carries what instruction application needs: tag, attributes, and a
//! property map of [`Value`]s.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::Value;

// =============================================================================
// Node Template
// =============================================================================

/// Declarative description of a node tree.
///
/// This is the template payload of a definition: authored once, never
/// mutated, stenciled many times.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTemplate {
    /// An element with a tag, static attributes, and children.
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<NodeTemplate>,
        target: bool,
    },
    /// A text node.
    Text { text: String, target: bool },
    /// A render location placeholder. Always a target.
    Marker,
    /// A sequence of siblings with no wrapping element.
    Fragment(Vec<NodeTemplate>),
}

impl NodeTemplate {
    /// Create an element template.
    pub fn element(tag: &str) -> Self {
        NodeTemplate::Element {
            tag: tag.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
            target: false,
        }
    }

    /// Create a text template.
    pub fn text(text: &str) -> Self {
        NodeTemplate::Text {
            text: text.to_string(),
            target: false,
        }
    }

    /// Create a render location marker.
    pub fn marker() -> Self {
        NodeTemplate::Marker
    }

    /// Add a static attribute (elements only; no-op otherwise).
    pub fn attribute(mut self, name: &str, value: &str) -> Self {
        if let NodeTemplate::Element { attributes, .. } = &mut self {
            attributes.push((name.to_string(), value.to_string()));
        }
        self
    }

    /// Append a child (elements and fragments only; no-op otherwise).
    pub fn child(mut self, node: NodeTemplate) -> Self {
        match &mut self {
            NodeTemplate::Element { children, .. } => children.push(node),
            NodeTemplate::Fragment(children) => children.push(node),
            _ => {}
        }
        self
    }

    /// Flag this node as an instruction target.
    pub fn target(mut self) -> Self {
        match &mut self {
            NodeTemplate::Element { target, .. } => *target = true,
            NodeTemplate::Text { target, .. } => *target = true,
            _ => {}
        }
        self
    }
}

// =============================================================================
// Live Nodes
// =============================================================================

/// Shared handle to a live node.
pub type NodeRef = Rc<Node>;

/// What a live node is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Element with a tag name.
    Element(String),
    /// Text content.
    Text(String),
    /// Render location placeholder.
    Marker,
}

/// A live node in a projection.
///
/// Instruction application writes attributes and properties here; the
/// downstream renderer reads them. Children are fixed at stencil time.
#[derive(Debug)]
pub struct Node {
    kind: NodeKind,
    attributes: RefCell<HashMap<String, String>>,
    properties: RefCell<HashMap<String, Value>>,
    children: RefCell<Vec<NodeRef>>,
}

impl Node {
    fn new(kind: NodeKind) -> NodeRef {
        Rc::new(Node {
            kind,
            attributes: RefCell::new(HashMap::new()),
            properties: RefCell::new(HashMap::new()),
            children: RefCell::new(Vec::new()),
        })
    }

    /// The node's kind.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Element tag, if this is an element.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    /// Set an attribute.
    pub fn set_attribute(&self, name: &str, value: &str) {
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    /// Read an attribute.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    /// Set a property value.
    pub fn set_property(&self, name: &str, value: Value) {
        self.properties.borrow_mut().insert(name.to_string(), value);
    }

    /// Read a property value.
    pub fn property(&self, name: &str) -> Option<Value> {
        self.properties.borrow().get(name).cloned()
    }

    /// Snapshot of the node's children.
    pub fn children(&self) -> Vec<NodeRef> {
        self.children.borrow().clone()
    }
}

// =============================================================================
// Node Sequence
// =============================================================================

/// A live node projection produced for one renderable instance.
///
/// Owns its root nodes and the flat list of instruction targets in
/// document order.
#[derive(Debug)]
pub struct NodeSequence {
    roots: Vec<NodeRef>,
    targets: Vec<NodeRef>,
}

impl NodeSequence {
    /// The canonical empty projection, used for logic-only components.
    pub fn empty() -> Self {
        NodeSequence {
            roots: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Whether the projection has no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Root nodes in document order.
    pub fn roots(&self) -> &[NodeRef] {
        &self.roots
    }

    /// Instruction targets in document order.
    pub fn targets(&self) -> &[NodeRef] {
        &self.targets
    }
}

// =============================================================================
// Node Sequence Factory
// =============================================================================

/// Stencil that produces a fresh [`NodeSequence`] per instantiation.
#[derive(Debug, Clone)]
pub struct NodeSequenceFactory {
    template: Rc<NodeTemplate>,
}

impl NodeSequenceFactory {
    /// Create a factory for a node template.
    pub fn new(template: Rc<NodeTemplate>) -> Self {
        NodeSequenceFactory { template }
    }

    /// Stencil out a fresh projection.
    ///
    /// Targets are collected depth-first, so they line up with the
    /// definition's instruction rows.
    pub fn create_node_sequence(&self) -> NodeSequence {
        let mut roots = Vec::new();
        let mut targets = Vec::new();
        match self.template.as_ref() {
            NodeTemplate::Fragment(children) => {
                for child in children {
                    roots.push(instantiate(child, &mut targets));
                }
            }
            other => roots.push(instantiate(other, &mut targets)),
        }
        NodeSequence { roots, targets }
    }
}

fn instantiate(template: &NodeTemplate, targets: &mut Vec<NodeRef>) -> NodeRef {
    match template {
        NodeTemplate::Element {
            tag,
            attributes,
            children,
            target,
        } => {
            let node = Node::new(NodeKind::Element(tag.clone()));
            for (name, value) in attributes {
                node.set_attribute(name, value);
            }
            if *target {
                targets.push(node.clone());
            }
            for child in children {
                let child_node = instantiate(child, targets);
                node.children.borrow_mut().push(child_node);
            }
            node
        }
        NodeTemplate::Text { text, target } => {
            let node = Node::new(NodeKind::Text(text.clone()));
            if *target {
                targets.push(node.clone());
            }
            node
        }
        NodeTemplate::Marker => {
            let node = Node::new(NodeKind::Marker);
            targets.push(node.clone());
            node
        }
        // A nested fragment flattens into a wrapperless element; stencil its
        // children under a marker so the slot stays addressable.
        NodeTemplate::Fragment(children) => {
            let node = Node::new(NodeKind::Marker);
            targets.push(node.clone());
            for child in children {
                let child_node = instantiate(child, targets);
                node.children.borrow_mut().push(child_node);
            }
            node
        }
    }
}
