//! Per-request context: an ordered stack of frames.
//!
//! The outermost frame is always [`Frame::Root`], stamped with the request's
//! [`RequestId`]. Every router a request passes through pushes a
//! [`RoutingFrame`] describing what it matched and which template variables
//! it bound. Handlers that added a frame for their own bookkeeping pop it
//! with [`Context::into_parent`] before delegating further inward.
//!
//! A context is owned by exactly one request. It is cheap to clone but is
//! never shared between requests.

use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::ids::RequestId;

/// Maximum number of template variables bound by one router hop before heap allocation.
pub const MAX_INLINE_VARIABLES: usize = 4;

/// Template variables bound by a route match, e.g. `{id}` → `("id", "42")`.
///
/// Names come from route patterns built at registration time, so they are
/// shared `Arc<str>` rather than fresh strings per request.
pub type VariableVec = SmallVec<[(Arc<str>, String); MAX_INLINE_VARIABLES]>;

/// What one router hop matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingFrame {
    matched: String,
    remaining: String,
    variables: VariableVec,
}

impl RoutingFrame {
    #[must_use]
    pub fn new(matched: String, remaining: String, variables: VariableVec) -> Self {
        Self {
            matched,
            remaining,
            variables,
        }
    }

    /// The part of the path consumed by this hop
    #[must_use]
    pub fn matched(&self) -> &str {
        &self.matched
    }

    /// The part of the path handed to the next handler
    #[must_use]
    pub fn remaining(&self) -> &str {
        &self.remaining
    }

    #[must_use]
    pub fn variables(&self) -> &VariableVec {
        &self.variables
    }

    /// Look up a bound variable. Last binding wins when a name repeats.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// One entry in the context stack
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Root { request_id: RequestId },
    Routing(RoutingFrame),
    /// Free-form request metadata supplied by the transport or a handler
    Attribute { name: String, value: Value },
}

/// Request-scoped stack of frames, outermost first
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    frames: Vec<Frame>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Fresh root context with a newly generated request id
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            frames: vec![Frame::Root { request_id }],
        }
    }

    #[must_use]
    pub fn request_id(&self) -> Option<RequestId> {
        self.frames.iter().find_map(|f| match f {
            Frame::Root { request_id } => Some(*request_id),
            _ => None,
        })
    }

    /// Child context with `frame` pushed on top
    #[must_use]
    pub fn push(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }

    #[must_use]
    pub fn with_routing(self, frame: RoutingFrame) -> Self {
        self.push(Frame::Routing(frame))
    }

    #[must_use]
    pub fn with_attribute(self, name: &str, value: Value) -> Self {
        self.push(Frame::Attribute {
            name: name.to_string(),
            value,
        })
    }

    /// Remove and return the innermost frame. The root frame is never popped.
    pub fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// This context with its innermost frame removed
    #[must_use]
    pub fn into_parent(mut self) -> Self {
        self.pop();
        self
    }

    #[must_use]
    pub fn innermost(&self) -> Option<&Frame> {
        self.frames.last()
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Innermost routing frame, if any router has been passed
    #[must_use]
    pub fn routing(&self) -> Option<&RoutingFrame> {
        self.frames.iter().rev().find_map(|f| match f {
            Frame::Routing(r) => Some(r),
            _ => None,
        })
    }

    /// Look up a template variable, innermost routing frame first
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.frames.iter().rev().find_map(|f| match f {
            Frame::Routing(r) => r.variable(name),
            _ => None,
        })
    }

    /// Look up an attribute, innermost first
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|f| match f {
            Frame::Attribute { name: n, value } if n == name => Some(value),
            _ => None,
        })
    }

    /// Concatenation of every routing frame's matched path, outermost first.
    /// This is the address of the handler currently executing.
    #[must_use]
    pub fn base_path(&self) -> String {
        self.frames
            .iter()
            .filter_map(|f| match f {
                Frame::Routing(r) if !r.matched.is_empty() => Some(r.matched.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}
