use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::PoolStats;

static NEXT_POOL_ID: AtomicU32 = AtomicU32::new(1);

fn next_pool_id() -> u32 {
    NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed)
}

/// Minimum number of nodes added when a pool runs dry.
pub const MIN_GROWTH: usize = 10;

/// Growth step for an exhausted pool: 20% of its size, at least [`MIN_GROWTH`].
pub fn growth_step(pool_size: usize) -> usize {
    cmp::max(MIN_GROWTH, pool_size / 5)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    #[default]
    Row,
    Header,
    Placeholder,
}

/// A recyclable visual unit. The adapter mounts it into its toolkit; the pool only tracks its
/// lifecycle and baseline shape.
///
/// `kind` and `class` are identity and survive recycling. Everything else is reset to a blank
/// baseline whenever the node is handed out.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderNode {
    kind: NodeKind,
    class: Cow<'static, str>,
    pub visible: bool,
    pub item_index: Option<usize>,
    pub offset_y: f64,
    pub content: String,
    attributes: Vec<(Cow<'static, str>, String)>,
}

impl RenderNode {
    pub fn new(kind: NodeKind, class: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            class: class.into(),
            visible: false,
            item_index: None,
            offset_y: 0.0,
            content: String::new(),
            attributes: Vec::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    fn reset(&mut self) {
        self.visible = true;
        self.item_index = None;
        self.offset_y = 0.0;
        self.content.clear();
        self.attributes.clear();
    }
}

/// Handle to a node checked out of a [`NodePool`].
///
/// Handles are tied to the pool (and pool generation) that issued them; recycling a foreign or
/// stale handle is ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    pool: u32,
    slot: u32,
    generation: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotState {
    Available,
    InUse,
    Vacant,
}

#[derive(Clone, Debug)]
struct Slot {
    node: RenderNode,
    generation: u32,
    state: SlotState,
}

/// An arena of [`RenderNode`]s plus a stack of available slots.
///
/// Invariant: `available + in_use == total`. Nodes are never destroyed on recycle; they are
/// only dropped by [`resize`](Self::resize), [`initialize`](Self::initialize) or
/// [`clear`](Self::clear).
#[derive(Clone, Debug)]
pub struct NodePool {
    id: u32,
    kind: NodeKind,
    class: Cow<'static, str>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    vacant: Vec<u32>,
    in_use: usize,
}

impl NodePool {
    pub fn new() -> Self {
        Self {
            id: next_pool_id(),
            kind: NodeKind::default(),
            class: Cow::Borrowed(""),
            slots: Vec::new(),
            free: Vec::new(),
            vacant: Vec::new(),
            in_use: 0,
        }
    }

    pub fn with_size(size: usize, kind: NodeKind, class: impl Into<Cow<'static, str>>) -> Self {
        let mut pool = Self::new();
        pool.initialize(size, kind, class);
        pool
    }

    /// Discards every node (outstanding handles become foreign) and allocates `size` fresh
    /// nodes of `kind`/`class`.
    pub fn initialize(&mut self, size: usize, kind: NodeKind, class: impl Into<Cow<'static, str>>) {
        self.clear();
        self.kind = kind;
        self.class = class.into();
        self.grow(size);
        ldebug!(size, "NodePool::initialize");
    }

    pub fn pool_size(&self) -> usize {
        self.free.len() + self.in_use
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn in_use(&self) -> usize {
        self.in_use
    }

    pub fn get_element(&mut self) -> NodeId {
        if self.free.is_empty() {
            let step = growth_step(self.pool_size());
            ldebug!(pool_size = self.pool_size(), step, "NodePool exhausted; growing");
            self.grow(step);
        }
        let Some(slot) = self.free.pop() else {
            unreachable!("NodePool::grow always adds at least MIN_GROWTH nodes");
        };
        let entry = &mut self.slots[slot as usize];
        entry.state = SlotState::InUse;
        entry.node.reset();
        self.in_use += 1;
        NodeId {
            pool: self.id,
            slot,
            generation: entry.generation,
        }
    }

    /// Returns a node to the pool. Foreign, stale, or already-available handles are ignored
    /// and report `false`.
    pub fn recycle_element(&mut self, id: NodeId) -> bool {
        let Some(entry) = self.slot_mut(id) else {
            return false;
        };
        if entry.state != SlotState::InUse {
            return false;
        }
        entry.state = SlotState::Available;
        entry.generation = entry.generation.wrapping_add(1);
        entry.node.visible = false;
        self.free.push(id.slot);
        self.in_use -= 1;
        true
    }

    /// Shrinking drops available nodes only (in-use nodes are never taken away), so the pool
    /// may stay above `new_size`. Growing allocates the delta.
    pub fn resize(&mut self, new_size: usize) {
        let cur = self.pool_size();
        if new_size > cur {
            self.grow(new_size - cur);
            return;
        }
        let mut excess = cur - new_size;
        while excess > 0 {
            let Some(slot) = self.free.pop() else {
                break;
            };
            let entry = &mut self.slots[slot as usize];
            entry.state = SlotState::Vacant;
            entry.generation = entry.generation.wrapping_add(1);
            entry.node = RenderNode::new(self.kind, self.class.clone());
            self.vacant.push(slot);
            excess -= 1;
        }
        ldebug!(new_size, pool_size = self.pool_size(), "NodePool::resize");
    }

    pub fn node(&self, id: NodeId) -> Option<&RenderNode> {
        if id.pool != self.id {
            return None;
        }
        let entry = self.slots.get(id.slot as usize)?;
        (entry.generation == id.generation && entry.state == SlotState::InUse)
            .then_some(&entry.node)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut RenderNode> {
        let entry = self.slot_mut(id)?;
        (entry.state == SlotState::InUse).then_some(&mut entry.node)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total: self.pool_size(),
            available: self.free.len(),
            in_use: self.in_use,
        }
    }

    /// Drops every node. Outstanding handles become foreign.
    pub fn clear(&mut self) {
        self.id = next_pool_id();
        self.slots.clear();
        self.free.clear();
        self.vacant.clear();
        self.in_use = 0;
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        if id.pool != self.id {
            return None;
        }
        let entry = self.slots.get_mut(id.slot as usize)?;
        (entry.generation == id.generation).then_some(entry)
    }

    fn grow(&mut self, n: usize) {
        self.free.reserve(n);
        for _ in 0..n {
            let node = RenderNode::new(self.kind, self.class.clone());
            let slot = match self.vacant.pop() {
                Some(slot) => {
                    let entry = &mut self.slots[slot as usize];
                    entry.node = node;
                    entry.state = SlotState::Available;
                    slot
                }
                None => {
                    self.slots.push(Slot {
                        node,
                        generation: 0,
                        state: SlotState::Available,
                    });
                    (self.slots.len() - 1) as u32
                }
            };
            self.free.push(slot);
        }
    }
}

impl Default for NodePool {
    fn default() -> Self {
        Self::new()
    }
}
