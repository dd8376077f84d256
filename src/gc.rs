//! Cycle collection for reference-counted heap objects.
//!
//! Objects and scopes are plain `Rc<RefCell<_>>` handles, so acyclic garbage
//! is freed as soon as the last handle drops. Cycles (an object storing
//! itself, a function whose closure scope holds the function, ...) are
//! reclaimed here by trial deletion:
//!
//! 1. Every tracked node starts with `gc_refs = strong_count`.
//! 2. Each edge between two tracked nodes subtracts one from the target.
//! 3. Nodes with `gc_refs > 0` are referenced from outside the tracked graph
//!    (Rust locals, native closures, payloads). They are roots.
//! 4. Everything reachable from a root survives. The rest is reset, which
//!    drops its outgoing references and breaks the cycle.
//!
//! Anything the collector cannot see through (native closures, host
//! payloads, interpreted bodies) only ever counts as an external reference,
//! so collection is conservative.

use tracing::debug;

use crate::environment::Scope;
use crate::object::HeapObject;
use crate::prelude::*;

// ============================================================================
// Traceable / Reset
// ============================================================================

/// Types that can enumerate the tracked handles they hold.
pub trait Traceable {
    /// Call `visit` with the identity of every object or scope handle stored
    /// directly in `self`, once per strong reference held.
    fn trace(&self, visit: &mut dyn FnMut(usize));
}

/// Types that can be emptied when found to be garbage.
pub trait Reset: Traceable {
    /// Detach and return the current contents, leaving an empty value behind.
    fn reset(&mut self) -> Self;
}

// ============================================================================
// Registry
// ============================================================================

/// Default threshold: collect after this many registrations
pub const DEFAULT_GC_THRESHOLD: usize = 10_000;

/// Minimum registry size before dead entries are pruned without a collection
const MIN_PRUNE_LEN: usize = 1024;

enum Tracked {
    Object(Weak<RefCell<HeapObject>>),
    Scope(Weak<RefCell<Scope>>),
}

impl Tracked {
    fn upgrade(&self) -> Option<Node> {
        match self {
            Tracked::Object(weak) => weak.upgrade().map(Node::Object),
            Tracked::Scope(weak) => weak.upgrade().map(Node::Scope),
        }
    }

    fn is_alive(&self) -> bool {
        match self {
            Tracked::Object(weak) => weak.strong_count() > 0,
            Tracked::Scope(weak) => weak.strong_count() > 0,
        }
    }
}

enum Node {
    Object(Rc<RefCell<HeapObject>>),
    Scope(Rc<RefCell<Scope>>),
}

enum Detached {
    Object(HeapObject),
    Scope(Scope),
}

impl Node {
    fn addr(&self) -> usize {
        match self {
            Node::Object(rc) => rc_addr(rc),
            Node::Scope(rc) => rc_addr(rc),
        }
    }

    /// Strong references held outside this collection pass
    fn external_count(&self) -> usize {
        let count = match self {
            Node::Object(rc) => Rc::strong_count(rc),
            Node::Scope(rc) => Rc::strong_count(rc),
        };
        count.saturating_sub(1)
    }

    /// Returns false if the node is currently borrowed mutably
    fn trace(&self, visit: &mut dyn FnMut(usize)) -> bool {
        match self {
            Node::Object(rc) => trace_cell(&**rc, visit),
            Node::Scope(rc) => trace_cell(&**rc, visit),
        }
    }

    fn reset(&self) -> Option<Detached> {
        match self {
            Node::Object(rc) => rc
                .try_borrow_mut()
                .ok()
                .map(|mut obj| Detached::Object(obj.reset())),
            Node::Scope(rc) => rc
                .try_borrow_mut()
                .ok()
                .map(|mut scope| Detached::Scope(scope.reset())),
        }
    }

    fn downgrade(&self) -> Tracked {
        match self {
            Node::Object(rc) => Tracked::Object(Rc::downgrade(rc)),
            Node::Scope(rc) => Tracked::Scope(Rc::downgrade(rc)),
        }
    }
}

fn trace_cell<T: Traceable>(cell: &RefCell<T>, visit: &mut dyn FnMut(usize)) -> bool {
    match cell.try_borrow() {
        Ok(data) => {
            data.trace(visit);
            true
        }
        Err(_) => false,
    }
}

/// Statistics about the collector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    /// Number of completed collections
    pub collections: usize,
    /// Live tracked nodes after the last collection
    pub live_nodes: usize,
    /// Nodes reclaimed by the last collection
    pub last_collected: usize,
    /// Nodes reclaimed since the thread started
    pub total_collected: usize,
}

struct Collector {
    tracked: Vec<Tracked>,
    /// Registrations since the last collection
    since_last: usize,
    /// 0 disables automatic collection
    threshold: usize,
    prune_at: usize,
    collecting: bool,
    stats: GcStats,
}

impl Collector {
    fn new() -> Self {
        Self {
            tracked: Vec::new(),
            since_last: 0,
            threshold: DEFAULT_GC_THRESHOLD,
            prune_at: MIN_PRUNE_LEN,
            collecting: false,
            stats: GcStats::default(),
        }
    }

    /// Register a node; returns true when an automatic collection is due
    fn push(&mut self, entry: Tracked) -> bool {
        self.tracked.push(entry);
        self.since_last += 1;

        if self.tracked.len() >= self.prune_at {
            self.tracked.retain(Tracked::is_alive);
            self.prune_at = (self.tracked.len() * 2).max(MIN_PRUNE_LEN);
        }

        self.threshold > 0 && self.since_last >= self.threshold && !self.collecting
    }
}

thread_local! {
    static COLLECTOR: RefCell<Collector> = RefCell::new(Collector::new());
}

fn register(entry: Tracked) {
    let due = COLLECTOR.with(|c| c.borrow_mut().push(entry));
    if due {
        collect();
    }
}

pub(crate) fn track_object(rc: &Rc<RefCell<HeapObject>>) {
    register(Tracked::Object(Rc::downgrade(rc)));
}

pub(crate) fn track_scope(rc: &Rc<RefCell<Scope>>) {
    register(Tracked::Scope(Rc::downgrade(rc)));
}

/// Set the automatic collection threshold (0 = disable automatic collection)
pub fn set_gc_threshold(threshold: usize) {
    COLLECTOR.with(|c| c.borrow_mut().threshold = threshold);
}

pub fn gc_threshold() -> usize {
    COLLECTOR.with(|c| c.borrow().threshold)
}

pub fn stats() -> GcStats {
    COLLECTOR.with(|c| c.borrow().stats)
}

// ============================================================================
// Collection
// ============================================================================

/// Reclaim unreachable cycles on this thread.
///
/// Returns the number of objects and scopes that were reset. Calling this
/// from inside a collection (for example from a payload's `Drop`) is a no-op.
pub fn collect() -> usize {
    let entries = COLLECTOR.with(|c| {
        let mut c = c.borrow_mut();
        if c.collecting {
            return None;
        }
        c.collecting = true;
        Some(core::mem::take(&mut c.tracked))
    });
    let Some(entries) = entries else {
        return 0;
    };

    let nodes: Vec<Node> = entries.iter().filter_map(Tracked::upgrade).collect();
    drop(entries);

    let mut index: FxHashMap<usize, usize> = FxHashMap::default();
    index.reserve(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        index.insert(node.addr(), i);
    }

    // Subtract internal edges
    let mut gc_refs: Vec<usize> = nodes.iter().map(Node::external_count).collect();
    let mut edges: Vec<Vec<usize>> = Vec::with_capacity(nodes.len());
    let mut pinned = vec![false; nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        let mut children = Vec::new();
        let traced = node.trace(&mut |addr| {
            if let Some(&j) = index.get(&addr) {
                children.push(j);
            }
        });
        if !traced {
            // Mutably borrowed right now; someone up the stack is using it
            if let Some(flag) = pinned.get_mut(i) {
                *flag = true;
            }
        }
        for &j in &children {
            if let Some(count) = gc_refs.get_mut(j) {
                *count = count.saturating_sub(1);
            }
        }
        edges.push(children);
    }

    // Mark from roots
    let mut marked = vec![false; nodes.len()];
    let mut stack: Vec<usize> = (0..nodes.len())
        .filter(|&i| {
            gc_refs.get(i).is_some_and(|&n| n > 0) || pinned.get(i).copied().unwrap_or(false)
        })
        .collect();
    while let Some(i) = stack.pop() {
        match marked.get_mut(i) {
            Some(flag) if !*flag => *flag = true,
            _ => continue,
        }
        if let Some(children) = edges.get(i) {
            let unmarked = children
                .iter()
                .copied()
                .filter(|&j| !marked.get(j).copied().unwrap_or(true));
            stack.extend(unmarked);
        }
    }

    // Sweep: detach garbage contents first, drop them once no borrows remain
    let mut survivors = Vec::new();
    let mut detached = Vec::new();
    for (node, &live) in nodes.iter().zip(marked.iter()) {
        if live {
            survivors.push(node.downgrade());
            continue;
        }
        match node.reset() {
            Some(contents) => detached.push(contents),
            None => survivors.push(node.downgrade()),
        }
    }
    let collected = detached.len();
    let live_nodes = survivors.len();

    COLLECTOR.with(|c| {
        let mut c = c.borrow_mut();
        c.tracked.extend(survivors);
        c.since_last = 0;
        c.stats.collections += 1;
        c.stats.live_nodes = live_nodes;
        c.stats.last_collected = collected;
        c.stats.total_collected += collected;
    });

    drop(nodes);
    drop(detached);

    COLLECTOR.with(|c| c.borrow_mut().collecting = false);

    debug!(collected, live = live_nodes, "gc cycle finished");
    collected
}
