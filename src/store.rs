//! In-memory hierarchical path store.
//!
//! Nodes live in an id-keyed arena owned by [`PathStore`]. Folders hold an
//! ordered list of child ids and every node keeps a non-owning parent id,
//! which sidesteps the aliasing a directly cyclic structure would create.
//! "Folder", "leaf" and "path" are an organizational naming convention over
//! in-memory objects, not an on-disk filesystem.

use std::collections::HashMap;

use crate::error::{Result, TreeError};

/// Stable node identifier.
///
/// Assigned once at creation, monotonically increasing, never reused while
/// the store lives. Renderers use it to correlate widget identity across
/// frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Raw integer value, for callers that key per-node state by id.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Kind of tree node.
#[derive(Debug)]
enum NodeKind<T> {
    Folder { children: Vec<NodeId>, is_open: bool },
    Leaf { value: T },
}

/// A single node in the arena.
#[derive(Debug)]
struct Node<T> {
    name: String,
    parent: Option<NodeId>,
    kind: NodeKind<T>,
}

/// What changed in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Moved,
    Removed,
    Reload,
}

/// Change notification payload delivered to subscribers.
#[derive(Debug, Clone, Copy)]
pub struct Change {
    pub kind: ChangeKind,
    pub node: NodeId,
    pub old_parent: Option<NodeId>,
    pub new_parent: Option<NodeId>,
}

/// Sort order applied to sibling lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Insertion order, unsorted.
    Insertion,
    /// Alphabetical (case-insensitive).
    Name,
    /// Folders before leaves, then alphabetical (case-insensitive), default.
    #[default]
    FoldersFirst,
}

impl SortMode {
    /// Parse a sort mode from a config string.
    pub fn from_str(s: &str) -> Self {
        match s {
            "insertion" => SortMode::Insertion,
            "name" => SortMode::Name,
            _ => SortMode::FoldersFirst,
        }
    }

    /// Display label for the current sort.
    pub fn label(&self) -> &'static str {
        match self {
            SortMode::Insertion => "Insertion",
            SortMode::Name => "Name",
            SortMode::FoldersFirst => "Folders first",
        }
    }
}

type Subscriber = Box<dyn Fn(&Change)>;

/// Virtual hierarchical item store.
///
/// Owns the node tree and enforces the naming invariants: names never
/// contain `/` and no two siblings have case-insensitively equal names.
/// All mutations notify subscribers synchronously before returning.
pub struct PathStore<T> {
    nodes: HashMap<NodeId, Node<T>>,
    root: NodeId,
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

impl<T> PathStore<T> {
    /// Create an empty store containing only the root folder.
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                name: String::new(),
                parent: None,
                kind: NodeKind::Folder {
                    children: Vec::new(),
                    is_open: true,
                },
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
            subscribers: Vec::new(),
        }
    }

    /// Bulk-construct a store from `(path, value)` items.
    ///
    /// Intermediate folders are created on demand. Colliding leaf names are
    /// auto-uniquified, so construction never fails; items with empty paths
    /// are skipped.
    pub fn from_items(items: impl IntoIterator<Item = (String, T)>) -> Self {
        let mut store = Self::new();
        for (path, value) in items {
            let _ = store.insert_leaf(&path, value);
        }
        store
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// The distinguished root folder. Never rendered, never moved.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether the id still refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Whether the node is a folder. `false` for leaves and stale ids.
    pub fn is_folder(&self, id: NodeId) -> bool {
        matches!(
            self.nodes.get(&id),
            Some(Node {
                kind: NodeKind::Folder { .. },
                ..
            })
        )
    }

    /// Whether the node is a leaf. `false` for folders and stale ids.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        matches!(
            self.nodes.get(&id),
            Some(Node {
                kind: NodeKind::Leaf { .. },
                ..
            })
        )
    }

    /// Node name, `None` for stale ids.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.name.as_str())
    }

    /// Parent id, `None` for the root and stale ids.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Borrow the value stored in a leaf.
    pub fn value(&self, id: NodeId) -> Option<&T> {
        match self.nodes.get(&id) {
            Some(Node {
                kind: NodeKind::Leaf { value },
                ..
            }) => Some(value),
            _ => None,
        }
    }

    /// Mutably borrow the value stored in a leaf.
    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.nodes.get_mut(&id) {
            Some(Node {
                kind: NodeKind::Leaf { value },
                ..
            }) => Some(value),
            _ => None,
        }
    }

    /// Expand state of a folder. `false` for leaves and stale ids.
    pub fn is_open(&self, id: NodeId) -> bool {
        matches!(
            self.nodes.get(&id),
            Some(Node {
                kind: NodeKind::Folder { is_open: true, .. },
                ..
            })
        )
    }

    /// Set a folder's expand state. Open state is view-local bookkeeping and
    /// does not notify subscribers. Ignored for leaves and stale ids.
    pub fn set_open(&mut self, id: NodeId, open: bool) {
        if let Some(Node {
            kind: NodeKind::Folder { is_open, .. },
            ..
        }) = self.nodes.get_mut(&id)
        {
            *is_open = open;
        }
    }

    /// Derived `/`-joined full path, root excluded. `None` for stale ids.
    pub fn full_path(&self, id: NodeId) -> Option<String> {
        if !self.contains(id) {
            return None;
        }
        let mut parts = Vec::new();
        let mut cur = id;
        while let Some(node) = self.nodes.get(&cur) {
            match node.parent {
                Some(parent) => {
                    parts.push(node.name.as_str());
                    cur = parent;
                }
                None => break,
            }
        }
        parts.reverse();
        Some(parts.join("/"))
    }

    /// Resolve a full path back to a node id (case-insensitive walk).
    ///
    /// The empty path resolves to the root.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let mut cur = self.root;
        for seg in path.split('/').filter(|s| !s.is_empty()) {
            cur = self.child_by_name(cur, seg)?;
        }
        Some(cur)
    }

    /// A folder's children, copied out in the requested order.
    pub fn children(&self, folder: NodeId, sort: SortMode) -> Result<Vec<NodeId>> {
        let mut ids = self.folder_children(folder)?.to_vec();
        self.sort_ids(&mut ids, sort);
        Ok(ids)
    }

    /// All descendants of a folder in pre-order, each sibling level sorted.
    pub fn descendants(&self, folder: NodeId, sort: SortMode) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        self.collect_descendants(folder, sort, &mut out)?;
        Ok(out)
    }

    fn collect_descendants(
        &self,
        folder: NodeId,
        sort: SortMode,
        out: &mut Vec<NodeId>,
    ) -> Result<()> {
        for child in self.children(folder, sort)? {
            out.push(child);
            if self.is_folder(child) {
                self.collect_descendants(child, sort, out)?;
            }
        }
        Ok(())
    }

    /// Total number of nodes below a folder (its whole subtree, itself
    /// excluded). Zero for leaves and stale ids.
    pub fn total_descendants(&self, folder: NodeId) -> usize {
        let Ok(children) = self.folder_children(folder) else {
            return 0;
        };
        let mut count = 0;
        for child in children.to_vec() {
            count += 1 + self.total_descendants(child);
        }
        count
    }

    /// Whether `ancestor` lies strictly above `node` in the tree.
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = self.parent(node);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    /// Number of live nodes, root excluded.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether the store holds nothing but the root.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Case-insensitive full-path comparison, used to detect no-op moves.
    pub fn paths_equal(a: &str, b: &str) -> bool {
        let segs = |p: &str| {
            p.split('/')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_lowercase())
                .collect::<Vec<_>>()
        };
        segs(a) == segs(b)
    }

    // ── Mutations ────────────────────────────────────────────────────────

    /// Create a folder at `path`, creating missing intermediate folders.
    ///
    /// Idempotent: existing folder segments are reused. Fails with
    /// [`TreeError::NameCollision`] if any segment matches an existing
    /// sibling leaf.
    pub fn create_folder(&mut self, path: &str) -> Result<NodeId> {
        let segments = Self::split_path(path)?;
        let mut cur = self.root;
        for seg in segments {
            match self.child_by_name(cur, &seg) {
                Some(existing) if self.is_folder(existing) => cur = existing,
                Some(_) => return Err(TreeError::NameCollision { name: seg }),
                None => cur = self.new_folder_under(cur, seg),
            }
        }
        Ok(cur)
    }

    /// Insert a leaf at `path`, creating missing intermediate folders.
    ///
    /// The final name is auto-uniquified against existing siblings.
    pub fn insert_leaf(&mut self, path: &str, value: T) -> Result<NodeId> {
        let mut segments = Self::split_path(path)?;
        let name = segments.pop().ok_or_else(|| TreeError::InvalidPath {
            path: path.to_string(),
        })?;
        let parent = if segments.is_empty() {
            self.root
        } else {
            self.create_folder(&segments.join("/"))?
        };
        let unique = self.unique_child_name(parent, &name, None);
        let id = self.alloc_id();
        self.nodes.insert(
            id,
            Node {
                name: unique,
                parent: Some(parent),
                kind: NodeKind::Leaf { value },
            },
        );
        self.push_child(parent, id);
        self.notify(Change {
            kind: ChangeKind::Added,
            node: id,
            old_parent: None,
            new_parent: Some(parent),
        });
        Ok(id)
    }

    /// Re-parent `node` under `dest`.
    ///
    /// Rejects moves into the node's own subtree with [`TreeError::Cycle`]
    /// and leaves the tree unchanged. The name is auto-uniquified on
    /// collision; id and open state are preserved. Moving a node into its
    /// current parent is a structural no-op.
    pub fn move_node(&mut self, node: NodeId, dest: NodeId) -> Result<()> {
        if !self.contains(node) || !self.contains(dest) {
            return Err(TreeError::NotFound);
        }
        if node == self.root {
            return Err(TreeError::InvalidPath { path: "/".into() });
        }
        if !self.is_folder(dest) {
            return Err(TreeError::InvalidPath {
                path: self.full_path(dest).unwrap_or_default(),
            });
        }
        if dest == node || self.is_ancestor_of(node, dest) {
            return Err(TreeError::Cycle);
        }
        let old_parent = self.parent(node).ok_or(TreeError::NotFound)?;
        if old_parent == dest {
            return Ok(());
        }

        self.remove_child(old_parent, node);
        let current = self.name(node).unwrap_or_default().to_string();
        let unique = self.unique_child_name(dest, &current, Some(node));
        if let Some(n) = self.nodes.get_mut(&node) {
            n.name = unique;
            n.parent = Some(dest);
        }
        self.push_child(dest, node);
        self.notify(Change {
            kind: ChangeKind::Moved,
            node,
            old_parent: Some(old_parent),
            new_parent: Some(dest),
        });
        Ok(())
    }

    /// Rename a node in place.
    ///
    /// Fails with [`TreeError::NameCollision`] if another sibling already
    /// holds the name (case-insensitive). Renaming a node to a different
    /// casing of its own name is allowed.
    pub fn rename(&mut self, node: NodeId, new_name: &str) -> Result<()> {
        if !self.contains(node) {
            return Err(TreeError::NotFound);
        }
        if node == self.root {
            return Err(TreeError::InvalidPath { path: "/".into() });
        }
        if new_name.is_empty() || new_name.contains('/') {
            return Err(TreeError::InvalidPath {
                path: new_name.to_string(),
            });
        }
        let parent = self.parent(node).ok_or(TreeError::NotFound)?;
        if let Some(existing) = self.child_by_name(parent, new_name) {
            if existing != node {
                return Err(TreeError::NameCollision {
                    name: new_name.to_string(),
                });
            }
        }
        if let Some(n) = self.nodes.get_mut(&node) {
            n.name = new_name.to_string();
        }
        self.notify(Change {
            kind: ChangeKind::Moved,
            node,
            old_parent: Some(parent),
            new_parent: Some(parent),
        });
        Ok(())
    }

    /// Move and rename `node` so its full path becomes `new_full_path`.
    ///
    /// Decomposes the path into folder path + final name, then composes
    /// [`Self::create_folder`], [`Self::move_node`] and [`Self::rename`].
    pub fn rename_and_move(&mut self, node: NodeId, new_full_path: &str) -> Result<()> {
        let mut segments = Self::split_path(new_full_path)?;
        let name = segments.pop().ok_or_else(|| TreeError::InvalidPath {
            path: new_full_path.to_string(),
        })?;
        let dest = if segments.is_empty() {
            self.root
        } else {
            self.create_folder(&segments.join("/"))?
        };
        // Reject the final-name collision up front so a failed rename does
        // not leave the node moved but misnamed.
        if let Some(existing) = self.child_by_name(dest, &name) {
            if existing != node {
                return Err(TreeError::NameCollision { name });
            }
        }
        self.move_node(node, dest)?;
        if self.name(node) != Some(name.as_str()) {
            self.rename(node, &name)?;
        }
        Ok(())
    }

    /// Move all of `folder`'s children into `target_parent`, then delete
    /// the now-empty folder. No-op when `folder` is the root.
    pub fn merge(&mut self, folder: NodeId, target_parent: NodeId) -> Result<()> {
        if folder == self.root {
            return Ok(());
        }
        if !self.contains(folder) || !self.contains(target_parent) {
            return Err(TreeError::NotFound);
        }
        if !self.is_folder(folder) || !self.is_folder(target_parent) {
            return Err(TreeError::InvalidPath {
                path: self.full_path(folder).unwrap_or_default(),
            });
        }
        if target_parent == folder || self.is_ancestor_of(folder, target_parent) {
            return Err(TreeError::Cycle);
        }
        for child in self.folder_children(folder)?.to_vec() {
            self.move_node(child, target_parent)?;
        }
        self.delete(folder)
    }

    /// Delete a node and its entire subtree. No-op on the root.
    ///
    /// A `Removed` notification is emitted for every node taken out, the
    /// subtree root first, so subscribers holding ids never retain one that
    /// the store dropped as a side effect of an ancestor's deletion.
    pub fn delete(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Ok(());
        }
        if !self.contains(node) {
            return Err(TreeError::NotFound);
        }
        let old_parent = self.parent(node).ok_or(TreeError::NotFound)?;
        self.remove_child(old_parent, node);
        let mut doomed = vec![node];
        self.collect_subtree(node, &mut doomed);
        // Parents are still intact here; capture them before the removal so
        // each notification carries where its node used to hang.
        let removed: Vec<(NodeId, Option<NodeId>)> =
            doomed.iter().map(|&id| (id, self.parent(id))).collect();
        for &(id, _) in &removed {
            self.nodes.remove(&id);
        }
        for (id, parent) in removed {
            self.notify(Change {
                kind: ChangeKind::Removed,
                node: id,
                old_parent: parent,
                new_parent: None,
            });
        }
        Ok(())
    }

    // ── Subscription ────────────────────────────────────────────────────

    /// Register a synchronous change subscriber.
    ///
    /// Subscribers observe every change before the mutating call returns;
    /// there is no batching and no async delivery. The subscription lives
    /// for the store's lifetime.
    pub fn subscribe(&mut self, f: impl Fn(&Change) + 'static) {
        self.subscribers.push(Box::new(f));
    }

    /// Broadcast a full-reload notification (external bulk change).
    pub fn notify_reload(&self) {
        self.notify(Change {
            kind: ChangeKind::Reload,
            node: self.root,
            old_parent: None,
            new_parent: None,
        });
    }

    fn notify(&self, change: Change) {
        for sub in &self.subscribers {
            sub(&change);
        }
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn new_folder_under(&mut self, parent: NodeId, name: String) -> NodeId {
        let id = self.alloc_id();
        self.nodes.insert(
            id,
            Node {
                name,
                parent: Some(parent),
                kind: NodeKind::Folder {
                    children: Vec::new(),
                    is_open: false,
                },
            },
        );
        self.push_child(parent, id);
        self.notify(Change {
            kind: ChangeKind::Added,
            node: id,
            old_parent: None,
            new_parent: Some(parent),
        });
        id
    }

    fn folder_children(&self, id: NodeId) -> Result<&[NodeId]> {
        match self.nodes.get(&id) {
            Some(Node {
                kind: NodeKind::Folder { children, .. },
                ..
            }) => Ok(children),
            Some(_) => Err(TreeError::InvalidPath {
                path: self.full_path(id).unwrap_or_default(),
            }),
            None => Err(TreeError::NotFound),
        }
    }

    fn child_by_name(&self, folder: NodeId, name: &str) -> Option<NodeId> {
        let children = self.folder_children(folder).ok()?;
        let lower = name.to_lowercase();
        children
            .iter()
            .copied()
            .find(|c| self.name(*c).is_some_and(|n| n.to_lowercase() == lower))
    }

    /// Resolve a sibling name collision by appending `_copy`, `_copy2`, …
    /// `exclude` skips the node being moved so a node never collides with
    /// itself.
    fn unique_child_name(&self, folder: NodeId, desired: &str, exclude: Option<NodeId>) -> String {
        let taken = |name: &str| {
            self.child_by_name(folder, name)
                .is_some_and(|c| Some(c) != exclude)
        };
        if !taken(desired) {
            return desired.to_string();
        }
        let mut i = 1;
        loop {
            let candidate = if i == 1 {
                format!("{}_copy", desired)
            } else {
                format!("{}_copy{}", desired, i)
            };
            if !taken(&candidate) {
                return candidate;
            }
            i += 1;
        }
    }

    fn push_child(&mut self, folder: NodeId, child: NodeId) {
        if let Some(Node {
            kind: NodeKind::Folder { children, .. },
            ..
        }) = self.nodes.get_mut(&folder)
        {
            children.push(child);
        }
    }

    fn remove_child(&mut self, folder: NodeId, child: NodeId) {
        if let Some(Node {
            kind: NodeKind::Folder { children, .. },
            ..
        }) = self.nodes.get_mut(&folder)
        {
            children.retain(|c| *c != child);
        }
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if let Ok(children) = self.folder_children(id) {
            for child in children {
                out.push(*child);
                self.collect_subtree(*child, out);
            }
        }
    }

    fn sort_ids(&self, ids: &mut [NodeId], sort: SortMode) {
        match sort {
            SortMode::Insertion => {}
            SortMode::Name => ids.sort_by(|a, b| {
                let an = self.name(*a).unwrap_or_default().to_lowercase();
                let bn = self.name(*b).unwrap_or_default().to_lowercase();
                an.cmp(&bn)
            }),
            SortMode::FoldersFirst => ids.sort_by(|a, b| {
                self.is_folder(*b).cmp(&self.is_folder(*a)).then_with(|| {
                    let an = self.name(*a).unwrap_or_default().to_lowercase();
                    let bn = self.name(*b).unwrap_or_default().to_lowercase();
                    an.cmp(&bn)
                })
            }),
        }
    }

    fn split_path(path: &str) -> Result<Vec<String>> {
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            return Err(TreeError::InvalidPath {
                path: path.to_string(),
            });
        }
        Ok(segments)
    }
}

impl<T> Default for PathStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
