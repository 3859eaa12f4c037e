//! Variable orders and variable groups.
//!
//! A [`VariableOrder`] is the bijection between variable indices and levels
//! of one variable space. It changes only when variables are appended or
//! when reordering permutes levels; apply never touches it.
//!
//! Groups form a tree of contiguous level ranges. A group moves as a unit
//! during reordering; a [`GroupKind::Fixed`] group additionally keeps its
//! internal order.

use std::collections::BTreeSet;

use crate::types::{Level, Var};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableOrder {
    /// `perm[var] = level`
    perm: Vec<Level>,
    /// `invperm[level] = var`
    invperm: Vec<Var>,
}

impl VariableOrder {
    /// The identity order over `n` variables.
    pub fn new(n: usize) -> Self {
        Self {
            perm: (0..n).map(Level::new).collect(),
            invperm: (0..n as u32).map(Var::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.invperm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invperm.is_empty()
    }

    #[inline]
    pub fn level(&self, var: Var) -> Level {
        self.perm[var.as_usize()]
    }

    #[inline]
    pub fn var_at(&self, level: Level) -> Var {
        self.invperm[level.index()]
    }

    /// Variables from the top level down.
    pub fn vars(&self) -> &[Var] {
        &self.invperm
    }

    /// Appends a new variable at the bottom level and returns it.
    pub fn push(&mut self) -> Var {
        let var = Var::new(self.perm.len() as u32);
        self.perm.push(Level::new(self.invperm.len()));
        self.invperm.push(var);
        var
    }

    /// Creates a new variable at `level`, shifting the levels below it down.
    pub fn insert(&mut self, level: Level) -> Var {
        let var = Var::new(self.perm.len() as u32);
        self.invperm.insert(level.index(), var);
        self.perm.push(level);
        for (l, &v) in self.invperm.iter().enumerate().skip(level.index()) {
            self.perm[v.as_usize()] = Level::new(l);
        }
        var
    }

    /// Exchanges the variables at `level` and `level + 1`.
    pub fn swap_adjacent(&mut self, level: Level) {
        let (i, j) = (level.index(), level.index() + 1);
        self.invperm.swap(i, j);
        self.perm[self.invperm[i].as_usize()] = Level::new(i);
        self.perm[self.invperm[j].as_usize()] = Level::new(j);
    }

    /// Checks that `vars` lists every variable exactly once.
    pub fn is_permutation(&self, vars: &[Var]) -> bool {
        if vars.len() != self.len() {
            return false;
        }
        let mut seen = vec![false; self.len()];
        for v in vars {
            match seen.get_mut(v.as_usize()) {
                Some(s) if !*s => *s = true,
                _ => return false,
            }
        }
        true
    }

    /// The order that results from placing `vars` top-down.
    pub fn from_vars(vars: &[Var]) -> Self {
        let mut perm = vec![Level::new(0); vars.len()];
        for (l, v) in vars.iter().enumerate() {
            perm[v.as_usize()] = Level::new(l);
        }
        Self {
            perm,
            invperm: vars.to_vec(),
        }
    }
}

/// Whether a group may be reordered internally.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GroupKind {
    /// Members may be permuted among themselves.
    Default,
    /// Internal order is frozen.
    Fixed,
}

/// A snapshot of a variable group, members listed top-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarGroup {
    pub vars: Vec<Var>,
    pub kind: GroupKind,
    pub children: Vec<VarGroup>,
}

#[derive(Debug, Clone)]
pub(crate) struct GroupNode {
    pub(crate) members: BTreeSet<Var>,
    pub(crate) kind: GroupKind,
    pub(crate) children: Vec<GroupNode>,
}

impl GroupNode {
    /// Topmost level currently occupied by the group.
    pub(crate) fn top(&self, order: &VariableOrder) -> Level {
        self.members.iter().map(|&v| order.level(v)).min().unwrap_or(Level::new(0))
    }

    pub(crate) fn size(&self) -> usize {
        self.members.len()
    }

    fn is_contiguous(&self, order: &VariableOrder) -> bool {
        let top = self.top(order).index();
        self.members.iter().all(|&v| {
            let l = order.level(v).index();
            l >= top && l < top + self.size()
        })
    }

    fn snapshot(&self, order: &VariableOrder) -> VarGroup {
        let mut vars: Vec<Var> = self.members.iter().copied().collect();
        vars.sort_by_key(|&v| order.level(v));
        let mut children: Vec<VarGroup> = self.children.iter().map(|c| c.snapshot(order)).collect();
        children.sort_by_key(|c| c.vars.first().map(|&v| order.level(v)));
        VarGroup {
            vars,
            kind: self.kind,
            children,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct GroupTree {
    pub(crate) roots: Vec<GroupNode>,
}

impl GroupTree {
    /// Adds a group of the variables currently at `size` levels starting at `top`.
    pub(crate) fn insert(&mut self, order: &VariableOrder, top: Level, size: usize, kind: GroupKind) -> Result<(), String> {
        if size == 0 {
            return Err("group must not be empty".to_string());
        }
        if top.index() + size > order.len() {
            return Err(format!("group {}..{} exceeds {} levels", top.index(), top.index() + size, order.len()));
        }
        let members: BTreeSet<Var> = (top.index()..top.index() + size).map(|l| order.var_at(Level::new(l))).collect();
        insert_into(
            &mut self.roots,
            GroupNode {
                members,
                kind,
                children: Vec::new(),
            },
        )
    }

    /// Checks that every group occupies contiguous levels under `order`.
    pub(crate) fn is_respected_by(&self, order: &VariableOrder) -> bool {
        fn check(nodes: &[GroupNode], order: &VariableOrder) -> bool {
            nodes.iter().all(|n| n.is_contiguous(order) && check(&n.children, order))
        }
        check(&self.roots, order)
    }

    /// Checks that moving from `current` to `target` keeps every group
    /// contiguous and every fixed group in its internal order.
    pub(crate) fn allows(&self, current: &VariableOrder, target: &VariableOrder) -> bool {
        fn check(nodes: &[GroupNode], current: &VariableOrder, target: &VariableOrder) -> bool {
            nodes.iter().all(|n| {
                let frozen = n.kind != GroupKind::Fixed || {
                    let mut before: Vec<Var> = n.members.iter().copied().collect();
                    let mut after = before.clone();
                    before.sort_by_key(|&v| current.level(v));
                    after.sort_by_key(|&v| target.level(v));
                    before == after
                };
                frozen && n.is_contiguous(target) && check(&n.children, current, target)
            })
        }
        check(&self.roots, current, target)
    }

    /// Returns `true` if inserting a new level at `level` would split a group.
    pub(crate) fn splits_at(&self, order: &VariableOrder, level: Level) -> bool {
        fn check(nodes: &[GroupNode], order: &VariableOrder, level: usize) -> bool {
            nodes.iter().any(|n| {
                let top = n.top(order).index();
                (top < level && level < top + n.size()) || check(&n.children, order, level)
            })
        }
        check(&self.roots, order, level.index())
    }

    pub(crate) fn snapshot(&self, order: &VariableOrder) -> Vec<VarGroup> {
        let mut groups: Vec<VarGroup> = self.roots.iter().map(|g| g.snapshot(order)).collect();
        groups.sort_by_key(|g| g.vars.first().map(|&v| order.level(v)));
        groups
    }
}

fn insert_into(siblings: &mut Vec<GroupNode>, mut node: GroupNode) -> Result<(), String> {
    for sibling in siblings.iter_mut() {
        if node.members == sibling.members {
            return Err("group already exists".to_string());
        }
        if node.members.is_subset(&sibling.members) {
            return insert_into(&mut sibling.children, node);
        }
    }
    let overlapping = siblings
        .iter()
        .any(|s| !s.members.is_subset(&node.members) && !s.members.is_disjoint(&node.members));
    if overlapping {
        return Err("group overlaps an existing group".to_string());
    }
    let mut outside = Vec::new();
    for sibling in siblings.drain(..) {
        if sibling.members.is_subset(&node.members) {
            node.children.push(sibling);
        } else {
            outside.push(sibling);
        }
    }
    outside.push(node);
    *siblings = outside;
    Ok(())
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_identity_order() {
        let order = VariableOrder::new(3);
        for i in 0..3 {
            assert_eq!(order.level(Var::new(i)), Level::new(i as usize));
            assert_eq!(order.var_at(Level::new(i as usize)), Var::new(i));
        }
    }

    #[test]
    fn test_swap_adjacent() {
        let mut order = VariableOrder::new(3);
        order.swap_adjacent(Level::new(1));
        assert_eq!(order.vars(), &[Var::new(0), Var::new(2), Var::new(1)]);
        assert_eq!(order.level(Var::new(2)), Level::new(1));
        assert_eq!(order.level(Var::new(1)), Level::new(2));
    }

    #[test]
    fn test_insert_shifts_levels() {
        let mut order = VariableOrder::new(3);
        let v = order.insert(Level::new(1));
        assert_eq!(v, Var::new(3));
        assert_eq!(order.vars(), &[Var::new(0), Var::new(3), Var::new(1), Var::new(2)]);
        assert_eq!(order.level(Var::new(2)), Level::new(3));
    }

    #[test]
    fn test_is_permutation() {
        let order = VariableOrder::new(3);
        assert!(order.is_permutation(&[Var::new(2), Var::new(0), Var::new(1)]));
        assert!(!order.is_permutation(&[Var::new(2), Var::new(2), Var::new(1)]));
        assert!(!order.is_permutation(&[Var::new(0), Var::new(1)]));
        assert!(!order.is_permutation(&[Var::new(0), Var::new(1), Var::new(7)]));
    }

    #[test]
    fn test_group_nesting() {
        let order = VariableOrder::new(6);
        let mut tree = GroupTree::default();
        tree.insert(&order, Level::new(0), 4, GroupKind::Default).unwrap();
        tree.insert(&order, Level::new(0), 2, GroupKind::Fixed).unwrap();
        tree.insert(&order, Level::new(4), 2, GroupKind::Default).unwrap();

        let groups = tree.snapshot(&order);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].vars.len(), 4);
        assert_eq!(groups[0].children.len(), 1);
        assert_eq!(groups[0].children[0].kind, GroupKind::Fixed);

        // An enclosing group adopts existing groups.
        tree.insert(&order, Level::new(0), 6, GroupKind::Default).unwrap();
        assert_eq!(tree.snapshot(&order).len(), 1);
    }

    #[test]
    fn test_group_overlap_rejected() {
        let order = VariableOrder::new(4);
        let mut tree = GroupTree::default();
        tree.insert(&order, Level::new(0), 2, GroupKind::Default).unwrap();
        assert!(tree.insert(&order, Level::new(1), 2, GroupKind::Default).is_err());
        assert!(tree.insert(&order, Level::new(0), 2, GroupKind::Default).is_err());
        assert!(tree.insert(&order, Level::new(3), 2, GroupKind::Default).is_err());
    }

    #[test]
    fn test_fixed_group_order_is_frozen() {
        let order = VariableOrder::new(4);
        let mut tree = GroupTree::default();
        tree.insert(&order, Level::new(0), 2, GroupKind::Fixed).unwrap();
        tree.insert(&order, Level::new(2), 2, GroupKind::Default).unwrap();

        let swapped_default = VariableOrder::from_vars(&[Var::new(0), Var::new(1), Var::new(3), Var::new(2)]);
        assert!(tree.allows(&order, &swapped_default));
        let moved_blocks = VariableOrder::from_vars(&[Var::new(2), Var::new(3), Var::new(0), Var::new(1)]);
        assert!(tree.allows(&order, &moved_blocks));
        let swapped_fixed = VariableOrder::from_vars(&[Var::new(1), Var::new(0), Var::new(2), Var::new(3)]);
        assert!(!tree.allows(&order, &swapped_fixed));
        let split = VariableOrder::from_vars(&[Var::new(0), Var::new(2), Var::new(1), Var::new(3)]);
        assert!(!tree.allows(&order, &split));
    }

    #[test]
    fn test_group_contiguity() {
        let mut order = VariableOrder::new(4);
        let mut tree = GroupTree::default();
        tree.insert(&order, Level::new(1), 2, GroupKind::Default).unwrap();
        assert!(tree.is_respected_by(&order));
        assert!(tree.splits_at(&order, Level::new(2)));
        assert!(!tree.splits_at(&order, Level::new(1)));

        order.swap_adjacent(Level::new(0));
        assert!(!tree.is_respected_by(&order));
    }
}
