//! Persistent red-black tree.
//!
//! Insertion and deletion follow Kahrs' functional formulation: `balance`
//! repairs a red-red violation below a black node, `balance_left` and
//! `balance_right` repair a black-height deficit after deletion, and
//! `append` joins the two subtrees of a deleted node.
//!
//! The tree is edited through `&mut Link` slots. Like trie nodes, tree nodes
//! record the batch that created them and are mutated in place only under
//! that batch; any other node on the path is copied first.

use std::borrow::Borrow;
use std::cmp::Ordering;

use super::comparator::Comparator;
use super::context::{EditId, Merger, UpdateContext};
use super::{Entry, ReferenceCounter};

// =============================================================================
// Node Definition
// =============================================================================

pub(crate) type TreeRef<K, V> = ReferenceCounter<TreeNode<K, V>>;
pub(crate) type Link<K, V> = Option<TreeRef<K, V>>;

/// The color of a red-black tree node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Color {
    Red,
    Black,
}

/// Internal node structure for the red-black tree.
#[derive(Clone)]
pub(crate) struct TreeNode<K, V> {
    owner: EditId,
    color: Color,
    pub(super) entry: Entry<K, V>,
    pub(super) left: Link<K, V>,
    pub(super) right: Link<K, V>,
}

/// Outcome of an insertion.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Insertion {
    /// The merger declined; the tree is untouched.
    Unchanged,
    /// An existing entry was replaced.
    Replaced,
    /// A new key was added.
    Added,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Side {
    Left,
    Right,
}

/// Red-red violation below a black-position node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Violation {
    BothChildren,
    LeftLeft,
    LeftRight,
    RightRight,
    RightLeft,
    Settled,
}

fn is_red<K, V>(link: &Link<K, V>) -> bool {
    link.as_ref().is_some_and(|node| node.color == Color::Red)
}

fn is_black_node<K, V>(link: &Link<K, V>) -> bool {
    link.as_ref().is_some_and(|node| node.color == Color::Black)
}

// =============================================================================
// Read-only operations
// =============================================================================

impl<K, V> TreeNode<K, V> {
    const fn child(&self, side: Side) -> &Link<K, V> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    const fn child_mut(&mut self, side: Side) -> &mut Link<K, V> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    fn violation(&self) -> Violation {
        let left_red = is_red(&self.left);
        let right_red = is_red(&self.right);
        if left_red && right_red {
            return Violation::BothChildren;
        }
        if left_red && let Some(left) = &self.left {
            if is_red(&left.left) {
                return Violation::LeftLeft;
            }
            if is_red(&left.right) {
                return Violation::LeftRight;
            }
        }
        if right_red && let Some(right) = &self.right {
            if is_red(&right.right) {
                return Violation::RightRight;
            }
            if is_red(&right.left) {
                return Violation::RightLeft;
            }
        }
        Violation::Settled
    }

    /// Binary search for `key`.
    pub(crate) fn find<'a, Q, C>(
        root: Option<&'a Self>,
        comparator: &C,
        key: &Q,
    ) -> Option<&'a Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let mut node = root;
        while let Some(current) = node {
            node = match comparator.compare(key, current.entry.key().borrow()) {
                Ordering::Less => current.left.as_deref(),
                Ordering::Greater => current.right.as_deref(),
                Ordering::Equal => return Some(&current.entry),
            };
        }
        None
    }

    /// Leftmost entry.
    pub(crate) fn first(root: Option<&Self>) -> Option<&Entry<K, V>> {
        let mut node = root?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some(&node.entry)
    }

    /// Rightmost entry.
    pub(crate) fn last(root: Option<&Self>) -> Option<&Entry<K, V>> {
        let mut node = root?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some(&node.entry)
    }
}

// =============================================================================
// Editing operations
// =============================================================================

impl<K: Clone, V: Clone> TreeNode<K, V> {
    fn owned_mut(slot: &mut TreeRef<K, V>, edit: EditId) -> Option<&mut Self> {
        if slot.owner == edit {
            ReferenceCounter::get_mut(slot)
        } else {
            None
        }
    }

    fn edit_in(slot: &mut TreeRef<K, V>, edit: EditId) -> &mut Self {
        if slot.owner != edit {
            let copy = Self {
                owner: edit,
                ..(**slot).clone()
            };
            *slot = ReferenceCounter::new(copy);
        }
        ReferenceCounter::make_mut(slot)
    }

    fn paint(slot: &mut TreeRef<K, V>, edit: EditId, color: Color) {
        if slot.color != color {
            Self::edit_in(slot, edit).color = color;
        }
    }

    fn paint_link(link: &mut Link<K, V>, edit: EditId, color: Color) {
        if let Some(slot) = link.as_mut() {
            Self::paint(slot, edit, color);
        }
    }

    fn take_child(slot: &mut TreeRef<K, V>, edit: EditId, side: Side) -> Link<K, V> {
        Self::edit_in(slot, edit).child_mut(side).take()
    }

    /// `X(a, Y(b, c))` becomes `Y(X(a, b), c)`. Colors stay with their nodes.
    fn rotate_left(slot: &mut TreeRef<K, V>, edit: EditId) {
        let node = Self::edit_in(slot, edit);
        let Some(mut pivot) = node.right.take() else {
            return;
        };
        node.right = Self::take_child(&mut pivot, edit, Side::Left);
        std::mem::swap(slot, &mut pivot);
        Self::edit_in(slot, edit).left = Some(pivot);
    }

    /// `Y(X(a, b), c)` becomes `X(a, Y(b, c))`. Colors stay with their nodes.
    fn rotate_right(slot: &mut TreeRef<K, V>, edit: EditId) {
        let node = Self::edit_in(slot, edit);
        let Some(mut pivot) = node.left.take() else {
            return;
        };
        node.left = Self::take_child(&mut pivot, edit, Side::Right);
        std::mem::swap(slot, &mut pivot);
        Self::edit_in(slot, edit).right = Some(pivot);
    }

    /// Paints the node red and both children black.
    fn split_colors(slot: &mut TreeRef<K, V>, edit: EditId) {
        let node = Self::edit_in(slot, edit);
        node.color = Color::Red;
        Self::paint_link(&mut node.left, edit, Color::Black);
        Self::paint_link(&mut node.right, edit, Color::Black);
    }

    /// Repairs a red-red violation in the children of a black-position node.
    ///
    /// The node ends red with black children if a violation was found, and
    /// black otherwise.
    fn balance(slot: &mut TreeRef<K, V>, edit: EditId) {
        match slot.violation() {
            Violation::BothChildren => {}
            Violation::LeftLeft => Self::rotate_right(slot, edit),
            Violation::LeftRight => {
                if let Some(left) = Self::edit_in(slot, edit).left.as_mut() {
                    Self::rotate_left(left, edit);
                }
                Self::rotate_right(slot, edit);
            }
            Violation::RightRight => Self::rotate_left(slot, edit),
            Violation::RightLeft => {
                if let Some(right) = Self::edit_in(slot, edit).right.as_mut() {
                    Self::rotate_right(right, edit);
                }
                Self::rotate_left(slot, edit);
            }
            Violation::Settled => {
                Self::paint(slot, edit, Color::Black);
                return;
            }
        }
        Self::split_colors(slot, edit);
    }

    /// Restores black height after the left subtree lost one black level.
    fn balance_left(slot: &mut TreeRef<K, V>, edit: EditId) {
        if is_red(&slot.left) {
            let node = Self::edit_in(slot, edit);
            node.color = Color::Red;
            Self::paint_link(&mut node.left, edit, Color::Black);
        } else if is_black_node(&slot.right) {
            Self::paint_link(&mut Self::edit_in(slot, edit).right, edit, Color::Red);
            Self::balance(slot, edit);
        } else if let Some(right) = slot.right.as_deref()
            && right.color == Color::Red
            && is_black_node(&right.left)
        {
            if let Some(right) = Self::edit_in(slot, edit).right.as_mut() {
                Self::paint_link(&mut Self::edit_in(right, edit).right, edit, Color::Red);
                Self::rotate_right(right, edit);
            }
            Self::rotate_left(slot, edit);
            let top = Self::edit_in(slot, edit);
            top.color = Color::Red;
            Self::paint_link(&mut top.left, edit, Color::Black);
            if let Some(sibling) = top.right.as_mut() {
                Self::balance(sibling, edit);
            }
        } else {
            debug_assert!(false, "red-black invariant violated before balance_left");
        }
    }

    /// Restores black height after the right subtree lost one black level.
    fn balance_right(slot: &mut TreeRef<K, V>, edit: EditId) {
        if is_red(&slot.right) {
            let node = Self::edit_in(slot, edit);
            node.color = Color::Red;
            Self::paint_link(&mut node.right, edit, Color::Black);
        } else if is_black_node(&slot.left) {
            Self::paint_link(&mut Self::edit_in(slot, edit).left, edit, Color::Red);
            Self::balance(slot, edit);
        } else if let Some(left) = slot.left.as_deref()
            && left.color == Color::Red
            && is_black_node(&left.right)
        {
            if let Some(left) = Self::edit_in(slot, edit).left.as_mut() {
                Self::paint_link(&mut Self::edit_in(left, edit).left, edit, Color::Red);
                Self::rotate_left(left, edit);
            }
            Self::rotate_right(slot, edit);
            let top = Self::edit_in(slot, edit);
            top.color = Color::Red;
            Self::paint_link(&mut top.right, edit, Color::Black);
            if let Some(sibling) = top.left.as_mut() {
                Self::balance(sibling, edit);
            }
        } else {
            debug_assert!(false, "red-black invariant violated before balance_right");
        }
    }

    /// Joins two subtrees whose keys are ordered `left < right` and whose
    /// black heights are equal.
    fn append(left: Link<K, V>, right: Link<K, V>, edit: EditId) -> Link<K, V> {
        let (mut left, mut right) = match (left, right) {
            (None, right) => return right,
            (left, None) => return left,
            (Some(left), Some(right)) => (left, right),
        };
        match (left.color, right.color) {
            (Color::Red, Color::Red) | (Color::Black, Color::Black) => {
                let both_red = left.color == Color::Red;
                let inner = Self::append(
                    Self::take_child(&mut left, edit, Side::Right),
                    Self::take_child(&mut right, edit, Side::Left),
                    edit,
                );
                match inner {
                    Some(mut middle) if middle.color == Color::Red => {
                        let middle_node = Self::edit_in(&mut middle, edit);
                        Self::edit_in(&mut left, edit).right = middle_node.left.take();
                        Self::edit_in(&mut right, edit).left = middle_node.right.take();
                        middle_node.left = Some(left);
                        middle_node.right = Some(right);
                        Some(middle)
                    }
                    inner => {
                        Self::edit_in(&mut right, edit).left = inner;
                        Self::edit_in(&mut left, edit).right = Some(right);
                        if !both_red {
                            Self::balance_left(&mut left, edit);
                        }
                        Some(left)
                    }
                }
            }
            (Color::Black, Color::Red) => {
                let inner = Self::take_child(&mut right, edit, Side::Left);
                let joined = Self::append(Some(left), inner, edit);
                Self::edit_in(&mut right, edit).left = joined;
                Some(right)
            }
            (Color::Red, Color::Black) => {
                let inner = Self::take_child(&mut left, edit, Side::Right);
                let joined = Self::append(inner, Some(right), edit);
                Self::edit_in(&mut left, edit).right = joined;
                Some(left)
            }
        }
    }

    /// Runs `operation` on one child link of `slot`.
    ///
    /// An owned node is edited in place. Otherwise the child is detached,
    /// edited, and written back into a copy of the node only if `touched`
    /// reports a change.
    fn with_child<R>(
        slot: &mut TreeRef<K, V>,
        edit: EditId,
        side: Side,
        operation: impl FnOnce(&mut Link<K, V>) -> R,
        touched: impl FnOnce(&R) -> bool,
    ) -> R {
        if let Some(node) = Self::owned_mut(slot, edit) {
            return operation(node.child_mut(side));
        }
        let mut child = slot.child(side).clone();
        let outcome = operation(&mut child);
        if touched(&outcome) {
            *Self::edit_in(slot, edit).child_mut(side) = child;
        }
        outcome
    }

    fn insert<C, M>(
        link: &mut Link<K, V>,
        context: &mut UpdateContext<M>,
        comparator: &C,
        entry: Entry<K, V>,
    ) -> Insertion
    where
        C: Comparator<K>,
        M: Merger<K, V>,
    {
        let edit = context.edit();
        let Some(slot) = link.as_mut() else {
            context.insert(&entry);
            *link = Some(ReferenceCounter::new(Self {
                owner: edit,
                color: Color::Red,
                entry,
                left: None,
                right: None,
            }));
            return Insertion::Added;
        };
        let side = match comparator.compare(entry.key(), slot.entry.key()) {
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
            Ordering::Equal => {
                if !context.merge(&slot.entry, &entry) {
                    return Insertion::Unchanged;
                }
                Self::edit_in(slot, edit).entry = entry;
                return Insertion::Replaced;
            }
        };
        let black = slot.color == Color::Black;
        let outcome = Self::with_child(
            slot,
            edit,
            side,
            |child| Self::insert(child, context, comparator, entry),
            |outcome| *outcome != Insertion::Unchanged,
        );
        if black && outcome == Insertion::Added {
            Self::balance(slot, edit);
        }
        outcome
    }

    fn remove<Q, C, M>(
        link: &mut Link<K, V>,
        context: &mut UpdateContext<M>,
        comparator: &C,
        key: &Q,
    ) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
        M: Merger<K, V>,
    {
        let edit = context.edit();
        let Some(slot) = link.as_mut() else {
            return false;
        };
        let side = match comparator.compare(key, slot.entry.key().borrow()) {
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
            Ordering::Equal => {
                context.delete(&slot.entry);
                let (left, right) = match Self::owned_mut(slot, edit) {
                    Some(node) => (node.left.take(), node.right.take()),
                    None => (slot.left.clone(), slot.right.clone()),
                };
                *link = Self::append(left, right, edit);
                return true;
            }
        };
        let descended_black = is_black_node(slot.child(side));
        let found = Self::with_child(
            slot,
            edit,
            side,
            |child| Self::remove(child, context, comparator, key),
            |found| *found,
        );
        if !found {
            return false;
        }
        match (descended_black, side) {
            (true, Side::Left) => Self::balance_left(slot, edit),
            (true, Side::Right) => Self::balance_right(slot, edit),
            (false, _) => Self::paint(slot, edit, Color::Red),
        }
        true
    }

    /// Inserts `entry` below `root` and repaints the root black.
    pub(crate) fn insert_root<C, M>(
        root: &mut Link<K, V>,
        context: &mut UpdateContext<M>,
        comparator: &C,
        entry: Entry<K, V>,
    ) -> Insertion
    where
        C: Comparator<K>,
        M: Merger<K, V>,
    {
        let outcome = Self::insert(root, context, comparator, entry);
        if outcome == Insertion::Added {
            Self::paint_link(root, context.edit(), Color::Black);
        }
        outcome
    }

    /// Removes `key` below `root` and repaints the root black. Returns `true`
    /// if the key was present.
    pub(crate) fn remove_root<Q, C, M>(
        root: &mut Link<K, V>,
        context: &mut UpdateContext<M>,
        comparator: &C,
        key: &Q,
    ) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
        M: Merger<K, V>,
    {
        let found = Self::remove(root, context, comparator, key);
        if found {
            Self::paint_link(root, context.edit(), Color::Black);
        }
        found
    }
}

// =============================================================================
// Structural checks
// =============================================================================

#[cfg(test)]
impl<K, V> TreeNode<K, V> {
    /// Asserts the red-black invariants below `link` and returns its black height.
    pub(crate) fn black_height<C: Comparator<K>>(link: &Link<K, V>, comparator: &C) -> usize {
        let Some(node) = link else {
            return 1;
        };
        if node.color == Color::Red {
            assert!(
                !is_red(&node.left) && !is_red(&node.right),
                "red node with a red child"
            );
        }
        if let Some(left) = &node.left {
            assert_eq!(
                comparator.compare(left.entry.key(), node.entry.key()),
                Ordering::Less
            );
        }
        if let Some(right) = &node.right {
            assert_eq!(
                comparator.compare(right.entry.key(), node.entry.key()),
                Ordering::Greater
            );
        }
        let left_height = Self::black_height(&node.left, comparator);
        let right_height = Self::black_height(&node.right, comparator);
        assert_eq!(left_height, right_height, "unequal black height");
        left_height + usize::from(node.color == Color::Black)
    }

    pub(crate) fn is_black(link: &Link<K, V>) -> bool {
        link.as_ref().is_none_or(|node| node.color == Color::Black)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistent::{KeepExisting, NaturalOrder};
    use proptest::prelude::*;
    use rstest::rstest;

    type Root = Link<i32, i32>;

    fn insert(root: &mut Root, context: &mut UpdateContext, key: i32) -> Insertion {
        TreeNode::insert_root(root, context, &NaturalOrder, Entry::new(key, key * 2))
    }

    fn remove(root: &mut Root, context: &mut UpdateContext, key: i32) -> bool {
        TreeNode::remove_root(root, context, &NaturalOrder, &key)
    }

    fn keys(root: &Root) -> Vec<i32> {
        fn walk(link: &Root, into: &mut Vec<i32>) {
            if let Some(node) = link {
                walk(&node.left, into);
                into.push(*node.entry.key());
                walk(&node.right, into);
            }
        }
        let mut into = Vec::new();
        walk(root, &mut into);
        into
    }

    fn check(root: &Root) {
        assert!(TreeNode::is_black(root), "red root");
        TreeNode::black_height(root, &NaturalOrder);
    }

    #[rstest]
    fn test_ascending_inserts_stay_balanced() {
        let mut root = None;
        let mut context = UpdateContext::new(1);
        for key in 0..1000 {
            assert_eq!(insert(&mut root, &mut context, key), Insertion::Added);
            check(&root);
        }
        assert_eq!(keys(&root), (0..1000).collect::<Vec<_>>());
        assert!(TreeNode::black_height(&root, &NaturalOrder) <= 11);
    }

    #[rstest]
    fn test_replace_and_declined_merge() {
        let mut root = None;
        let mut context = UpdateContext::new(1);
        insert(&mut root, &mut context, 1);
        assert_eq!(
            TreeNode::insert_root(&mut root, &mut context, &NaturalOrder, Entry::new(1, 7)),
            Insertion::Replaced
        );
        assert_eq!(TreeNode::find(root.as_deref(), &NaturalOrder, &1).map(|entry| *entry.value()), Some(7));

        let mut keep = UpdateContext::with_merger(1, KeepExisting);
        let before = root.clone().unwrap();
        assert_eq!(
            TreeNode::insert_root(&mut root, &mut keep, &NaturalOrder, Entry::new(1, 9)),
            Insertion::Unchanged
        );
        assert!(ReferenceCounter::ptr_eq(&before, root.as_ref().unwrap()));
    }

    #[rstest]
    fn test_remove_every_other_key() {
        let mut root = None;
        let mut context = UpdateContext::new(1);
        for key in 0..200 {
            insert(&mut root, &mut context, key);
        }
        for key in (0..200).step_by(2) {
            assert!(remove(&mut root, &mut context, key));
            check(&root);
        }
        assert_eq!(keys(&root), (1..200).step_by(2).collect::<Vec<_>>());
        assert!(!remove(&mut root, &mut context, 0));
    }

    #[rstest]
    fn test_remove_to_empty() {
        let mut root = None;
        let mut context = UpdateContext::new(1);
        for key in [5, 3, 8, 1, 4, 7, 9] {
            insert(&mut root, &mut context, key);
        }
        for key in [5, 1, 9, 3, 8, 4, 7] {
            assert!(remove(&mut root, &mut context, key));
            check(&root);
        }
        assert!(root.is_none());
    }

    #[rstest]
    fn test_absent_removal_leaves_tree_untouched() {
        let mut root = None;
        let mut context = UpdateContext::new(1);
        for key in 0..50 {
            insert(&mut root, &mut context, key * 2);
        }
        context.commit();
        let before = root.clone().unwrap();

        let mut other = UpdateContext::new(1);
        assert!(!remove(&mut root, &mut other, 13));
        assert_eq!(other.take_change(), 0);
        assert!(ReferenceCounter::ptr_eq(&before, root.as_ref().unwrap()));
    }

    #[rstest]
    fn test_foreign_batch_preserves_snapshot() {
        let mut root = None;
        let mut context = UpdateContext::new(1);
        for key in 0..100 {
            insert(&mut root, &mut context, key);
        }
        context.commit();
        let snapshot = root.clone();

        let mut next = UpdateContext::new(1);
        for key in 0..50 {
            remove(&mut root, &mut next, key);
        }
        insert(&mut root, &mut next, 1000);

        assert_eq!(keys(&snapshot), (0..100).collect::<Vec<_>>());
        check(&snapshot);
        assert_eq!(keys(&root).len(), 51);
        check(&root);
    }

    fn node_addresses(link: &Root, into: &mut std::collections::HashSet<*const TreeNode<i32, i32>>) {
        if let Some(node) = link {
            into.insert(ReferenceCounter::as_ptr(node));
            node_addresses(&node.left, into);
            node_addresses(&node.right, into);
        }
    }

    #[rstest]
    #[case(1999)]
    #[case(-1)]
    #[case(501)]
    fn test_insert_shares_untouched_subtrees(#[case] added: i32) {
        let mut root = None;
        let mut context = UpdateContext::new(1000);
        for key in (0..1000).map(|key| key * 2) {
            insert(&mut root, &mut context, key);
        }
        context.commit();
        let snapshot = root.clone();

        let mut next = UpdateContext::new(1);
        assert_eq!(insert(&mut root, &mut next, added), Insertion::Added);
        next.commit();

        let mut old_nodes = std::collections::HashSet::new();
        node_addresses(&snapshot, &mut old_nodes);
        let mut new_nodes = std::collections::HashSet::new();
        node_addresses(&root, &mut new_nodes);

        let fresh = new_nodes.difference(&old_nodes).count();
        assert_eq!(new_nodes.len(), 1001);
        assert!(fresh > 0);
        assert!(fresh <= 64, "{fresh} nodes copied");
        assert!(new_nodes.intersection(&old_nodes).count() >= 1001 - 64);
        check(&snapshot);
        assert_eq!(keys(&snapshot).len(), 1000);
    }

    #[rstest]
    fn test_first_and_last() {
        let mut root = None;
        let mut context = UpdateContext::new(1);
        assert!(TreeNode::first(root.as_deref()).is_none());
        for key in [40, 10, 30, 20, 50] {
            insert(&mut root, &mut context, key);
        }
        assert_eq!(TreeNode::first(root.as_deref()).map(|entry| *entry.key()), Some(10));
        assert_eq!(TreeNode::last(root.as_deref()).map(|entry| *entry.key()), Some(50));
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Insert(i32),
        Remove(i32),
    }

    fn operation() -> impl Strategy<Value = Operation> {
        prop_oneof![
            (0..64i32).prop_map(Operation::Insert),
            (0..64i32).prop_map(Operation::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_invariants_hold_and_match_btree(
            operations in prop::collection::vec(operation(), 0..200),
            batch_size in 1usize..8
        ) {
            let mut root: Root = None;
            let mut model = std::collections::BTreeMap::new();
            for chunk in operations.chunks(batch_size) {
                let mut context = UpdateContext::new(chunk.len());
                for operation in chunk {
                    match operation {
                        Operation::Insert(key) => {
                            insert(&mut root, &mut context, *key);
                            model.insert(*key, *key * 2);
                        }
                        Operation::Remove(key) => {
                            let found = remove(&mut root, &mut context, *key);
                            prop_assert_eq!(found, model.remove(key).is_some());
                        }
                    }
                }
                context.commit();
                prop_assert!(TreeNode::is_black(&root));
                TreeNode::black_height(&root, &NaturalOrder);
            }
            prop_assert_eq!(keys(&root), model.keys().copied().collect::<Vec<_>>());
        }
    }
}
