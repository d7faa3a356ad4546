/*!
 * Share Queues
 * Doubly linked lists threaded through the share arena
 */

use super::arena::{LinkKind, QueueId, ShareArena};

/// FIFO of shares with O(1) splicing at both ends and in the middle
#[derive(Debug, Clone)]
pub(crate) struct ShareQueue {
    id: QueueId,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

impl ShareQueue {
    pub fn new(id: QueueId) -> Self {
        Self {
            id,
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline(always)]
    fn kind(&self) -> LinkKind {
        self.id.kind()
    }

    #[inline(always)]
    pub fn head(&self) -> Option<u32> {
        self.head
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn contains(&self, arena: &ShareArena, index: u32) -> bool {
        arena.link(index, self.kind()).owner == Some(self.id)
    }

    pub fn push_head(&mut self, arena: &mut ShareArena, index: u32) {
        self.claim_link(arena, index);
        let old_head = self.head;
        {
            let link = arena.link_mut(index, self.kind());
            link.prev = None;
            link.next = old_head;
        }
        match old_head {
            Some(head) => arena.link_mut(head, self.kind()).prev = Some(index),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
        self.len += 1;
    }

    pub fn push_tail(&mut self, arena: &mut ShareArena, index: u32) {
        self.claim_link(arena, index);
        let old_tail = self.tail;
        {
            let link = arena.link_mut(index, self.kind());
            link.prev = old_tail;
            link.next = None;
        }
        match old_tail {
            Some(tail) => arena.link_mut(tail, self.kind()).next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
    }

    pub fn remove(&mut self, arena: &mut ShareArena, index: u32) {
        let kind = self.kind();
        let link = *arena.link(index, kind);
        assert_eq!(
            link.owner,
            Some(self.id),
            "{} unlinked from {:?} but belongs to {:?}",
            arena.id_at(index),
            self.id,
            link.owner
        );

        match link.prev {
            Some(prev) => arena.link_mut(prev, kind).next = link.next,
            None => self.head = link.next,
        }
        match link.next {
            Some(next) => arena.link_mut(next, kind).prev = link.prev,
            None => self.tail = link.prev,
        }
        *arena.link_mut(index, kind) = Default::default();
        self.len -= 1;
    }

    /// Move a member to the tail, keeping the order of everything else
    pub fn to_tail(&mut self, arena: &mut ShareArena, index: u32) {
        if self.tail == Some(index) {
            return;
        }
        self.remove(arena, index);
        self.push_tail(arena, index);
    }

    /// Move a member to the head, keeping the order of everything else
    pub fn to_head(&mut self, arena: &mut ShareArena, index: u32) {
        if self.head == Some(index) {
            return;
        }
        self.remove(arena, index);
        self.push_head(arena, index);
    }

    /// Successor of a member
    #[inline]
    pub fn next(&self, arena: &ShareArena, index: u32) -> Option<u32> {
        arena.link(index, self.kind()).next
    }

    /// Member indices from head to tail
    pub fn iter<'a>(&self, arena: &'a ShareArena) -> Iter<'a> {
        Iter {
            arena,
            kind: self.kind(),
            cursor: self.head,
        }
    }

    fn claim_link(&self, arena: &mut ShareArena, index: u32) {
        let link = arena.link_mut(index, self.kind());
        assert!(
            link.owner.is_none(),
            "share already linked into {:?}",
            link.owner
        );
        link.owner = Some(self.id);
    }
}

pub(crate) struct Iter<'a> {
    arena: &'a ShareArena,
    kind: LinkKind,
    cursor: Option<u32>,
}

impl Iterator for Iter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let index = self.cursor?;
        self.cursor = self.arena.link(index, self.kind).next;
        Some(index)
    }
}
