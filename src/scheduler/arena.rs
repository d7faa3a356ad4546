/*!
 * Share Arena
 * Generational slot storage for shares and their queue linkage
 */

use super::share::Share;
use super::types::Priority;
use crate::core::types::ShareId;

/// Queue a link currently belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueueId {
    /// Ready-claim queue of a priority
    Ready(Priority),
    /// Unready-claim queue of a priority
    Unready(Priority),
    /// Global fill queue
    Fill,
}

impl QueueId {
    #[inline(always)]
    pub(crate) fn kind(&self) -> LinkKind {
        match self {
            Self::Ready(_) | Self::Unready(_) => LinkKind::Claim,
            Self::Fill => LinkKind::Fill,
        }
    }
}

/// Which of the two per-share link slots a queue uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkKind {
    Claim,
    Fill,
}

/// Intrusive list linkage by arena index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Link {
    pub prev: Option<u32>,
    pub next: Option<u32>,
    pub owner: Option<QueueId>,
}

#[derive(Debug)]
struct Node {
    share: Share,
    claim: Link,
    fill: Link,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena of shares addressed by [`ShareId`]
#[derive(Debug)]
pub(crate) struct ShareArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl ShareArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            len: 0,
        }
    }

    /// Store a share and hand out its handle
    pub fn insert(&mut self, share: Share) -> ShareId {
        let node = Node {
            share,
            claim: Link::default(),
            fill: Link::default(),
        };
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return ShareId::new(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        ShareId::new(index, 0)
    }

    /// Drop a share, invalidating its handle
    pub fn remove(&mut self, id: ShareId) -> Option<Share> {
        let index = self.index_of(id)?;
        let slot = &mut self.slots[index as usize];
        let node = slot.node.take()?;
        debug_assert!(
            node.claim.owner.is_none() && node.fill.owner.is_none(),
            "{} removed while still queued",
            id
        );

        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.len -= 1;
        Some(node.share)
    }

    /// Resolve a handle to its slot index if it is still live
    #[inline]
    pub fn index_of(&self, id: ShareId) -> Option<u32> {
        let slot = self.slots.get(id.index() as usize)?;
        (slot.generation == id.generation() && slot.node.is_some()).then_some(id.index())
    }

    #[inline]
    pub fn contains(&self, id: ShareId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: ShareId) -> Option<&Share> {
        let index = self.index_of(id)?;
        Some(self.share(index))
    }

    /// Handle of a live slot
    #[inline]
    pub fn id_at(&self, index: u32) -> ShareId {
        ShareId::new(index, self.slots[index as usize].generation)
    }

    #[inline]
    pub fn share(&self, index: u32) -> &Share {
        &self.node(index).share
    }

    #[inline]
    pub fn share_mut(&mut self, index: u32) -> &mut Share {
        &mut self.node_mut(index).share
    }

    #[inline]
    pub fn link(&self, index: u32, kind: LinkKind) -> &Link {
        let node = self.node(index);
        match kind {
            LinkKind::Claim => &node.claim,
            LinkKind::Fill => &node.fill,
        }
    }

    #[inline]
    pub fn link_mut(&mut self, index: u32, kind: LinkKind) -> &mut Link {
        let node = self.node_mut(index);
        match kind {
            LinkKind::Claim => &mut node.claim,
            LinkKind::Fill => &mut node.fill,
        }
    }

    /// Live shares in slot order
    pub fn iter(&self) -> impl Iterator<Item = (ShareId, &Share)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node
                .as_ref()
                .map(|node| (ShareId::new(index as u32, slot.generation), &node.share))
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    fn node(&self, index: u32) -> &Node {
        match self.slots[index as usize].node.as_ref() {
            Some(node) => node,
            None => panic!("arena slot {} is vacant", index),
        }
    }

    fn node_mut(&mut self, index: u32) -> &mut Node {
        match self.slots[index as usize].node.as_mut() {
            Some(node) => node,
            None => panic!("arena slot {} is vacant", index),
        }
    }
}
