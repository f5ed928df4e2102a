/// Handle-indexed resource tables.
///
/// Every registry in the renderer (buffers, textures, lights) is a `ResourceTable`:
/// a slot vector plus a free list. Handles are plain integers so callers can store
/// them in draw calls without lifetimes. Freeing a slot drops its contents, so a
/// re-allocated handle always starts from a freshly constructed value.
use super::error::{RenderError, RenderResult};
use std::fmt;

/// Opaque integer handle into one registry.
pub trait ResourceId: Copy + Eq + fmt::Debug {
    /// Human-readable registry name used in error messages.
    const KIND: &'static str;

    fn from_index(index: u32) -> Self;
    fn index(self) -> u32;
}

macro_rules! resource_id {
    ($name:ident, $kind:expr) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl ResourceId for $name {
            const KIND: &'static str = $kind;

            #[inline]
            fn from_index(index: u32) -> Self {
                Self(index)
            }

            #[inline]
            fn index(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }
    };
}

resource_id!(VertexBufferId, "vertex buffer");
resource_id!(AttributeBufferId, "attribute buffer");
resource_id!(IndexBufferId, "index buffer");
resource_id!(UniformBufferId, "uniform buffer");
resource_id!(ObjectTextureId, "object texture");
resource_id!(RenderLightId, "light");

/// Slot table with a LIFO free list.
pub struct ResourceTable<I: ResourceId, T> {
    slots: Vec<Option<T>>,
    free: Vec<u32>,
    capacity: usize,
    live: usize,
    _id: std::marker::PhantomData<I>,
}

impl<I: ResourceId, T> ResourceTable<I, T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            capacity,
            live: 0,
            _id: std::marker::PhantomData,
        }
    }

    /// Store a value and return its handle. Fails once `capacity` values are live.
    pub fn insert(&mut self, value: T) -> RenderResult<I> {
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(value);
            self.live += 1;
            return Ok(I::from_index(index));
        }

        if self.slots.len() >= self.capacity {
            log::warn!("{} table exhausted ({} live)", I::KIND, self.live);
            return Err(RenderError::ResourceExhausted {
                kind: I::KIND,
                capacity: self.capacity,
            });
        }

        let index = self.slots.len() as u32;
        self.slots.push(Some(value));
        self.live += 1;
        Ok(I::from_index(index))
    }

    #[inline]
    pub fn get(&self, id: I) -> RenderResult<&T> {
        self.slots
            .get(id.index() as usize)
            .and_then(Option::as_ref)
            .ok_or(RenderError::InvalidHandle {
                kind: I::KIND,
                id: id.index(),
            })
    }

    #[inline]
    pub fn get_mut(&mut self, id: I) -> RenderResult<&mut T> {
        self.slots
            .get_mut(id.index() as usize)
            .and_then(Option::as_mut)
            .ok_or(RenderError::InvalidHandle {
                kind: I::KIND,
                id: id.index(),
            })
    }

    /// Drop the value behind `id`. Returns the removed value.
    pub fn remove(&mut self, id: I) -> RenderResult<T> {
        let slot = self
            .slots
            .get_mut(id.index() as usize)
            .ok_or(RenderError::InvalidHandle {
                kind: I::KIND,
                id: id.index(),
            })?;

        let value = slot.take().ok_or(RenderError::InvalidHandle {
            kind: I::KIND,
            id: id.index(),
        })?;

        self.free.push(id.index());
        self.live -= 1;
        Ok(value)
    }

    #[inline]
    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_ok()
    }

    /// Number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (I::from_index(i as u32), v)))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(Option::as_ref)
    }
}
