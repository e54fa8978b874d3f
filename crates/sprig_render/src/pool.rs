//! Reusable-object pools
//!
//! Pools hand out previously released instances before constructing new ones, so hot paths
//! (per-frame points, matrices, mesh batches) stop churning the allocator.
//!
//! Release is explicit: either hand the object back with [`ObjectPool::put_object`] or hold it in
//! a [`Pooled`] guard, which returns it on drop. Anything leaked or `into_inner`'d is simply not
//! reused.

use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::{
        LazyLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{
    error::{Error, Result},
    math::{Matrix2D, Point},
};

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// A pool of reusable `T`s
///
/// The free list sits behind a mutex, so a pool of `Send` objects can be shared across threads
/// and objects may be returned from a different thread than the one that took them.
pub struct ObjectPool<T> {
    free: Mutex<Vec<T>>,
    factory: Factory<T>,
    max_buffer: usize,
    created: AtomicUsize,
}

impl<T> ObjectPool<T> {
    /// Creates a pool; `max_buffer` caps the free list, `0` means unbounded
    pub fn new(factory: impl Fn() -> T + Send + Sync + 'static, max_buffer: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            factory: Box::new(factory),
            max_buffer,
            created: AtomicUsize::new(0),
        }
    }

    pub fn builder() -> ObjectPoolBuilder<T> {
        ObjectPoolBuilder::default()
    }

    /// Pops a free object, or constructs a new one when the free list is empty
    pub fn get_object(&self) -> T {
        if let Some(item) = self.free.lock().pop() {
            return item;
        }
        self.created.fetch_add(1, Ordering::Relaxed);
        (self.factory)()
    }

    /// Returns an object to the free list
    ///
    /// Returns false (and drops the object) if the free list is already at `max_buffer`
    pub fn put_object(&self, item: T) -> bool {
        let mut free = self.free.lock();
        if self.max_buffer == 0 || free.len() < self.max_buffer {
            free.push(item);
            return true;
        }
        drop(free);
        log::trace!("pool full ({} objects), dropping returned object", self.max_buffer);
        false
    }

    /// Checks out an object wrapped in a guard that returns it on drop
    pub fn acquire(&self) -> Pooled<'_, T> {
        Pooled {
            pool: self,
            item: Some(self.get_object()),
        }
    }

    /// Like [`acquire`](Self::acquire), but initializes the object with caller values first
    pub fn acquire_with(&self, init: impl FnOnce(&mut T)) -> Pooled<'_, T> {
        let mut item = self.get_object();
        init(&mut item);
        Pooled {
            pool: self,
            item: Some(item),
        }
    }

    /// Number of objects currently waiting in the free list
    pub fn free_len(&self) -> usize {
        self.free.lock().len()
    }

    /// Total number of objects the factory has constructed
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    pub fn max_buffer(&self) -> usize {
        self.max_buffer
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("free", &self.free_len())
            .field("created", &self.created())
            .field("max_buffer", &self.max_buffer)
            .finish()
    }
}

/// Builder for [`ObjectPool`]; a factory is mandatory
pub struct ObjectPoolBuilder<T> {
    factory: Option<Factory<T>>,
    max_buffer: usize,
}

impl<T> Default for ObjectPoolBuilder<T> {
    fn default() -> Self {
        Self {
            factory: None,
            max_buffer: 0,
        }
    }
}

impl<T> ObjectPoolBuilder<T> {
    pub fn factory(mut self, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    pub fn max_buffer(mut self, max_buffer: usize) -> Self {
        self.max_buffer = max_buffer;
        self
    }

    pub fn build(self) -> Result<ObjectPool<T>> {
        let factory = self.factory.ok_or(Error::MissingFactory)?;
        Ok(ObjectPool {
            free: Mutex::new(Vec::new()),
            factory,
            max_buffer: self.max_buffer,
            created: AtomicUsize::new(0),
        })
    }
}

/// An object checked out of a pool, returned when the guard drops
pub struct Pooled<'a, T> {
    pool: &'a ObjectPool<T>,
    item: Option<T>,
}

impl<T> Pooled<'_, T> {
    /// Takes the object out of the guard; it will not go back to the pool
    pub fn into_inner(mut self) -> T {
        // Only `Drop` ever empties `item`
        self.item.take().unwrap()
    }
}

impl<T> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item.as_ref().unwrap()
    }
}

impl<T> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().unwrap()
    }
}

impl<T: fmt::Debug> fmt::Debug for Pooled<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.item.fmt(f)
    }
}

impl<T> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.put_object(item);
        }
    }
}

static POINTS: LazyLock<ObjectPool<Point>> = LazyLock::new(|| ObjectPool::new(Point::default, 0));
static MATRICES: LazyLock<ObjectPool<Matrix2D>> =
    LazyLock::new(|| ObjectPool::new(Matrix2D::default, 0));

/// Process-wide pool backing [`Point::create`]
pub fn points() -> &'static ObjectPool<Point> {
    &POINTS
}

/// Process-wide pool backing [`Matrix2D::create`]
pub fn matrices() -> &'static ObjectPool<Matrix2D> {
    &MATRICES
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[derive(Default)]
    struct Blob {
        bytes: Vec<u8>,
    }

    #[test]
    fn put_then_get_reuses_instance() {
        let pool = ObjectPool::new(|| Box::new(Blob::default()), 0);
        let mut blob = pool.get_object();
        blob.bytes.push(7);
        let addr = &*blob as *const Blob;

        assert!(pool.put_object(blob));
        let again = pool.get_object();
        assert_eq!(&*again as *const Blob, addr);
        assert_eq!(again.bytes, [7]);
        assert_eq!(pool.created(), 1);
    }

    #[test]
    fn max_buffer_caps_free_list() {
        let pool = ObjectPool::new(Blob::default, 2);
        let items: Vec<_> = (0..3).map(|_| pool.get_object()).collect();
        let kept: Vec<bool> = items.into_iter().map(|b| pool.put_object(b)).collect();

        assert_eq!(kept, [true, true, false]);
        assert_eq!(pool.free_len(), 2);
    }

    #[test]
    fn builder_without_factory_fails() {
        let pool = ObjectPool::<Blob>::builder().max_buffer(4).build();
        assert_eq!(pool.err(), Some(Error::MissingFactory));

        let pool = ObjectPool::builder()
            .factory(Blob::default)
            .max_buffer(4)
            .build()
            .unwrap();
        assert_eq!(pool.max_buffer(), 4);
    }

    #[test]
    fn guard_returns_on_drop() {
        let pool = ObjectPool::new(Blob::default, 0);
        {
            let mut blob = pool.acquire_with(|b| b.bytes.push(1));
            blob.bytes.push(2);
            assert_eq!(pool.free_len(), 0);
        }
        assert_eq!(pool.free_len(), 1);

        let kept = pool.acquire().into_inner();
        assert_eq!(kept.bytes, [1, 2]);
        assert_eq!(pool.free_len(), 0);
    }

    #[test]
    fn objects_can_return_from_other_threads() {
        let pool = Arc::new(ObjectPool::new(Blob::default, 0));
        let taken: Vec<_> = (0..8).map(|_| pool.get_object()).collect();

        let handles: Vec<_> = taken
            .into_iter()
            .map(|blob| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || pool.put_object(blob))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        assert_eq!(pool.free_len(), 8);
        assert_eq!(pool.created(), 8);
    }
}
