use std::cell::OnceCell;

/// A flat copy of a container's in-order contents, rebuilt lazily.
///
/// Mutations call [`invalidate`](Snapshot::invalidate); the next read rebuilds the copy once.
#[derive(Clone)]
pub(crate) struct Snapshot<T> {
    cached: OnceCell<Vec<T>>,
}

impl<T> Snapshot<T> {
    pub(crate) fn new() -> Self {
        Self {
            cached: OnceCell::new(),
        }
    }

    pub(crate) fn invalidate(&mut self) {
        if self.cached.take().is_some() {
            tracing::trace!("snapshot invalidated");
        }
    }

    #[cfg(test)]
    pub(crate) fn is_valid(&self) -> bool {
        self.cached.get().is_some()
    }

    pub(crate) fn get_or_build<F>(&self, build: F) -> &[T]
    where
        F: FnOnce() -> Vec<T>,
    {
        self.cached.get_or_init(build)
    }
}

#[cfg(test)]
mod tests {
    use super::Snapshot;

    #[test]
    fn test_rebuilds_once_per_invalidation() {
        let mut builds = 0;
        let mut snapshot = Snapshot::new();
        assert!(!snapshot.is_valid());
        assert_eq!(
            snapshot.get_or_build(|| {
                builds += 1;
                vec![1, 2]
            }),
            &[1, 2]
        );
        assert_eq!(snapshot.get_or_build(|| vec![3]), &[1, 2]);
        assert_eq!(builds, 1);

        snapshot.invalidate();
        assert!(!snapshot.is_valid());
        assert_eq!(snapshot.get_or_build(|| vec![3]), &[3]);
    }
}
