use std::ops::Deref;
use std::sync::Arc;

/// Ownership shape a message arrives in.
///
/// A transport may hand a callback an exclusively owned buffer or a shared
/// immutable one; either way the payload is readable through `Deref` without
/// copying, which is all the correlation engine needs (it only ever borrows
/// `&M` to extract a header stamp). A plain `&M` borrow is the third
/// supported shape and needs no wrapper.
#[derive(Debug)]
pub enum Envelope<M> {
    Owned(Box<M>),
    Shared(Arc<M>),
}

impl<M> Envelope<M> {
    pub fn owned(message: M) -> Self {
        Self::Owned(Box::new(message))
    }

    pub fn shared(message: Arc<M>) -> Self {
        Self::Shared(message)
    }
}

impl<M> Deref for Envelope<M> {
    type Target = M;

    fn deref(&self) -> &M {
        match self {
            Envelope::Owned(message) => message,
            Envelope::Shared(message) => message,
        }
    }
}

impl<M> AsRef<M> for Envelope<M> {
    fn as_ref(&self) -> &M {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_shapes_borrow_without_copy() {
        let owned = Envelope::owned(41u64);
        let shared = Envelope::shared(Arc::new(42u64));
        assert_eq!(*owned, 41);
        assert_eq!(*shared, 42);
        assert_eq!(shared.as_ref(), &42);
    }
}
