//! Recursion guard for self-referential unions.
//!
//! A union type is never tried as a branch of itself while it is being
//! decoded on the same thread. The set is thread-local: decodes running on
//! other threads (rayon workers, tokio blocking tasks) keep their own.
use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashSet;
use std::marker::PhantomData;

thread_local! {
    static IN_PROGRESS: RefCell<HashSet<TypeId>> = RefCell::new(HashSet::new());
}

/// Marks a type as being decoded until dropped.
///
/// Only the token that inserted the entry removes it, so nested decodes of
/// the same type and unwinding panics both leave the set consistent.
#[must_use]
pub struct InProgress {
    type_id: TypeId,
    owned: bool,
    // tied to the thread whose set it modified
    _not_send: PhantomData<*const ()>,
}

impl InProgress {
    pub fn enter(type_id: TypeId) -> Self {
        let owned = IN_PROGRESS
            .try_with(|set| set.borrow_mut().insert(type_id))
            .unwrap_or(false);
        Self {
            type_id,
            owned,
            _not_send: PhantomData,
        }
    }
}

impl Drop for InProgress {
    fn drop(&mut self) {
        if self.owned {
            let _ = IN_PROGRESS.try_with(|set| set.borrow_mut().remove(&self.type_id));
        }
    }
}

pub fn is_in_progress(type_id: TypeId) -> bool {
    IN_PROGRESS
        .try_with(|set| set.borrow().contains(&type_id))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;
    struct Other;

    #[test]
    fn entry_lives_as_long_as_the_token() {
        let id = TypeId::of::<Marker>();
        assert!(!is_in_progress(id));
        {
            let _outer = InProgress::enter(id);
            assert!(is_in_progress(id));
            {
                let _nested = InProgress::enter(id);
                assert!(is_in_progress(id));
            }
            // the nested token did not own the entry
            assert!(is_in_progress(id));
            assert!(!is_in_progress(TypeId::of::<Other>()));
        }
        assert!(!is_in_progress(id));
    }

    #[test]
    fn entry_is_removed_when_unwinding() {
        let id = TypeId::of::<Other>();
        let result = std::panic::catch_unwind(|| {
            let _token = InProgress::enter(id);
            panic!("decode blew up");
        });
        assert!(result.is_err());
        assert!(!is_in_progress(id));
    }

    #[test]
    fn other_threads_have_their_own_set() {
        let id = TypeId::of::<Marker>();
        let _token = InProgress::enter(id);
        let seen_elsewhere = std::thread::spawn(move || is_in_progress(id)).join().unwrap();
        assert!(!seen_elsewhere);
        assert!(is_in_progress(id));
    }
}
