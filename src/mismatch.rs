//! Observability for unions that resolve to nothing.
//!
//! A union that matches no shape decodes to `None`, and one whose branches
//! all reject the input decodes to an all-absent value. Neither is an error,
//! so without a hook schema drift is silent apart from debug logs.
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use crate::decode::ShapeKind;
use crate::mode::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The input was not an object, array, string, number or boolean.
    NoShape,
    /// Every branch rejected the input.
    NoBranch,
}

#[derive(Debug, Clone)]
pub struct Mismatch {
    pub type_name: &'static str,
    pub mode: Mode,
    pub shape: Option<ShapeKind>,
    pub reason: Reason,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.reason, self.shape) {
            (Reason::NoBranch, Some(shape)) => write!(
                f,
                "no {} branch of {} accepted the {shape} input",
                self.mode, self.type_name
            ),
            _ => write!(f, "input has no shape {} can represent", self.type_name),
        }
    }
}

type Hook = Arc<dyn Fn(&Mismatch) + Send + Sync>;

static HOOK: Lazy<RwLock<Option<Hook>>> = Lazy::new(Default::default);

/// Installs a process-wide observer, replacing any previous one.
pub fn set_mismatch_hook(hook: impl Fn(&Mismatch) + Send + Sync + 'static) {
    *HOOK.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(hook));
}

pub fn clear_mismatch_hook() {
    *HOOK.write().unwrap_or_else(PoisonError::into_inner) = None;
}

pub(crate) fn report(mismatch: Mismatch) {
    log::debug!("{mismatch}");
    // the lock is released before the hook runs
    let hook = HOOK.read().unwrap_or_else(PoisonError::into_inner).clone();
    if let Some(hook) = hook {
        hook(&mismatch);
    }
}
