//! The visitor's path stack: `(key_id, array_index)` frames, serialized by
//! joining decoded key names with `/`.
//!
//! Grounded on `original_source/src/include/core/carbon/archive_visitor.h`'s
//! `archive_visitor_path_to_string`/`_compare` helpers. The source's
//! push/pop around object-array drill-down is asymmetric in places; this
//! module resolves that with an RAII guard instead: every push returns a
//! [`PathGuard`] whose `Drop` pops exactly once, on every exit path
//! (normal return, early `?`, or panic unwinding).

use std::cell::RefCell;

use crate::ids::StringId;
use crate::json::StringLookup;

/// One path-stack frame: a key, and (for object-array descent) the
/// group-local index of the contributing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathFrame {
    pub key: StringId,
    pub array_index: Option<u32>,
}

/// The visitor driver's path stack. Owned exclusively by the driver and
/// never shared with callbacks beyond a borrow.
///
/// Frames live behind a `RefCell` so that [`Path::push`] can hand back a
/// [`PathGuard`] borrowing `Path` immutably: callbacks need to read the
/// path (via `&Path`) for the entire scope the guard covers, which an
/// exclusively-`&mut`-borrowing guard would otherwise make impossible.
#[derive(Debug, Default)]
pub struct Path {
    frames: RefCell<Vec<PathFrame>>,
}

impl Path {
    #[must_use]
    pub fn new() -> Self {
        Self { frames: RefCell::new(Vec::new()) }
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    #[must_use]
    pub fn frames(&self) -> Vec<PathFrame> {
        self.frames.borrow().clone()
    }

    /// Pushes one frame, returning a guard that pops it on drop. Callers
    /// must keep the guard alive for exactly the scope of the subtree it
    /// covers; dropping it early (or `std::mem::forget`-ing it) breaks the
    /// push/pop balance invariant.
    #[must_use]
    pub fn push(&self, key: StringId, array_index: Option<u32>) -> PathGuard<'_> {
        self.frames.borrow_mut().push(PathFrame { key, array_index });
        PathGuard { path: self }
    }

    /// Serializes the path by joining decoded key names with `/`: `/` for
    /// the root, otherwise `/key1/key2/…` with `array_index` concatenated
    /// for object-array positions. Duplicate separators are not collapsed.
    #[must_use]
    pub fn to_string(&self, lookup: &dyn StringLookup) -> String {
        let frames = self.frames.borrow();
        if frames.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for frame in frames.iter() {
            out.push('/');
            out.push_str(lookup.resolve(frame.key).unwrap_or("?"));
            if let Some(index) = frame.array_index {
                out.push_str(&index.to_string());
            }
        }
        out
    }

    /// Whether this path's decoded string form equals `pattern`, e.g.
    /// `path.matches("/items2/name", &dict)`.
    #[must_use]
    pub fn matches(&self, pattern: &str, lookup: &dyn StringLookup) -> bool {
        self.to_string(lookup) == pattern
    }
}

/// RAII guard popping its [`Path`] frame on drop.
pub struct PathGuard<'a> {
    path: &'a Path,
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        self.path.frames.borrow_mut().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::{MemoryStringDict, StringInterner};

    #[test]
    fn push_pop_balance_holds_across_nesting() {
        let mut dict = MemoryStringDict::new();
        let a = dict.intern("a");
        let b = dict.intern("b");
        let path = Path::new();
        assert_eq!(path.depth(), 0);
        {
            let _g1 = path.push(a, None);
            assert_eq!(path.depth(), 1);
            {
                let _g2 = path.push(b, Some(2));
                assert_eq!(path.depth(), 2);
                assert_eq!(path.to_string(&dict), "/a/b2");
            }
            assert_eq!(path.depth(), 1);
        }
        assert_eq!(path.depth(), 0);
        assert_eq!(path.to_string(&dict), "/");
    }

    #[test]
    fn guard_pops_even_on_early_return() {
        fn returns_early(path: &mut Path, key: StringId) -> bool {
            let _guard = path.push(key, None);
            if true {
                return true; // guard must still pop when this function returns
            }
            #[allow(unreachable_code)]
            false
        }
        let mut dict = MemoryStringDict::new();
        let k = dict.intern("k");
        let mut path = Path::new();
        assert!(returns_early(&mut path, k));
        assert_eq!(path.depth(), 0);
    }

    #[test]
    fn matches_compares_against_a_decoded_string_pattern() {
        let mut dict = MemoryStringDict::new();
        let items = dict.intern("items");
        let name = dict.intern("name");
        let path = Path::new();
        let _g1 = path.push(items, Some(2));
        let _g2 = path.push(name, None);
        assert!(path.matches("/items2/name", &dict));
        assert!(!path.matches("/items2/other", &dict));
        assert!(!path.matches("/items/name", &dict));
    }
}
