//! Back/forward navigation history.

use crate::backend::parent_of;
use std::path::{Path, PathBuf};

/// Browser-style history: a current path plus back and forward stacks.
///
/// Any navigation that records history clears the forward stack. Every
/// operation reports whether the current path changed, so callers know when
/// to re-query.
#[derive(Debug, Clone, Default)]
pub struct NavigationHistory {
    current: Option<PathBuf>,
    back: Vec<PathBuf>,
    forward: Vec<PathBuf>,
}

impl NavigationHistory {
    /// Start a history at `start`
    pub fn new(start: impl Into<PathBuf>) -> Self {
        NavigationHistory {
            current: Some(start.into()),
            back: Vec::new(),
            forward: Vec::new(),
        }
    }

    /// The current path, if any navigation has happened
    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    /// Move to `path`.
    ///
    /// With `record`, the previous path is pushed onto the back stack and the
    /// forward stack is cleared. A fresh history has nothing to push.
    pub fn navigate_to(&mut self, path: impl Into<PathBuf>, record: bool) -> bool {
        let path = path.into();
        let changed = self.current.as_deref() != Some(path.as_path());
        if record {
            if let Some(previous) = self.current.take() {
                self.back.push(previous);
            }
            self.forward.clear();
        }
        self.current = Some(path);
        changed
    }

    /// Step back one entry. No-op if the back stack is empty.
    pub fn go_back(&mut self) -> bool {
        let Some(target) = self.back.pop() else {
            return false;
        };
        if let Some(current) = self.current.replace(target) {
            self.forward.push(current);
        }
        true
    }

    /// Step forward one entry. No-op if the forward stack is empty.
    pub fn go_forward(&mut self) -> bool {
        let Some(target) = self.forward.pop() else {
            return false;
        };
        if let Some(current) = self.current.replace(target) {
            self.back.push(current);
        }
        true
    }

    /// Navigate (recording history) to the parent of the current path.
    ///
    /// No-op at a filesystem root.
    pub fn go_up(&mut self) -> bool {
        let parent = self.current.as_deref().and_then(parent_of);
        match parent {
            Some(parent) => self.navigate_to(parent, true),
            None => false,
        }
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    /// Back stack, most recent first
    pub fn back_stack(&self) -> Vec<&Path> {
        self.back.iter().rev().map(PathBuf::as_path).collect()
    }

    /// Forward stack, next destination first
    pub fn forward_stack(&self) -> Vec<&Path> {
        self.forward.iter().rev().map(PathBuf::as_path).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_and_forward() {
        let (a, b, c) = (Path::new("/a"), Path::new("/a/b"), Path::new("/c"));
        let mut history = NavigationHistory::new(a);

        assert!(history.navigate_to(b, true));
        assert!(history.navigate_to(c, true));
        assert_eq!(history.back_stack(), vec![b, a]);

        assert!(history.go_back());
        assert_eq!(history.current(), Some(b));
        assert_eq!(history.forward_stack(), vec![c]);

        assert!(history.go_back());
        assert_eq!(history.current(), Some(a));
        assert_eq!(history.forward_stack(), vec![b, c]);
        assert!(!history.can_go_back());

        assert!(history.go_forward());
        assert_eq!(history.current(), Some(b));
        assert_eq!(history.forward_stack(), vec![c]);
        assert!(history.can_go_back());
    }

    #[test]
    fn test_recording_navigation_clears_forward() {
        let mut history = NavigationHistory::new("/a");
        history.navigate_to("/b", true);
        history.go_back();
        assert!(history.can_go_forward());

        history.navigate_to("/d", true);
        assert!(!history.can_go_forward());
        assert_eq!(history.back_stack(), vec![Path::new("/a")]);
    }

    #[test]
    fn test_unrecorded_navigation() {
        let mut history = NavigationHistory::new("/a");
        history.navigate_to("/b", true);
        history.go_back();

        assert!(history.navigate_to("/x", false));
        assert_eq!(history.current(), Some(Path::new("/x")));
        assert!(!history.can_go_back());
        assert!(history.can_go_forward());

        assert!(!history.navigate_to("/x", false));
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut history = NavigationHistory::new("/a");
        assert!(!history.go_back());
        assert!(!history.go_forward());
        assert_eq!(history.current(), Some(Path::new("/a")));
    }

    #[test]
    fn test_fresh_history_pushes_nothing() {
        let mut history = NavigationHistory::default();
        assert!(history.current().is_none());
        history.navigate_to("/start", true);
        assert!(!history.can_go_back());
    }

    #[test]
    fn test_go_up() {
        let mut history = NavigationHistory::new("/a/b");
        assert!(history.go_up());
        assert_eq!(history.current(), Some(Path::new("/a")));
        assert!(history.go_up());
        assert_eq!(history.current(), Some(Path::new("/")));
        assert!(!history.go_up());
        assert_eq!(history.back_stack(), vec![Path::new("/a"), Path::new("/a/b")]);

        assert!(history.go_back());
        assert_eq!(history.current(), Some(Path::new("/a")));
    }
}
