use std::collections::HashMap;

use ancora_primitives::{ContractAddress, Word256};

/// Transaction-local storage overlay, with one layer per active call
/// frame (spec.md §4.6 "Call"). Reads check frames from innermost to
/// outermost before falling back to persistent storage; writes always go
/// to the innermost frame and only become visible to the parent frame if
/// that frame returns normally.
#[derive(Debug, Default)]
pub struct OverlayStack {
    frames: Vec<HashMap<(ContractAddress, Word256), Word256>>,
}

impl OverlayStack {
    pub fn new() -> Self {
        Self { frames: vec![HashMap::new()] }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Merges the top frame into its parent. Called when a nested call
    /// returns normally.
    pub fn pop_frame_merge(&mut self) {
        let top = self.frames.pop().expect("overlay stack always has a root frame");
        if let Some(parent) = self.frames.last_mut() {
            parent.extend(top);
        } else {
            self.frames.push(top);
        }
    }

    /// Drops the top frame entirely. Called when a nested call reverts.
    pub fn pop_frame_discard(&mut self) {
        self.frames.pop();
        if self.frames.is_empty() {
            self.frames.push(HashMap::new());
        }
    }

    pub fn get(&self, key: (ContractAddress, Word256)) -> Option<Word256> {
        self.frames.iter().rev().find_map(|f| f.get(&key).copied())
    }

    pub fn set(&mut self, key: (ContractAddress, Word256), value: Word256) {
        self.frames.last_mut().expect("overlay stack always has a root frame").insert(key, value);
    }

    /// Consumes the stack and returns the root frame's writes, for the
    /// caller to persist on successful transaction commit (spec.md §4.6
    /// "Store... persisted only on successful transaction commit"). Every
    /// nested frame must already have merged or been discarded back down to
    /// the root by the time a transaction finishes.
    pub fn into_root_writes(mut self) -> HashMap<(ContractAddress, Word256), Word256> {
        debug_assert_eq!(self.frames.len(), 1, "overlay must be back at the root frame to commit");
        self.frames.pop().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> ContractAddress {
        ContractAddress::new([b; 20])
    }

    #[test]
    fn nested_write_visible_to_self_not_yet_merged() {
        let mut stack = OverlayStack::new();
        stack.set((addr(1), [0u8; 32]), [1u8; 32]);
        stack.push_frame();
        assert_eq!(stack.get((addr(1), [0u8; 32])), Some([1u8; 32]));
        stack.set((addr(1), [0u8; 32]), [2u8; 32]);
        assert_eq!(stack.get((addr(1), [0u8; 32])), Some([2u8; 32]));
    }

    #[test]
    fn discard_reverts_nested_write() {
        let mut stack = OverlayStack::new();
        stack.set((addr(1), [0u8; 32]), [1u8; 32]);
        stack.push_frame();
        stack.set((addr(1), [0u8; 32]), [9u8; 32]);
        stack.pop_frame_discard();
        assert_eq!(stack.get((addr(1), [0u8; 32])), Some([1u8; 32]));
    }

    #[test]
    fn merge_keeps_nested_write() {
        let mut stack = OverlayStack::new();
        stack.push_frame();
        stack.set((addr(1), [0u8; 32]), [9u8; 32]);
        stack.pop_frame_merge();
        assert_eq!(stack.get((addr(1), [0u8; 32])), Some([9u8; 32]));
    }

    #[test]
    fn into_root_writes_exposes_committed_entries() {
        let mut stack = OverlayStack::new();
        stack.set((addr(1), [0u8; 32]), [1u8; 32]);
        stack.set((addr(2), [1u8; 32]), [2u8; 32]);
        let writes = stack.into_root_writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes.get(&(addr(1), [0u8; 32])), Some(&[1u8; 32]));
    }
}
