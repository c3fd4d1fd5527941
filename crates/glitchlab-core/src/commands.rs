use serde::{Deserialize, Serialize};

/// Linear undo/redo history over snapshots of a value.
///
/// Every transition consumes the stack and returns the next one, so a
/// snapshot handed out earlier can never be changed behind its owner's back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandStack<T> {
    past: Vec<T>,
    present: T,
    future: Vec<T>,
}

impl<T> CommandStack<T> {
    pub fn new(value: T) -> Self {
        Self {
            past: Vec::new(),
            present: value,
            future: Vec::new(),
        }
    }

    pub fn present(&self) -> &T {
        &self.present
    }

    pub fn into_present(self) -> T {
        self.present
    }

    pub fn past(&self) -> &[T] {
        &self.past
    }

    /// Redo entries, nearest first.
    pub fn future(&self) -> &[T] {
        &self.future
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Record a new present. Clears the redo entries.
    pub fn set(mut self, value: T) -> Self {
        let previous = std::mem::replace(&mut self.present, value);
        self.past.push(previous);
        self.future.clear();
        self
    }

    /// Step back one entry. Does nothing when there is no past.
    pub fn undo(mut self) -> Self {
        if let Some(previous) = self.past.pop() {
            let current = std::mem::replace(&mut self.present, previous);
            self.future.insert(0, current);
        }
        self
    }

    /// Step forward one entry. Does nothing when there is no future.
    pub fn redo(mut self) -> Self {
        if !self.future.is_empty() {
            let next = self.future.remove(0);
            let current = std::mem::replace(&mut self.present, next);
            self.past.push(current);
        }
        self
    }

    /// Overwrite the present without recording an undo step.
    pub fn replace_present(mut self, value: T) -> Self {
        self.present = value;
        self
    }

    /// Drop all history and start over from `value`.
    pub fn reset(self, value: T) -> Self {
        Self::new(value)
    }

    /// Rewrite every entry in place, keeping the undo position.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> CommandStack<U> {
        let past = self.past.into_iter().map(&mut f).collect();
        let present = f(self.present);
        let future = self.future.into_iter().map(&mut f).collect();
        CommandStack {
            past,
            present,
            future,
        }
    }

    pub fn len(&self) -> usize {
        self.past.len() + 1 + self.future.len()
    }
}

impl<T: Default> Default for CommandStack<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
