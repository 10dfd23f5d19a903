//! Bounded conversation memory

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One question/answer exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// The user's question
    pub question: String,
    /// The answer that was returned
    pub answer: String,
}

impl Turn {
    /// Create a turn
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// FIFO window over the most recent `capacity` turns, oldest first
///
/// # Examples
///
/// ```
/// use leasewise_domain::ConversationMemory;
///
/// let mut memory = ConversationMemory::new(2);
/// memory.record("q1", "a1");
/// memory.record("q2", "a2");
/// memory.record("q3", "a3");
/// assert_eq!(memory.len(), 2);
/// assert_eq!(memory.turns().next().unwrap().question, "q2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMemory {
    capacity: usize,
    turns: VecDeque<Turn>,
}

impl ConversationMemory {
    /// Create an empty memory holding at most `capacity` turns
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            turns: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a turn, evicting the oldest when full
    pub fn record(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(Turn::new(question, answer));
    }

    /// Iterate turns oldest to newest
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Owned copy of the current window
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    /// Number of retained turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turns are retained
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Maximum number of retained turns
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every turn
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_evicts_oldest_first() {
        let mut memory = ConversationMemory::new(3);
        for i in 0..5 {
            memory.record(format!("q{}", i), format!("a{}", i));
        }
        let questions: Vec<_> = memory.turns().map(|t| t.question.as_str()).collect();
        assert_eq!(questions, vec!["q2", "q3", "q4"]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut memory = ConversationMemory::new(0);
        memory.record("q", "a");
        assert!(memory.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut memory = ConversationMemory::new(5);
        memory.record("q", "a");
        memory.clear();
        assert!(memory.is_empty());
        assert_eq!(memory.capacity(), 5);
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_capacity(capacity in 0usize..8, pushes in 0usize..30) {
            let mut memory = ConversationMemory::new(capacity);
            for i in 0..pushes {
                memory.record(i.to_string(), i.to_string());
            }
            prop_assert_eq!(memory.len(), pushes.min(capacity));
            if let Some(last) = memory.turns().last() {
                prop_assert_eq!(last.question.clone(), (pushes - 1).to_string());
            }
        }
    }
}
