use crate::source_map::SourcePosition;

/// One open `#if`/`#ifdef`/`#ifndef` group
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalFrame {
    /// The enclosing region was emitting when the group opened
    pub parent_active: bool,
    /// The current branch was selected
    pub taken: bool,
    /// Some branch of this group has been selected
    pub any_taken: bool,
    pub seen_else: bool,
    pub opened_at: SourcePosition,
}

impl ConditionalFrame {
    pub fn open(parent_active: bool, condition: bool, opened_at: SourcePosition) -> Self {
        let taken = parent_active && condition;
        ConditionalFrame {
            parent_active,
            taken,
            any_taken: taken,
            seen_else: false,
            opened_at,
        }
    }

    /// Whether an `#elif` condition needs evaluating at all
    pub fn wants_alternative(&self) -> bool {
        self.parent_active && !self.any_taken
    }

    pub fn enter_elif(&mut self, condition: bool) {
        self.taken = self.wants_alternative() && condition;
        self.any_taken |= self.taken;
    }

    pub fn enter_else(&mut self) {
        self.taken = self.wants_alternative();
        self.any_taken |= self.taken;
        self.seen_else = true;
    }

    pub fn is_emitting(&self) -> bool {
        self.parent_active && self.taken
    }
}
