/// State of one level of IF/ELSE/ENDIF nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// The branch executes.
    True,
    /// The branch is skipped, the matching ELSE branch executes.
    False,
    /// The enclosing branch is skipped, so neither side of this one executes.
    Skip,
}

/// Nesting of conditional branches within one script.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConditionalStack {
    conditions: Vec<Condition>,
}

impl ConditionalStack {
    /// Whether the innermost branch executes. True outside any conditional.
    pub fn is_executing(&self) -> bool {
        self.conditions
            .last()
            .is_none_or(|condition| *condition == Condition::True)
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// Flips the innermost branch. Returns `false` outside any conditional.
    pub fn toggle(&mut self) -> bool {
        match self.conditions.last_mut() {
            Some(condition) => {
                *condition = match *condition {
                    Condition::True => Condition::False,
                    Condition::False => Condition::True,
                    Condition::Skip => Condition::Skip,
                };
                true
            }
            None => false,
        }
    }

    /// Closes the innermost branch. Returns `false` outside any conditional.
    pub fn pop(&mut self) -> bool {
        self.conditions.pop().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}
