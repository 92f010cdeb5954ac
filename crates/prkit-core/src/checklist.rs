//! Reviewer checklists.
//!
//! A checklist decides whether it applies to a pull request (from the change
//! classification and caller arguments) and produces the review tasks to post
//! as a comment. Checklists are supplied to the registry as an explicit
//! ordered sequence at startup.

use std::collections::BTreeMap;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Context / trait
// ---------------------------------------------------------------------------

/// What a checklist gets to look at when deciding whether it applies.
#[derive(Debug, Clone, Default)]
pub struct ChecklistContext {
    /// Derived from the change analysis.
    pub jsx_changed: bool,
    /// Caller override: `Some(true)` forces markup checklists on,
    /// `Some(false)` forces them off.
    pub jsx_override: Option<bool>,
}

/// Extension contract for checklists: a pure activity predicate, a pure task
/// list, and an optional one-time setup (e.g. loading remote data).
pub trait Checklist {
    fn name(&self) -> &str;

    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_active(&self, _context: &ChecklistContext) -> bool {
        true
    }

    fn tasks(&self, context: &ChecklistContext) -> Vec<String>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct ChecklistRegistry {
    checklists: Vec<Box<dyn Checklist>>,
}

impl ChecklistRegistry {
    pub fn new(checklists: Vec<Box<dyn Checklist>>) -> Self {
        Self { checklists }
    }

    pub fn with_defaults() -> Self {
        Self::new(vec![Box::new(Accessibility)])
    }

    /// Run every checklist's one-time initialization.
    pub fn init(&mut self) -> Result<()> {
        for checklist in &mut self.checklists {
            checklist.init()?;
        }
        Ok(())
    }

    /// Evaluate every active checklist against `context`. Checklists that
    /// produce no tasks are dropped from the result.
    pub fn evaluate(&self, context: &ChecklistContext) -> BTreeMap<String, Vec<String>> {
        let mut results = BTreeMap::new();
        for checklist in &self.checklists {
            if !checklist.is_active(context) {
                continue;
            }
            let tasks = checklist.tasks(context);
            if tasks.is_empty() {
                continue;
            }
            results.insert(checklist.name().to_string(), tasks);
        }
        results
    }
}

// ---------------------------------------------------------------------------
// Accessibility
// ---------------------------------------------------------------------------

/// Active when markup changed (or when the caller forces it); reminds the
/// reviewer to check the basics.
pub struct Accessibility;

impl Checklist for Accessibility {
    fn name(&self) -> &str {
        "Accessibility"
    }

    fn is_active(&self, context: &ChecklistContext) -> bool {
        match context.jsx_override {
            Some(forced) => forced,
            None => context.jsx_changed,
        }
    }

    fn tasks(&self, _context: &ChecklistContext) -> Vec<String> {
        vec!["Check images have alt tags".to_string()]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
