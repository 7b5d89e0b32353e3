//! Barcode → target colour assignments.

use std::collections::{BTreeMap, HashMap};

use shared::ColorState;

/// What an assignment entry asks for: a colour, or removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentTarget {
    Set(ColorState),
    Clear,
}

impl AssignmentTarget {
    /// Parse a wire state string. Empty, `NONE` and `NULL` (any case) clear;
    /// `None` for anything else that is not a colour.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim().to_ascii_uppercase();
        match s.as_str() {
            "" | "NONE" | "NULL" => Some(Self::Clear),
            _ => s.parse().ok().map(Self::Set),
        }
    }
}

/// Sticky mapping from a trimmed, case-sensitive code to the colour a scan of it should push.
#[derive(Debug, Default, Clone)]
pub struct AssignmentStore {
    targets: HashMap<String, ColorState>,
}

impl AssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear one code. Empty codes are ignored; clearing an absent code is fine.
    pub fn update(&mut self, code: &str, target: AssignmentTarget) {
        let code = code.trim();
        if code.is_empty() {
            return;
        }
        match target {
            AssignmentTarget::Set(state) => {
                self.targets.insert(code.to_string(), state);
            }
            AssignmentTarget::Clear => {
                self.targets.remove(code);
            }
        }
    }

    /// Replace the whole table. Entries with an empty code or a clearing target are omitted.
    pub fn sync<I>(&mut self, targets: I)
    where
        I: IntoIterator<Item = (String, AssignmentTarget)>,
    {
        self.targets = targets
            .into_iter()
            .filter_map(|(code, target)| {
                let code = code.trim();
                match target {
                    AssignmentTarget::Set(state) if !code.is_empty() => {
                        Some((code.to_string(), state))
                    }
                    _ => None,
                }
            })
            .collect();
    }

    /// Exact lookup. Keys were trimmed on the way in; `code` is not.
    pub fn get(&self, code: &str) -> Option<ColorState> {
        self.targets.get(code).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.targets.len()
    }

    /// Ordered copy of the table.
    pub fn snapshot(&self) -> BTreeMap<String, ColorState> {
        self.targets
            .iter()
            .map(|(code, state)| (code.clone(), *state))
            .collect()
    }
}
