//! Defined names
//!
//! Names such as `Total` or the built-in `_xlnm.Print_Area`, each bound to
//! a reference formula. A name is either workbook-wide or local to one
//! sheet, and the same name may exist once per scope. Lookups ignore case.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NameScope {
    #[default]
    Workbook,
    /// Local to the sheet at this index
    Sheet(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRange {
    pub name: String,
    pub scope: NameScope,
    /// Reference formula without the leading `=`, e.g. `'BAL N'!$C$40`
    pub refers_to: String,
    pub comment: Option<String>,
    pub hidden: bool,
}

impl NamedRange {
    pub fn new(name: impl Into<String>, refers_to: impl Into<String>) -> Self {
        let refers_to = refers_to.into();
        Self {
            name: name.into(),
            scope: NameScope::Workbook,
            refers_to: refers_to.strip_prefix('=').map(str::to_string).unwrap_or(refers_to),
            comment: None,
            hidden: false,
        }
    }

    pub fn local_to(mut self, sheet_index: usize) -> Self {
        self.scope = NameScope::Sheet(sheet_index);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Names Excel reserves (`_xlnm.Print_Area`, `_xlnm.Print_Titles`, ...)
    pub fn is_builtin(&self) -> bool {
        self.name.starts_with("_xlnm.")
    }
}

/// Defined names in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedRangeCollection {
    names: Vec<NamedRange>,
}

impl NamedRangeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name, failing if it is already defined in that scope
    pub fn define(&mut self, name: NamedRange) -> Result<()> {
        if self.get(&name.name, name.scope).is_some() {
            return Err(Error::DuplicateDefinedName(name.name));
        }
        self.names.push(name);
        Ok(())
    }

    pub fn get(&self, name: &str, scope: NameScope) -> Option<&NamedRange> {
        self.names
            .iter()
            .find(|n| n.scope == scope && n.name.eq_ignore_ascii_case(name))
    }

    /// Sheet-local name first, then the workbook-wide one
    pub fn resolve(&self, name: &str, sheet_index: usize) -> Option<&NamedRange> {
        self.get(name, NameScope::Sheet(sheet_index))
            .or_else(|| self.get(name, NameScope::Workbook))
    }

    pub fn remove(&mut self, name: &str, scope: NameScope) -> Option<NamedRange> {
        let pos = self
            .names
            .iter()
            .position(|n| n.scope == scope && n.name.eq_ignore_ascii_case(name))?;
        Some(self.names.remove(pos))
    }

    /// Drop names local to a removed sheet and renumber the ones after it
    pub fn sheet_removed(&mut self, index: usize) {
        self.names.retain(|n| n.scope != NameScope::Sheet(index));
        for name in &mut self.names {
            if let NameScope::Sheet(i) = &mut name.scope {
                if *i > index {
                    *i -= 1;
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedRange> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
