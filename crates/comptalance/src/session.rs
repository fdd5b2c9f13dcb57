//! State of one merge from template choice to download
//!
//! A [`MergeSession`] holds the three input workbooks, whether each one
//! loaded, and the serialized result of the last successful
//! [`MergeSession::integrate`]. It is a plain value: create one per user
//! (or per test) and pass it around.
//!
//! Loading anything into a slot invalidates the previous result, so the
//! bytes offered for download always come from the workbooks currently
//! loaded.

use std::fmt;
use std::path::Path;

use comptalance_core::Workbook;
use serde::{Deserialize, Serialize};

use crate::download::Download;
use crate::error::{ComptaError, Result};
use crate::merge::{load_workbook, load_workbook_file, merge_balances, serialize, MergeReport};

/// The three inputs of a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Template,
    BalanceN,
    BalanceN1,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Template, Slot::BalanceN, Slot::BalanceN1];

    pub fn label(&self) -> &'static str {
        match self {
            Slot::Template => "template",
            Slot::BalanceN => "balance N",
            Slot::BalanceN1 => "balance N-1",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of the session flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionStatus {
    pub template_loaded: bool,
    pub balance_n_loaded: bool,
    pub balance_n1_loaded: bool,
    pub integrated: bool,
}

impl SessionStatus {
    pub fn ready(&self) -> bool {
        self.template_loaded && self.balance_n_loaded && self.balance_n1_loaded
    }
}

#[derive(Debug, Default)]
struct SlotState {
    workbook: Option<Workbook>,
    loaded: bool,
}

/// Inputs and output of a template + balances merge.
///
/// `integrated` is only ever true while all three slots are loaded, and
/// output bytes exist exactly when `integrated` is true.
#[derive(Debug, Default)]
pub struct MergeSession {
    template: SlotState,
    balance_n: SlotState,
    balance_n1: SlotState,
    integrated: bool,
    output: Option<Vec<u8>>,
}

impl MergeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `bytes` into `slot`.
    ///
    /// The slot and any previous merge result are reset first, so a failed
    /// load leaves the slot empty.
    pub fn load(&mut self, slot: Slot, bytes: &[u8]) -> Result<()> {
        self.reset(slot);
        let workbook = load_workbook(bytes).map_err(|e| with_slot(slot, e))?;
        self.store(slot, workbook);
        Ok(())
    }

    /// [`MergeSession::load`] from a file
    pub fn load_file<P: AsRef<Path>>(&mut self, slot: Slot, path: P) -> Result<()> {
        self.reset(slot);
        let workbook = load_workbook_file(path).map_err(|e| with_slot(slot, e))?;
        self.store(slot, workbook);
        Ok(())
    }

    /// Put an already parsed workbook into `slot`
    pub fn insert(&mut self, slot: Slot, workbook: Workbook) {
        self.reset(slot);
        self.store(slot, workbook);
    }

    pub fn is_loaded(&self, slot: Slot) -> bool {
        self.slot(slot).loaded
    }

    pub fn workbook(&self, slot: Slot) -> Option<&Workbook> {
        self.slot(slot).workbook.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            template_loaded: self.template.loaded,
            balance_n_loaded: self.balance_n.loaded,
            balance_n1_loaded: self.balance_n1.loaded,
            integrated: self.integrated,
        }
    }

    /// All three slots are loaded
    pub fn ready(&self) -> bool {
        self.status().ready()
    }

    pub fn is_integrated(&self) -> bool {
        self.integrated
    }

    /// Merge both balances into the template and keep the serialized result.
    ///
    /// The template workbook is modified in place, so integrating twice
    /// replaces the balance sheets instead of adding new ones.
    pub fn integrate(&mut self) -> Result<MergeReport> {
        self.integrated = false;
        self.output = None;

        let missing: Vec<&str> = Slot::ALL
            .iter()
            .filter(|slot| !self.is_loaded(**slot))
            .map(Slot::label)
            .collect();
        if !missing.is_empty() {
            return Err(ComptaError::Merge(format!(
                "not loaded yet: {}",
                missing.join(", ")
            )));
        }

        let template = self
            .template
            .workbook
            .as_mut()
            .ok_or_else(|| ComptaError::merge("the template workbook is not loaded"))?;
        let report = merge_balances(
            template,
            self.balance_n.workbook.as_ref(),
            self.balance_n1.workbook.as_ref(),
        )?;
        let bytes = serialize(template)?;

        log::info!(
            "integrated {} into the template ({} bytes)",
            report.placed.join(" and "),
            bytes.len()
        );
        self.output = Some(bytes);
        self.integrated = true;
        Ok(report)
    }

    /// Bytes of the last successful integration
    pub fn output(&self) -> Option<&[u8]> {
        self.output.as_deref()
    }

    /// The merged workbook, named after the current time
    pub fn download(&self) -> Option<Download> {
        if !self.integrated {
            return None;
        }
        self.output.clone().map(Download::now)
    }

    fn slot(&self, slot: Slot) -> &SlotState {
        match slot {
            Slot::Template => &self.template,
            Slot::BalanceN => &self.balance_n,
            Slot::BalanceN1 => &self.balance_n1,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut SlotState {
        match slot {
            Slot::Template => &mut self.template,
            Slot::BalanceN => &mut self.balance_n,
            Slot::BalanceN1 => &mut self.balance_n1,
        }
    }

    fn reset(&mut self, slot: Slot) {
        *self.slot_mut(slot) = SlotState::default();
        self.integrated = false;
        self.output = None;
    }

    fn store(&mut self, slot: Slot, workbook: Workbook) {
        log::debug!("{slot} loaded with sheets {:?}", workbook.sheet_names());
        *self.slot_mut(slot) = SlotState {
            workbook: Some(workbook),
            loaded: true,
        };
    }
}

fn with_slot(slot: Slot, error: ComptaError) -> ComptaError {
    match error {
        ComptaError::Load(msg) => ComptaError::Load(format!("{slot}: {msg}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{BALANCE_N1_SHEET, BALANCE_N_SHEET};

    fn workbook_with(sheet: &str, value: &str) -> Workbook {
        let mut workbook = Workbook::empty();
        let index = workbook.add_worksheet_with_name(sheet).unwrap();
        workbook
            .worksheet_mut(index)
            .unwrap()
            .set_cell_value("A1", value)
            .unwrap();
        workbook
    }

    fn loaded_session() -> MergeSession {
        let mut session = MergeSession::new();
        session.insert(Slot::Template, workbook_with("Intro", "modele"));
        session.insert(Slot::BalanceN, workbook_with("Balance", "n"));
        session.insert(Slot::BalanceN1, workbook_with("Balance", "n-1"));
        session
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = MergeSession::new();
        assert_eq!(session.status(), SessionStatus::default());
        assert!(!session.ready());
        assert!(session.download().is_none());
    }

    #[test]
    fn test_integrate_requires_every_slot() {
        let mut session = MergeSession::new();
        session.insert(Slot::BalanceN, workbook_with("Balance", "n"));

        let err = session.integrate().unwrap_err();
        let ComptaError::Merge(msg) = err else {
            panic!("expected a merge failure, got {err:?}");
        };
        assert!(msg.contains("template"));
        assert!(msg.contains("balance N-1"));
        assert!(!msg.contains("balance N,"));
        assert!(!session.is_integrated());
        assert!(session.output().is_none());
    }

    #[test]
    fn test_integrate_then_download() {
        let mut session = loaded_session();

        let report = session.integrate().unwrap();

        assert_eq!(report.placed, vec![BALANCE_N_SHEET, BALANCE_N1_SHEET]);
        assert!(session.status().integrated);
        let download = session.download().unwrap();
        assert_eq!(download.bytes, session.output().unwrap());
        assert_eq!(
            session.workbook(Slot::Template).unwrap().sheet_names(),
            vec!["Intro", BALANCE_N_SHEET, BALANCE_N1_SHEET]
        );
    }

    #[test]
    fn test_reload_discards_result() {
        let mut session = loaded_session();
        session.integrate().unwrap();

        session.insert(Slot::BalanceN1, workbook_with("Balance", "corrigée"));

        assert!(session.ready());
        assert!(!session.is_integrated());
        assert!(session.output().is_none());
        assert!(session.download().is_none());
    }

    #[test]
    fn test_failed_load_clears_slot() {
        let mut session = loaded_session();
        session.integrate().unwrap();

        let err = session.load(Slot::Template, b"definitely not a zip").unwrap_err();

        assert!(matches!(err, ComptaError::Load(ref msg) if msg.starts_with("template: ")));
        assert!(!session.is_loaded(Slot::Template));
        assert!(session.workbook(Slot::Template).is_none());
        assert!(session.is_loaded(Slot::BalanceN));
        assert!(!session.is_integrated());
    }
}
