//! Session lifecycle: load slots from bytes and files, integrate, download

use comptalance::prelude::*;
use comptalance::{SessionStatus, XLSX_MIME};
use pretty_assertions::assert_eq;

fn xlsx_with(sheet: &str, cells: &[(&str, &str)]) -> Vec<u8> {
    let mut workbook = Workbook::empty();
    let index = workbook.add_worksheet_with_name(sheet).unwrap();
    let ws = workbook.worksheet_mut(index).unwrap();
    for (address, value) in cells {
        ws.set_cell_value(address, *value).unwrap();
    }
    serialize(&workbook).unwrap()
}

fn assert_invariants(session: &MergeSession) {
    let status = session.status();
    if status.integrated {
        assert!(status.ready(), "integrated while a slot is not loaded");
    }
    assert_eq!(session.output().is_some(), status.integrated);
    assert_eq!(session.download().is_some(), status.integrated);
}

fn loaded_session() -> MergeSession {
    let mut session = MergeSession::new();
    session
        .load(Slot::Template, &xlsx_with("Bilan", &[("A1", "Actif")]))
        .unwrap();
    session
        .load(Slot::BalanceN, &xlsx_with("Balance", &[("A1", "N")]))
        .unwrap();
    session
        .load(Slot::BalanceN1, &xlsx_with("Balance", &[("A1", "N-1")]))
        .unwrap();
    session
}

#[test]
fn test_full_lifecycle() {
    let mut session = MergeSession::new();
    assert_invariants(&session);

    session
        .load(Slot::Template, &xlsx_with("Bilan", &[("A1", "Actif")]))
        .unwrap();
    assert_eq!(
        session.status(),
        SessionStatus {
            template_loaded: true,
            ..SessionStatus::default()
        }
    );
    assert!(session.integrate().is_err());
    assert_invariants(&session);

    session
        .load(Slot::BalanceN, &xlsx_with("Balance", &[("A1", "N")]))
        .unwrap();
    session
        .load(Slot::BalanceN1, &xlsx_with("Balance", &[("A1", "N-1")]))
        .unwrap();
    assert!(session.ready());

    let report = session.integrate().unwrap();
    assert_eq!(report.placed, vec![BALANCE_N_SHEET, BALANCE_N1_SHEET]);
    assert_invariants(&session);

    let download = session.download().unwrap();
    assert_eq!(download.mime, XLSX_MIME);
    assert!(download.file_name.starts_with("comptabilite_complete_"));

    let merged = load_workbook(&download.bytes).unwrap();
    assert_eq!(
        merged.sheet_names(),
        vec!["Bilan", BALANCE_N_SHEET, BALANCE_N1_SHEET]
    );
    assert_eq!(
        merged
            .worksheet_by_name(BALANCE_N1_SHEET)
            .unwrap()
            .get_value("A1")
            .unwrap(),
        CellValue::string("N-1")
    );
}

#[test]
fn test_reload_after_integration_invalidates_output() {
    let mut session = loaded_session();
    session.integrate().unwrap();
    let first = session.output().unwrap().to_vec();

    session
        .load(Slot::BalanceN, &xlsx_with("Balance", &[("A1", "N corrigée")]))
        .unwrap();
    assert!(!session.is_integrated());
    assert_invariants(&session);

    session.integrate().unwrap();
    assert_invariants(&session);
    let second = load_workbook(session.output().unwrap()).unwrap();
    assert_ne!(session.output().unwrap(), &first[..]);
    assert_eq!(
        second
            .worksheet_by_name(BALANCE_N_SHEET)
            .unwrap()
            .get_value("A1")
            .unwrap(),
        CellValue::string("N corrigée")
    );
    // integrating twice did not duplicate the balance sheets
    assert_eq!(second.sheet_count(), 3);
}

#[test]
fn test_failed_load_blocks_integration() {
    let mut session = loaded_session();

    let err = session.load(Slot::BalanceN1, b"PK\x03\x04 truncated").unwrap_err();
    assert!(matches!(err, ComptaError::Load(_)));
    assert!(!session.is_loaded(Slot::BalanceN1));
    assert_invariants(&session);

    let err = session.integrate().unwrap_err();
    assert!(matches!(err, ComptaError::Merge(ref msg) if msg.contains("balance N-1")));
    assert_invariants(&session);
}

#[test]
fn test_load_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("modele.xlsx");
    let balance_n = dir.path().join("balance_n.xlsx");
    let balance_n1 = dir.path().join("balance_n1.xlsx");
    std::fs::write(&template, xlsx_with("Bilan", &[])).unwrap();
    std::fs::write(&balance_n, xlsx_with("BN", &[("B2", "solde")])).unwrap();
    std::fs::write(&balance_n1, xlsx_with("BN1", &[("B2", "solde")])).unwrap();

    let mut session = MergeSession::new();
    session.load_file(Slot::Template, &template).unwrap();
    session.load_file(Slot::BalanceN, &balance_n).unwrap();
    session.load_file(Slot::BalanceN1, &balance_n1).unwrap();
    session.integrate().unwrap();

    let path = session.download().unwrap().save_in(dir.path()).unwrap();
    let merged = XlsxReader::read_file(&path).unwrap();
    assert_eq!(merged.sheet_count(), 3);
}

#[test]
fn test_missing_file_is_a_load_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = MergeSession::new();

    let err = session
        .load_file(Slot::Template, dir.path().join("absent.xlsx"))
        .unwrap_err();

    assert!(matches!(err, ComptaError::Load(ref msg) if msg.contains("absent.xlsx")));
    assert!(!session.is_loaded(Slot::Template));
}
