mod common;

use std::fs;

use common::{TestWorkspace, fixture_path, roster_map};
use predicates::prelude::*;
use predicates::str::contains;
use roster_map::store::{META_FILE, RECORDS_FILE, Store};

fn ingest(workspace: &TestWorkspace, fixture: &str) -> assert_cmd::assert::Assert {
    roster_map()
        .args(["ingest", "-i"])
        .arg(fixture_path(fixture))
        .arg("--store")
        .arg(workspace.store())
        .assert()
}

fn configure(workspace: &TestWorkspace, extra: &[&str]) -> assert_cmd::assert::Assert {
    roster_map()
        .arg("configure")
        .arg("--store")
        .arg(workspace.store())
        .args(["--identity", "TRABAJADOR", "--date", "FECHA_INGRESO"])
        .args(extra)
        .assert()
}

#[test]
fn ingest_configure_and_query_round_trip() {
    let workspace = TestWorkspace::new();
    ingest(&workspace, "planilla.csv").success();
    configure(&workspace, &["--visible", "APELLIDOS_NOMBRES,PERIODO_VACACIONAL"]).success();

    roster_map()
        .arg("query")
        .arg("--store")
        .arg(workspace.store())
        .args(["--id", " 41234567 ", "--date", "15/03/2019"])
        .assert()
        .success()
        .stdout(contains("APELLIDOS_NOMBRES"))
        .stdout(contains("Quispe Mamani Ana"))
        .stdout(contains("2023"))
        .stdout(contains("2024"));
}

#[test]
fn ingest_stores_canonical_columns_and_iso_dates() {
    let workspace = TestWorkspace::new();
    ingest(&workspace, "planilla.csv").success();

    let store = Store::open(&workspace.store());
    let dataset = store.load_dataset().expect("records stored");
    assert_eq!(dataset.len(), 4);
    assert!(dataset.has_column("TRABAJADOR"));
    assert!(dataset.has_column("OBSERVACION"));
    assert!(dataset.has_column("Area"));
    assert!(!dataset.has_column("DNI"));
    assert_eq!(dataset.value(0, "FECHA_INGRESO"), Some("2019-03-15"));
    assert_eq!(dataset.value(2, "FECHA_INGRESO"), Some("2019-01-01"));
    assert_eq!(dataset.value(2, "FECHA_CESE"), Some("2022-12-31"));
    assert_eq!(dataset.value(3, "FECHA_INGRESO"), None);
    assert_eq!(dataset.value(0, "OBSERVACION"), None);

    let meta = store.load_meta().expect("meta").expect("meta present");
    assert_eq!(meta.rows, 4);
    assert_eq!(meta.source.as_deref(), Some("planilla.csv"));
    assert_eq!(meta.unmapped_headers, vec!["Area".to_string()]);
    assert_eq!(
        meta.header_mapping.get("DNI").map(String::as_str),
        Some("TRABAJADOR")
    );
    assert_eq!(meta.source_sha256.as_ref().map(String::len), Some(64));
}

#[test]
fn rejected_ingest_leaves_previous_upload_in_place() {
    let workspace = TestWorkspace::new();
    ingest(&workspace, "planilla.csv").success();
    let records = workspace.store().join(RECORDS_FILE);
    let before = fs::read_to_string(&records).expect("records");
    let meta_before = fs::read_to_string(workspace.store().join(META_FILE)).expect("meta");

    ingest(&workspace, "sin_identidad.csv")
        .failure()
        .stderr(contains("Missing required columns after mapping"))
        .stderr(contains("TRABAJADOR"))
        .stderr(contains("FECHA_INGRESO"));

    assert_eq!(fs::read_to_string(&records).expect("records"), before);
    assert_eq!(
        fs::read_to_string(workspace.store().join(META_FILE)).expect("meta"),
        meta_before
    );
}

#[test]
fn rejected_first_ingest_creates_nothing() {
    let workspace = TestWorkspace::new();
    ingest(&workspace, "sin_identidad.csv").failure();
    assert!(!workspace.store().join(RECORDS_FILE).exists());
}

#[test]
fn overrides_rescue_an_unrecognized_sheet() {
    let workspace = TestWorkspace::new();
    let sheet = workspace.write(
        "custom.csv",
        "Documento,Alta,Nombre Completo\n41234567,01/02/2020,Ana\n",
    );
    roster_map()
        .args(["ingest", "-i"])
        .arg(&sheet)
        .arg("--store")
        .arg(workspace.store())
        .args(["--override", "Documento=TRABAJADOR"])
        .args(["--override", "Alta=FECHA_INGRESO"])
        .assert()
        .success();
    let dataset = Store::open(&workspace.store())
        .load_dataset()
        .expect("records stored");
    assert_eq!(dataset.value(0, "TRABAJADOR"), Some("41234567"));
    assert_eq!(dataset.value(0, "FECHA_INGRESO"), Some("2020-02-01"));
}

#[test]
fn override_with_unknown_field_is_rejected() {
    let workspace = TestWorkspace::new();
    roster_map()
        .args(["map", "-i"])
        .arg(fixture_path("planilla.csv"))
        .args(["--override", "Area=GERENCIA"])
        .assert()
        .failure()
        .stderr(contains("unknown canonical field 'GERENCIA'"));
    assert!(!workspace.store().exists());
}

#[test]
fn configure_requires_an_ingested_sheet() {
    let workspace = TestWorkspace::new();
    configure(&workspace, &[])
        .failure()
        .stderr(contains("No columns loaded yet"));
}

#[test]
fn configure_lists_missing_and_available_columns() {
    let workspace = TestWorkspace::new();
    ingest(&workspace, "planilla.csv").success();
    configure(&workspace, &["--visible", "SUELDO"])
        .failure()
        .stderr(contains("Columns not found"))
        .stderr(contains("SUELDO"))
        .stderr(contains("Available"));
}

#[test]
fn configure_rejects_blank_identity() {
    let workspace = TestWorkspace::new();
    ingest(&workspace, "planilla.csv").success();
    roster_map()
        .arg("configure")
        .arg("--store")
        .arg(workspace.store())
        .args(["--identity", " ", "--date", "FECHA_INGRESO"])
        .assert()
        .failure()
        .stderr(contains("are required"));
}

#[test]
fn query_without_configuration_fails() {
    let workspace = TestWorkspace::new();
    ingest(&workspace, "planilla.csv").success();
    roster_map()
        .arg("query")
        .arg("--store")
        .arg(workspace.store())
        .args(["--id", "41234567", "--date", "15/03/2019"])
        .assert()
        .failure()
        .stderr(contains("not configured"));
}

#[test]
fn query_without_match_reports_not_found() {
    let workspace = TestWorkspace::new();
    ingest(&workspace, "planilla.csv").success();
    configure(&workspace, &[]).success();
    roster_map()
        .arg("query")
        .arg("--store")
        .arg(workspace.store())
        .args(["--id", "41234567", "--date", "2001-01-01"])
        .assert()
        .success()
        .stdout(contains("No record found for that identity and date"));
}

#[test]
fn query_json_renders_nulls() {
    let workspace = TestWorkspace::new();
    ingest(&workspace, "planilla.csv").success();
    configure(&workspace, &["--visible", "PERIODO_VACACIONAL,OBSERVACION"]).success();
    let output = roster_map()
        .arg("query")
        .arg("--store")
        .arg(workspace.store())
        .args(["--id", "70000001", "--date", "2019-01-01", "--json"])
        .output()
        .expect("run query");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["found"], serde_json::Value::Bool(true));
    assert_eq!(value["results"][0]["PERIODO_VACACIONAL"], "2022");
    assert!(value["results"][0]["OBSERVACION"].is_null());
}

#[test]
fn map_prints_resolution_table() {
    roster_map()
        .args(["map", "-i"])
        .arg(fixture_path("planilla.csv"))
        .assert()
        .success()
        .stdout(contains("DNI"))
        .stdout(contains("TRABAJADOR"))
        .stdout(contains("unmapped"));
}

#[test]
fn map_json_lists_entries_and_unmapped_headers() {
    let output = roster_map()
        .args(["map", "--json", "-i"])
        .arg(fixture_path("planilla.csv"))
        .output()
        .expect("run map");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["unmapped"], serde_json::json!(["Area"]));
    let entries = value["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 7);
    assert_eq!(entries[1]["raw"], "DNI");
    assert_eq!(entries[1]["field"], "TRABAJADOR");
}

#[test]
fn map_reads_semicolon_sheets_in_latin1() {
    let workspace = TestWorkspace::new();
    let mut bytes = b"DNI;Fecha Ingreso;Situaci".to_vec();
    bytes.push(0xF3);
    bytes.extend_from_slice(b"n Trabajador\n41234567;15/03/2019;ACTIVO\n");
    let sheet = workspace.write_bytes("latin1.csv", &bytes);
    roster_map()
        .args(["map", "-i"])
        .arg(&sheet)
        .args(["--delimiter", ";", "--input-encoding", "windows-1252"])
        .assert()
        .success()
        .stdout(contains("SITUACION_TRABAJADOR"));
}

#[test]
fn status_reports_rows_and_configuration() {
    let workspace = TestWorkspace::new();
    roster_map()
        .arg("status")
        .arg("--store")
        .arg(workspace.store())
        .assert()
        .success()
        .stdout(contains("ingest a sheet first"));

    ingest(&workspace, "planilla.csv").success();
    roster_map()
        .arg("status")
        .arg("--store")
        .arg(workspace.store())
        .assert()
        .success()
        .stdout(contains("rows"))
        .stdout(contains("4"))
        .stdout(contains("not configured"));

    configure(&workspace, &[]).success();
    roster_map()
        .arg("status")
        .arg("--store")
        .arg(workspace.store())
        .assert()
        .success()
        .stdout(contains("identity column"))
        .stdout(contains("not configured").not());
}

#[test]
fn fields_lists_canonical_vocabulary() {
    roster_map()
        .arg("fields")
        .assert()
        .success()
        .stdout(contains("TRABAJADOR"))
        .stdout(contains("DNI"))
        .stdout(contains("FECHA_CESE"));
}
