use base64::Engine as _;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use serde_json::json;
use std::io::{BufRead, BufReader, Cursor, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gpacalcd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gpacalcd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn decode_file(result: &serde_json::Value) -> Vec<u8> {
    let b64 = result["fileContent"].as_str().expect("fileContent");
    base64::engine::general_purpose::STANDARD
        .decode(b64)
        .expect("decode base64")
}

fn sheet_rows(bytes: &[u8], name: &str) -> Vec<Vec<String>> {
    let mut wb: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).expect("open xlsx");
    let range = wb.worksheet_range(name).expect("worksheet");
    range
        .rows()
        .map(|r| {
            r.iter()
                .map(|c| match c {
                    Data::String(s) => s.clone(),
                    Data::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}

fn sheet_names(bytes: &[u8]) -> Vec<String> {
    let wb: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).expect("open xlsx");
    wb.sheet_names()
}

#[test]
fn report_round_trips_calculated_students() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let first = request(
        &mut stdin,
        &mut reader,
        "1",
        "gpa.calculateStudent",
        json!({
            "name": "Asha",
            "regNo": "TU2024001",
            "semesters": [
                { "subjects": [
                    { "courseCode": "23UCA11", "courseName": "Python Programming", "credit": 4, "marks": 95 },
                    { "courseCode": "23ULT10", "courseName": "Tamil I", "credit": 4, "marks": 80 }
                ]},
                { "subjects": [
                    { "courseCode": "23UCA21", "courseName": "OOP Using C++", "credit": 5, "marks": 70 }
                ]}
            ]
        }),
    );
    let second = request(
        &mut stdin,
        &mut reader,
        "2",
        "gpa.calculateStudent",
        json!({
            "name": "Bala",
            "regNo": "TU2024002",
            "semesters": [
                { "subjects": [
                    { "courseCode": "23UCA11", "courseName": "Python Programming", "credit": 4, "marks": 45 }
                ]}
            ]
        }),
    );
    let students = json!([first["result"]["student"], second["result"]["student"]]);

    let resp = request(
        &mut stdin,
        &mut reader,
        "3",
        "gpa.downloadReport",
        json!({ "students": students }),
    );
    assert_eq!(resp["ok"], json!(true), "{}", resp);
    assert_eq!(resp["result"]["fileName"], json!("gpa_cgpa_report.xlsx"));
    assert!(resp["result"]["generatedAt"].is_string());

    let bytes = decode_file(&resp["result"]);
    assert_eq!(
        sheet_names(&bytes),
        vec!["GPA-CGPA Results", "TU2024001", "TU2024002"]
    );

    let summary = sheet_rows(&bytes, "GPA-CGPA Results");
    assert_eq!(
        summary[0],
        vec!["Reg No", "Name", "CGPA", "Sem 1 GPA", "Sem 2 GPA"]
    );
    assert_eq!(summary[1], vec!["TU2024001", "Asha", "8.08", "8.75", "7.00"]);
    assert_eq!(summary[2], vec!["TU2024002", "Bala", "0.00", "0.00", "N/A"]);

    let detail = sheet_rows(&bytes, "TU2024001");
    assert_eq!(detail[0][0], "Semester 1 - GPA: 8.75");
    assert_eq!(detail[1][0], "Course Code");
    assert_eq!(detail[2][4], "O");
    assert_eq!(detail[3][4], "D+");
    assert_eq!(detail[5][0], "Semester 2 - GPA: 7.00");

    let empty = request(
        &mut stdin,
        &mut reader,
        "4",
        "gpa.downloadReport",
        json!({ "students": [] }),
    );
    assert_eq!(empty["error"]["code"], json!("no_input"));
    assert_eq!(
        empty["error"]["message"],
        json!("No student data available to download.")
    );

    let malformed = request(
        &mut stdin,
        &mut reader,
        "5",
        "gpa.downloadReport",
        json!({ "students": [{ "name": "no reg no" }] }),
    );
    assert_eq!(malformed["error"]["code"], json!("bad_params"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn report_with_out_of_range_semester_is_rejected_and_sidecar_survives() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    for (i, bad) in [0u64, 7, 4_294_967_295].into_iter().enumerate() {
        let id = format!("bad-{}", i);
        let resp = request(
            &mut stdin,
            &mut reader,
            &id,
            "gpa.downloadReport",
            json!({
                "students": [{
                    "regNo": "TU2024001",
                    "name": "Asha",
                    "semesters": [
                        { "semester": 1, "subjects": [], "gpa": 8.0 },
                        { "semester": bad, "subjects": [], "gpa": 7.0 }
                    ],
                    "cgpa": 7.5
                }]
            }),
        );
        assert_eq!(resp["ok"], json!(false), "{}", resp);
        assert_eq!(resp["error"]["code"], json!("bad_params"));
        assert_eq!(
            resp["error"]["details"]["field"],
            json!("students[0].semesters[1].semester")
        );
    }

    let health = request(&mut stdin, &mut reader, "after", "health", json!({}));
    assert_eq!(health["ok"], json!(true));

    let fine = request(
        &mut stdin,
        &mut reader,
        "fine",
        "gpa.downloadReport",
        json!({
            "students": [{
                "regNo": "TU2024001",
                "name": "Asha",
                "semesters": [{ "semester": 6, "subjects": [], "gpa": 8.0 }]
            }]
        }),
    );
    assert_eq!(fine["ok"], json!(true), "{}", fine);
    let summary = sheet_rows(&decode_file(&fine["result"]), "GPA-CGPA Results");
    assert_eq!(summary[0].len(), 9);
    assert_eq!(summary[1][8], "8.00");
    assert_eq!(summary[1][3], "N/A");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn sample_template_matches_catalog_semester() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let courses = request(
        &mut stdin,
        &mut reader,
        "1",
        "catalog.courses",
        json!({ "regulation": 2023, "semester": 5 }),
    );
    let codes: Vec<String> = courses["result"]["courses"]
        .as_array()
        .expect("courses")
        .iter()
        .map(|c| c["code"].as_str().expect("code").to_string())
        .collect();
    assert_eq!(codes.len(), 7);

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "gpa.downloadSample",
        json!({ "regulation": 2023, "semester": 5 }),
    );
    assert_eq!(resp["ok"], json!(true), "{}", resp);
    assert_eq!(
        resp["result"]["fileName"],
        json!("gpa_sample_reg2023_sem5.xlsx")
    );
    let bytes = decode_file(&resp["result"]);
    let rows = sheet_rows(&bytes, "Regulation 2023 Sem 5");

    let mut expected = vec!["Reg No".to_string(), "Name".to_string()];
    expected.extend(codes.iter().map(|c| format!("{} Marks", c)));
    assert_eq!(rows[0], expected);
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[3][0], "TU2024003");
    assert_eq!(rows[3][1], "Student C");

    // The untouched template has no marks, so importing it finds no students.
    let reimport = request(
        &mut stdin,
        &mut reader,
        "3",
        "gpa.processWorkbook",
        json!({
            "fileContent": resp["result"]["fileContent"],
            "regulation": 2023,
            "semester": 6
        }),
    );
    assert_eq!(reimport["error"]["code"], json!("malformed_source"));

    let gap = request(
        &mut stdin,
        &mut reader,
        "4",
        "gpa.downloadSample",
        json!({ "regulation": 2025, "semester": 1 }),
    );
    assert_eq!(gap["error"]["code"], json!("catalog_missing"));
    assert_eq!(
        gap["error"]["message"],
        json!("No courses defined for regulation 2025 for semester 1.")
    );

    drop(stdin);
    let _ = child.wait();
}
