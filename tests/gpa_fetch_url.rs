use rust_xlsxwriter::Workbook;
use serde_json::json;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gpacalcd");
    let mut child = Command::new(exe)
        .env("GPACALCD_FETCH_TIMEOUT_SECS", "5")
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

/// Answers a single HTTP request with `status` and `body`, then exits.
fn serve_once(status: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf);
        let head = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        );
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(&body);
        let _ = stream.flush();
    });
    format!("http://{}/marks.xlsx", addr)
}

fn marks_workbook() -> Vec<u8> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.write_string(0, 0, "Reg No").expect("write");
    ws.write_string(0, 1, "Name").expect("write");
    ws.write_string(0, 2, "23UCA11 Grade Point").expect("write");
    ws.write_string(0, 3, "23UCA11 Marks").expect("write");
    ws.write_string(1, 0, "TU2024001").expect("write");
    ws.write_string(1, 1, "Asha").expect("write");
    ws.write_number(1, 2, 8.5).expect("write");
    ws.write_number(1, 3, 92.0).expect("write");
    wb.save_to_buffer().expect("save")
}

#[test]
fn workbook_is_fetched_from_url() {
    let url = serve_once("200 OK", marks_workbook());
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "gpa.processWorkbook",
        json!({ "fileUrl": url, "regulation": 2023, "semester": 1 }),
    );
    assert_eq!(resp["ok"], json!(true), "{}", resp);
    let subject = &resp["result"]["students"][0]["semesters"][0]["subjects"][0];
    assert_eq!(subject["grade"], json!("O"));
    // Supplied grade point wins over marks / 10.
    assert_eq!(subject["gradePoint"], json!(8.5));
    assert_eq!(subject["credits"], json!(5.0));
    assert_eq!(
        resp["result"]["source"]["mimeType"],
        json!("application/octet-stream")
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn failed_fetch_is_reported_with_status() {
    let url = serve_once("404 Not Found", b"missing".to_vec());
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "gpa.processWorkbook",
        json!({ "fileUrl": url, "regulation": 2023, "semester": 1 }),
    );
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["code"], json!("fetch_failed"));
    assert_eq!(
        resp["error"]["message"],
        json!("Failed to fetch file from URL: 404 Not Found")
    );

    drop(stdin);
    let _ = child.wait();
}
