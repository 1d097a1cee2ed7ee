use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_registrard");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn registrard");
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
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        !value.get("ok").and_then(|v| v.as_bool()).unwrap_or(true),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value.get("error").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn capacity_updates_respect_enrollment_floor_and_cohort_ceiling() {
    let workspace = temp_dir("registrar-capacity-ipc");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // Cohort of 8 students; 3 of them enroll.
    for i in 0..8 {
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("stu{i}"),
            "catalog.addStudent",
            json!({ "studentId": format!("s{i}"), "name": format!("Student {i}"),
                    "branch": "CSE", "year": 2 }),
        );
    }
    let section = request_ok(
        &mut stdin,
        &mut reader,
        "sec",
        "catalog.addSection",
        json!({
            "courseCode": "CS201", "title": "Data Structures", "term": "Fall",
            "year": 2026, "capacity": 5, "instructorId": "inst-1",
            "cohortBranch": "CSE", "cohortYear": 2
        }),
    )["sectionId"]
        .as_str()
        .expect("sectionId")
        .to_string();

    let cohort = request_ok(
        &mut stdin,
        &mut reader,
        "coh",
        "catalog.cohortCount",
        json!({ "branch": "CSE", "year": 2 }),
    );
    assert_eq!(cohort["count"], 8);

    for i in 0..3 {
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("r{i}"),
            "enroll.register",
            json!({ "actor": { "userId": format!("s{i}"), "role": "student" },
                    "studentId": format!("s{i}"), "sectionId": section }),
        );
    }

    let owner = json!({ "userId": "inst-1", "role": "instructor" });

    // Below the current enrolled count: rejected with the allowed range.
    let e = request_err(
        &mut stdin,
        &mut reader,
        "c1",
        "enroll.updateCapacity",
        json!({ "actor": owner, "sectionId": section, "newCapacity": 2 }),
    );
    assert_eq!(e["code"], "invalid_capacity");
    assert_eq!(e["details"]["min"], 3);
    assert_eq!(e["details"]["max"], 7);

    // At the cohort population: rejected (capacity must stay strictly below).
    let e = request_err(
        &mut stdin,
        &mut reader,
        "c2",
        "enroll.updateCapacity",
        json!({ "actor": owner, "sectionId": section, "newCapacity": 8 }),
    );
    assert_eq!(e["code"], "invalid_capacity");

    // Top of the allowed range is accepted and visible immediately.
    request_ok(
        &mut stdin,
        &mut reader,
        "c3",
        "enroll.updateCapacity",
        json!({ "actor": owner, "sectionId": section, "newCapacity": 7 }),
    );
    let view = request_ok(
        &mut stdin,
        &mut reader,
        "v1",
        "catalog.getSection",
        json!({ "sectionId": section }),
    );
    assert_eq!(view["capacity"], 7);

    // Only the owning instructor (or admin) may touch capacity.
    let e = request_err(
        &mut stdin,
        &mut reader,
        "c4",
        "enroll.updateCapacity",
        json!({ "actor": { "userId": "inst-2", "role": "instructor" },
                "sectionId": section, "newCapacity": 6 }),
    );
    assert_eq!(e["code"], "unauthorized");

    request_ok(
        &mut stdin,
        &mut reader,
        "c5",
        "enroll.updateCapacity",
        json!({ "actor": { "userId": "root", "role": "admin" },
                "sectionId": section, "newCapacity": 6 }),
    );

    // Maintenance mode rejects the mutation as retryable store_unavailable.
    let e = request_err(
        &mut stdin,
        &mut reader,
        "c6",
        "enroll.updateCapacity",
        json!({ "actor": owner, "sectionId": section, "newCapacity": 5,
                "maintenance": true }),
    );
    assert_eq!(e["code"], "store_unavailable");
    assert_eq!(e["retryable"], true);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
