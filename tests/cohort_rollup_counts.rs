use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
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
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn roster_doc() -> serde_json::Value {
    // One evaluation, one test. Three students: 8/10, no score, 4/10.
    json!({
        "subject": { "id": "sub1", "name": "Biology", "code": "BIO", "evaluationCount": 1 },
        "scheme": {
            "id": "sch1",
            "subjectId": "sub1",
            "evaluations": [
                {
                    "id": "ev1", "name": "Term", "position": 1, "weight": 100.0,
                    "tests": [
                        { "id": "t1", "evaluationId": "ev1", "name": "Exam",
                          "weight": 100.0, "maxScore": 10.0, "minScore": 5.0 }
                    ]
                }
            ]
        },
        "students": [
            { "id": "s1", "lastName": "Alba", "firstName": "Mar" },
            { "id": "s2", "lastName": "Bosch", "firstName": "Pau" },
            { "id": "s3", "lastName": "Cano", "firstName": "Iris" }
        ],
        "scores": [
            { "studentId": "s1", "testId": "t1", "evaluationId": "ev1", "value": 8.0, "maxValue": 10.0 },
            { "studentId": "s3", "testId": "t1", "evaluationId": "ev1", "value": 4.0, "maxValue": 10.0 }
        ],
    })
}

#[test]
fn cohort_buckets_and_average_exclude_pending() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "gradebook.load",
        json!({ "document": roster_doc() }),
    );

    // No studentIds param: the loaded roster is the cohort.
    let res = request_ok(&mut stdin, &mut reader, "2", "grade.cohort", json!({}));
    assert_eq!(res.get("passed").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(res.get("failed").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(res.get("pending").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(res.get("average").and_then(|v| v.as_f64()), Some(6.0));

    let per_student = res
        .get("perStudent")
        .and_then(|v| v.as_array())
        .expect("perStudent");
    assert_eq!(per_student.len(), 3);
    assert_eq!(
        per_student[0].get("finalGrade").and_then(|v| v.as_f64()),
        Some(8.0)
    );
    assert_eq!(
        per_student[0].get("displayName").and_then(|v| v.as_str()),
        Some("Alba, Mar")
    );
    assert!(per_student[1].get("finalGrade").expect("field").is_null());
    assert_eq!(
        per_student[2].get("passed").and_then(|v| v.as_bool()),
        Some(false)
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn explicit_student_ids_override_roster() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "gradebook.load",
        json!({ "document": roster_doc() }),
    );

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grade.cohort",
        json!({ "studentIds": ["s1", "s3"] }),
    );
    assert_eq!(res.get("passed").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(res.get("failed").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(res.get("pending").and_then(|v| v.as_u64()), Some(0));
    assert_eq!(res.get("average").and_then(|v| v.as_f64()), Some(6.0));
    assert_eq!(
        res.get("perStudent").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(2)
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn fully_pending_cohort_averages_zero() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let mut doc = roster_doc();
    doc["scores"] = json!([]);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "gradebook.load",
        json!({ "document": doc }),
    );

    let res = request_ok(&mut stdin, &mut reader, "2", "grade.cohort", json!({}));
    assert_eq!(res.get("pending").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(res.get("passed").and_then(|v| v.as_u64()), Some(0));
    assert_eq!(res.get("failed").and_then(|v| v.as_u64()), Some(0));
    assert_eq!(res.get("average").and_then(|v| v.as_f64()), Some(0.0));

    drop(stdin);
    let _ = child.wait();
}
