
use serde_json::json;
use std::io::BufReader;
use std::process::{ChildStdin, ChildStdout};
use test_support::{request, request_ok, spawn_sidecar};

fn exam_config_params() -> serde_json::Value {
    json!({
        "instituteId": "inst-1",
        "subjects": [{
            "subjectName": "Physics",
            "examName": "Mid Term",
            "graceMark": 5.0,
            "highestFailMark": 32.0,
            "attendanceRequired": true,
            "examConfig": [
                { "partCode": "CQ", "totalMark": 70.0 },
                { "partCode": "MCQ", "totalMark": 30.0 }
            ]
        }],
        "gradePoints": [
            { "fromMark": 80.0, "toMark": 100.0, "grade": "A+", "gradePoint": 5.0 },
            { "fromMark": 60.0, "toMark": 79.99, "grade": "A", "gradePoint": 4.0 },
            { "fromMark": 33.0, "toMark": 59.99, "grade": "B", "gradePoint": 3.0 },
            { "fromMark": 0.0, "toMark": 32.99, "grade": "F", "gradePoint": 0.0 }
        ]
    })
}

fn store_config(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>, id: &str) -> String {
    let stored = request_ok(stdin, reader, id, "examConfig.store", exam_config_params());
    assert_eq!(stored["status"].as_str(), Some("config_saved"));
    assert!(stored["expiresAt"].as_str().is_some());
    let temp_id = stored["tempId"].as_str().expect("tempId").to_string();
    assert!(temp_id.starts_with("temp_"));
    temp_id
}

#[test]
fn store_then_compute_covers_pass_grace_and_absent() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let temp_id = store_config(&mut stdin, &mut reader, "1");

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "marks.compute",
        json!({
            "tempId": temp_id,
            "students": [
                { "studentId": "s1", "attendanceStatus": "present",
                  "partMarks": { "CQ": 50.0, "MCQ": 20.0 } },
                { "studentId": "s2", "attendanceStatus": "present",
                  "partMarks": { "CQ": 25.0, "MCQ": 5.0 } },
                { "studentId": "s3",
                  "partMarks": { "CQ": 60.0, "MCQ": 25.0 } }
            ]
        }),
    );

    assert_eq!(result["examType"].as_str(), Some("semester"));
    assert_eq!(result["examName"].as_str(), Some("Mid Term"));
    assert_eq!(result["subjectName"].as_str(), Some("Physics"));
    assert_eq!(result["instituteId"].as_str(), Some("inst-1"));

    let rows = result["results"].as_array().expect("results array");
    assert_eq!(rows.len(), 3);

    // Clean pass: 70/100, grade A.
    assert_eq!(rows[0]["studentId"].as_str(), Some("s1"));
    assert_eq!(rows[0]["finalMark"].as_f64(), Some(70.0));
    assert_eq!(rows[0]["graceMark"].as_f64(), Some(0.0));
    assert_eq!(rows[0]["resultStatus"].as_str(), Some("Pass"));
    assert_eq!(rows[0]["grade"].as_str(), Some("A"));
    assert_eq!(rows[0]["percentage"].as_f64(), Some(70.0));

    // Grace pass: obtained 30, threshold 32.01, needs 3 of the 5 available.
    assert_eq!(rows[1]["obtainedMark"].as_f64(), Some(30.0));
    assert_eq!(rows[1]["graceMark"].as_f64(), Some(3.0));
    assert_eq!(rows[1]["finalMark"].as_f64(), Some(33.0));
    assert_eq!(rows[1]["resultStatus"].as_str(), Some("Pass"));
    assert_eq!(rows[1]["remark"].as_str(), Some("Pass by Grace (+3 marks)"));

    // Missing attendance status counts as absent when attendance is required.
    assert_eq!(rows[2]["resultStatus"].as_str(), Some("Fail"));
    assert_eq!(rows[2]["remark"].as_str(), Some("Absent"));
    assert_eq!(rows[2]["finalMark"].as_f64(), Some(0.0));
    assert_eq!(rows[2]["grade"].as_str(), Some("F"));

    let _ = child.kill();
}

#[test]
fn stored_config_is_single_use() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let temp_id = store_config(&mut stdin, &mut reader, "1");

    let students = json!([
        { "studentId": "s1", "attendanceStatus": "present",
          "partMarks": { "CQ": 50.0, "MCQ": 20.0 } }
    ]);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "marks.compute",
        json!({ "tempId": temp_id, "students": students }),
    );

    let resp = request(
        &mut stdin,
        &mut reader,
        "3",
        "marks.compute",
        json!({ "tempId": temp_id, "students": students }),
    );
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(resp["error"]["code"].as_str(), Some("config_expired"));

    let _ = child.kill();
}

#[test]
fn unknown_temp_id_is_rejected() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "marks.compute",
        json!({
            "tempId": "temp_does_not_exist",
            "students": [{ "studentId": "s1", "partMarks": {} }]
        }),
    );
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(resp["error"]["code"].as_str(), Some("config_expired"));
    let _ = child.kill();
}

#[test]
fn missing_inputs_are_bad_params() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "marks.compute",
        json!({ "students": [{ "studentId": "s1" }] }),
    );
    assert_eq!(resp["error"]["code"].as_str(), Some("bad_params"));
    assert_eq!(resp["error"]["message"].as_str(), Some("missing tempId"));

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "marks.compute",
        json!({ "tempId": "temp_x", "students": [] }),
    );
    assert_eq!(resp["error"]["code"].as_str(), Some("bad_params"));

    let resp = request(
        &mut stdin,
        &mut reader,
        "3",
        "examConfig.store",
        json!({ "subjects": [] }),
    );
    assert_eq!(resp["error"]["code"].as_str(), Some("bad_params"));
    assert_eq!(resp["error"]["message"].as_str(), Some("missing instituteId"));

    let _ = child.kill();
}

#[test]
fn batch_cap_is_enforced() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let temp_id = store_config(&mut stdin, &mut reader, "1");

    let students: Vec<serde_json::Value> = (0..1001)
        .map(|i| {
            json!({
                "studentId": format!("s{}", i),
                "attendanceStatus": "present",
                "partMarks": { "CQ": 40.0, "MCQ": 10.0 }
            })
        })
        .collect();

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "marks.compute",
        json!({ "tempId": temp_id, "students": students }),
    );
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(resp["error"]["code"].as_str(), Some("bad_params"));
    assert_eq!(resp["error"]["details"]["max"].as_u64(), Some(1000));
    assert_eq!(resp["error"]["details"]["got"].as_u64(), Some(1001));

    let _ = child.kill();
}
