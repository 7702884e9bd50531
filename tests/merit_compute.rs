
use serde_json::json;
use test_support::{request_ok, spawn_sidecar};

fn merit_params(merit_process_type: &str, results: serde_json::Value) -> serde_json::Value {
    json!({
        "examName": "Annual",
        "examConfig": {
            "meritProcessType": merit_process_type,
            "groupBySection": true,
            "groupByGender": true
        },
        "results": results,
        "academicDetails": {
            "s1": { "classRoll": 2, "section": "A", "shift": "Morning" },
            "s2": { "classRoll": 1, "section": "B", "shift": "Morning" },
            "s3": { "classRoll": 3, "section": "A", "shift": "Day" },
            "s4": { "classRoll": 4, "section": "A", "shift": "Day" }
        },
        "studentDetails": {
            "s1": { "gender": "female", "religion": "islam" },
            "s2": { "gender": "male", "religion": "islam" },
            "s3": { "gender": "female", "religion": "hindu" },
            "s4": { "gender": "male", "religion": "hindu" }
        }
    })
}

fn results_fixture() -> serde_json::Value {
    json!([
        { "studentId": "s1", "studentName": "Abir", "resultStatus": "Pass",
          "gpaWithOptional": 5.0, "totalMarkWithOptional": 700.0, "letterGrade": "A+" },
        { "studentId": "s2", "studentName": "Binita", "resultStatus": "Pass",
          "gpaWithOptional": 5.0, "totalMarkWithOptional": 680.0, "letterGrade": "A+" },
        { "studentId": "s3", "studentName": "Chitra", "resultStatus": "Pass",
          "gpaWithOptional": 4.5, "totalMarkWithOptional": 690.0, "letterGrade": "A" },
        { "studentId": "s4", "studentName": "Dipu", "resultStatus": "Fail",
          "gpaWithOptional": 0.0, "totalMarkWithOptional": 720.0, "letterGrade": "F" }
    ])
}

#[test]
fn sequential_ranking_by_grade_point() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let result = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "merit.compute",
        merit_params("gpa_sequential", results_fixture()),
    );

    assert_eq!(result["totalStudents"].as_u64(), Some(4));
    assert_eq!(result["meritType"].as_str(), Some("gpa_sequential"));
    assert_eq!(result["groupedBy"], json!(["section", "gender"]));
    assert!(result.get("error").is_none());

    let all = result["data"]["allStudents"].as_array().expect("ranking");
    let order: Vec<(&str, u64)> = all
        .iter()
        .map(|r| {
            (
                r["studentId"].as_str().expect("id"),
                r["meritPosition"].as_u64().expect("position"),
            )
        })
        .collect();
    // GPA ties break on total mark; the failed student sorts last despite
    // the highest total.
    assert_eq!(
        order,
        vec![("s1", 1), ("s2", 2), ("s3", 3), ("s4", 4)]
    );

    let _ = child.kill();
}

#[test]
fn non_sequential_ranking_shares_tied_positions() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let mut results = results_fixture();
    results[1]["totalMarkWithOptional"] = json!(700.0); // full tie with s1
    let result = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "merit.compute",
        merit_params("gpa_non_sequential", results),
    );

    let all = result["data"]["allStudents"].as_array().expect("ranking");
    let order: Vec<(&str, u64)> = all
        .iter()
        .map(|r| {
            (
                r["studentId"].as_str().expect("id"),
                r["meritPosition"].as_u64().expect("position"),
            )
        })
        .collect();
    // s2 wins the tie on roll but shares position 1; the next distinct GPA
    // lands at 3, and the failed student takes 4.
    assert_eq!(
        order,
        vec![("s2", 1), ("s1", 1), ("s3", 3), ("s4", 4)]
    );

    let _ = child.kill();
}

#[test]
fn grouped_views_partition_the_class_ranking() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let result = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "merit.compute",
        merit_params("total_mark_sequential", results_fixture()),
    );

    let all = result["data"]["allStudents"].as_array().expect("ranking");
    let section_wise = result["data"]["sectionWise"].as_object().expect("sections");

    let mut union: Vec<(String, u64)> = section_wise
        .values()
        .flat_map(|rows| rows.as_array().expect("section rows"))
        .map(|r| {
            (
                r["studentId"].as_str().expect("id").to_string(),
                r["meritPosition"].as_u64().expect("position"),
            )
        })
        .collect();
    union.sort();
    let mut class_wide: Vec<(String, u64)> = all
        .iter()
        .map(|r| {
            (
                r["studentId"].as_str().expect("id").to_string(),
                r["meritPosition"].as_u64().expect("position"),
            )
        })
        .collect();
    class_wide.sort();
    assert_eq!(union, class_wide);

    // Positions are class-wide inside each view; section B holds only s2.
    let section_b = section_wise["B"].as_array().expect("section B");
    assert_eq!(section_b.len(), 1);
    assert_eq!(section_b[0]["studentId"].as_str(), Some("s2"));
    let gender_wise = result["data"]["genderWise"].as_object().expect("genders");
    assert_eq!(gender_wise["female"].as_array().map(|r| r.len()), Some(2));
    assert_eq!(gender_wise["male"].as_array().map(|r| r.len()), Some(2));

    let _ = child.kill();
}

#[test]
fn empty_results_report_in_band() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let result = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "merit.compute",
        merit_params("gpa_sequential", json!([])),
    );
    assert_eq!(result["error"].as_str(), Some("No results found"));
    assert_eq!(result["totalStudents"].as_u64(), Some(0));
    assert_eq!(
        result["data"]["allStudents"].as_array().map(|r| r.len()),
        Some(0)
    );
    let _ = child.kill();
}
