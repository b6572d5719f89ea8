use crate::calc::{self, CohortSummary, SubjectGrade};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, Session};

fn undetermined_grade(student_id: &str) -> SubjectGrade {
    SubjectGrade {
        student_id: student_id.to_string(),
        final_grade: None,
        passed: None,
        per_evaluation: Vec::new(),
    }
}

fn handle_grade_subject(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_gradebook", "no gradebook loaded", None);
    };
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.studentId", None);
    };

    // An unconfigured subject still answers: everything is undetermined.
    let grade = match session.doc.scheme.as_ref() {
        Some(scheme) => calc::compute_subject_grade(scheme, student_id, &session.book),
        None => undetermined_grade(student_id),
    };

    match serde_json::to_value(&grade) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "encode_failed", e.to_string(), None),
    }
}

fn cohort_student_ids(session: &Session, req: &Request) -> Result<Vec<String>, serde_json::Value> {
    match req.params.get("studentIds") {
        None => Ok(session.doc.students.iter().map(|s| s.id.clone()).collect()),
        Some(v) if v.is_null() => {
            Ok(session.doc.students.iter().map(|s| s.id.clone()).collect())
        }
        Some(v) => {
            let Some(arr) = v.as_array() else {
                return Err(err(
                    &req.id,
                    "bad_params",
                    "params.studentIds must be an array of strings",
                    None,
                ));
            };
            let mut ids = Vec::with_capacity(arr.len());
            for item in arr {
                let Some(s) = item.as_str() else {
                    return Err(err(
                        &req.id,
                        "bad_params",
                        "params.studentIds must be an array of strings",
                        None,
                    ));
                };
                ids.push(s.to_string());
            }
            Ok(ids)
        }
    }
}

fn handle_grade_cohort(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_gradebook", "no gradebook loaded", None);
    };
    let ids = match cohort_student_ids(session, req) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };

    let summary = match session.doc.scheme.as_ref() {
        Some(scheme) => calc::compute_cohort(scheme, &ids, &session.book),
        None => CohortSummary {
            pending: ids.len(),
            per_student: ids.iter().map(|id| undetermined_grade(id)).collect(),
            passed: 0,
            failed: 0,
            average: 0.0,
        },
    };

    let mut value = match serde_json::to_value(&summary) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "encode_failed", e.to_string(), None),
    };
    // Reporting consumers want roster names next to the grades.
    if let Some(entries) = value.get_mut("perStudent").and_then(|v| v.as_array_mut()) {
        for entry in entries {
            let id = entry
                .get("studentId")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let name = session
                .doc
                .students
                .iter()
                .find(|s| s.id == id)
                .map(|s| s.display_name());
            entry["displayName"] = serde_json::Value::from(name);
        }
    }
    ok(&req.id, value)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grade.subject" => Some(handle_grade_subject(state, req)),
        "grade.cohort" => Some(handle_grade_cohort(state, req)),
        _ => None,
    }
}
