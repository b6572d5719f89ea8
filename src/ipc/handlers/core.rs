use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, Session};
use crate::model::GradebookDoc;
use serde_json::json;
use std::path::{Path, PathBuf};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "subjectId": state.session.as_ref().map(|s| s.doc.subject.id.clone()),
        }),
    )
}

fn loaded_summary(session: &Session) -> serde_json::Value {
    let status = calc::classify(&session.doc.subject, session.doc.scheme.as_ref());
    json!({
        "subjectId": session.doc.subject.id,
        "students": session.doc.students.len(),
        "scores": session.book.len(),
        "classification": status,
    })
}

fn handle_gradebook_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("document") else {
        return err(&req.id, "bad_params", "missing params.document", None);
    };
    let doc: GradebookDoc = match serde_json::from_value(raw.clone()) {
        Ok(d) => d,
        Err(e) => return err(&req.id, "bad_params", format!("invalid document: {e}"), None),
    };

    let session = Session::new(doc);
    let summary = loaded_summary(&session);
    state.session = Some(session);
    ok(&req.id, summary)
}

fn read_document(path: &Path) -> anyhow::Result<GradebookDoc> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn handle_gradebook_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match read_document(&path) {
        Ok(doc) => {
            let session = Session::new(doc);
            let summary = loaded_summary(&session);
            state.session = Some(session);
            ok(&req.id, summary)
        }
        Err(e) => err(&req.id, "doc_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "gradebook.load" => Some(handle_gradebook_load(state, req)),
        "gradebook.open" => Some(handle_gradebook_open(state, req)),
        _ => None,
    }
}
