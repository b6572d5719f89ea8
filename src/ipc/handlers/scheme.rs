use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn handle_classify(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_gradebook", "no gradebook loaded", None);
    };

    let detail = calc::classify_detail(&session.doc.subject, session.doc.scheme.as_ref());
    match serde_json::to_value(&detail) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "encode_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "scheme.classify" => Some(handle_classify(state, req)),
        _ => None,
    }
}
