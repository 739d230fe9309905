use crate::forms::io_common::{make_default_id, pad_national_id, ParsedResponse};
use crate::forms::*;

fn js_to_string(v: &JSValue) -> String {
    match v {
        JSValue::Null => "".to_string(),
        JSValue::String(s) => s.clone(),
        JSValue::Bool(b) => b.to_string(),
        JSValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn parse_response(id: String, js: &JSValue) -> FormsResult<ParsedResponse> {
    let obj = match js.as_object() {
        Some(obj) => obj,
        None => whatever!("{}: a response must be a JSON object, got {}", id, js),
    };
    let fields = obj
        .iter()
        .map(|(k, v)| {
            let s = js_to_string(v);
            if k == "nationalId" {
                (k.clone(), pad_national_id(&s))
            } else {
                (k.clone(), s)
            }
        })
        .collect();
    Ok(ParsedResponse { id, fields })
}

pub fn parse_json_responses(path: &str, js: &JSValue) -> FormsResult<Vec<ParsedResponse>> {
    let default_id = make_default_id(path);
    match js {
        JSValue::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(idx, x)| parse_response(default_id(idx + 1), x))
            .collect(),
        x => Ok(vec![parse_response(default_id(1), x)?]),
    }
}

/// Reads one response (a JSON object) or a list of them.
pub fn read_json_responses(path: &str) -> FormsResult<Vec<ParsedResponse>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_json_responses: {}: {}", path, js);
    parse_json_responses(path, &js)
}
