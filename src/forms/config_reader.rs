use crate::forms::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSettings {
    #[serde(rename = "formId")]
    pub form_id: Option<String>,
    #[serde(rename = "variant")]
    pub variant: Option<String>,
    #[serde(rename = "collectorUrl")]
    pub collector_url: Option<String>,
    #[serde(rename = "redirectUrl")]
    pub redirect_url: Option<String>,
    #[serde(rename = "timeoutSeconds")]
    pub timeout_seconds: Option<u64>,
}

impl FormSettings {
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "firstRowIndex")]
    pub first_row_index: Option<JSValue>,
}

impl ResponseSource {
    /// The row of the header, starting at 0.
    pub fn first_row_index(&self) -> FormsResult<usize> {
        if self.first_row_index.is_none() {
            return Ok(0);
        }
        let x = read_js_int(&self.first_row_index)?;
        if x == 0 {
            whatever!("firstRowIndex starts at 1");
        }
        Ok(x - 1)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormsConfig {
    #[serde(rename = "formSettings", default)]
    pub form_settings: FormSettings,
    #[serde(rename = "responseSources", default)]
    pub response_sources: Vec<ResponseSource>,
}

pub fn read_config(path: &str) -> FormsResult<FormsConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: FormsConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

pub fn read_summary(path: &str) -> FormsResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>) -> FormsResult<usize> {
    match x {
        Some(JSValue::Number(n)) => match n.as_u64() {
            Some(i) => Ok(i as usize),
            None => whatever!("Expected a positive integer, got {}", n),
        },
        Some(JSValue::String(s)) => match s.trim().parse::<usize>() {
            Ok(i) => Ok(i),
            Err(_) => whatever!("Expected a positive integer, got {:?}", s),
        },
        other => whatever!("Expected a positive integer, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let js = r#"{
            "formSettings": { "variant": "behaviorFractal", "collectorUrl": "http://localhost:9/exec" },
            "responseSources": [
                { "provider": "xlsx", "filePath": "export.xlsx", "firstRowIndex": "3" },
                { "provider": "json", "filePath": "maria.json" }
            ]
        }"#;
        let config: FormsConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.form_settings.variant.as_deref(), Some("behaviorFractal"));
        assert_eq!(config.form_settings.timeout_seconds(), DEFAULT_TIMEOUT_SECONDS);
        assert_eq!(config.response_sources[0].first_row_index().unwrap(), 2);
        assert_eq!(config.response_sources[1].first_row_index().unwrap(), 0);
    }

    #[test]
    fn zero_row_index() {
        let source = ResponseSource {
            provider: "xlsx".to_string(),
            file_path: "export.xlsx".to_string(),
            excel_worksheet_name: None,
            first_row_index: Some(serde_json::json!(0)),
        };
        assert!(source.first_row_index().is_err());
    }

    #[test]
    fn empty_config() {
        let config: FormsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, FormsConfig::default());
    }
}
