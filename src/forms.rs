use log::{debug, info, warn};

use fractal_form::builder::Builder;
use fractal_form::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use std::collections::BTreeMap;
use text_diff::print_diff;

use crate::args::Args;
use crate::forms::config_reader::*;
use crate::forms::http_transport::{DryRunTransport, HttpTransport};
use crate::forms::io_common::ParsedResponse;

pub mod config_reader;
pub mod http_transport;
mod io_common;
mod io_json;
mod io_xlsx;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FormsError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON in {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    WritingJson { source: serde_json::Error },
    #[snafu(display("Error opening spreadsheet {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet {name:?} in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("The spreadsheet {path} has no header row"))]
    EmptyExcel { path: String },
    #[snafu(display("Could not build the HTTP client"))]
    HttpClient { source: reqwest::Error },
    #[snafu(display("No parent directory for {path}"))]
    MissingParentDir { path: String },
    #[snafu(display("Difference detected between the summary and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type FormsResult<T> = Result<T, FormsError>;

/// What happened to one response.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[serde(rename = "submitted")]
    Submitted,
    #[serde(rename = "invalid")]
    Invalid,
    #[serde(rename = "transportFailed")]
    TransportFailed,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ResponseReport {
    pub source: String,
    pub status: ResponseStatus,
    /// Wire name of the field -> message shown to the respondent.
    pub errors: BTreeMap<String, String>,
}

fn error_messages(errors: &ErrorMap) -> BTreeMap<String, String> {
    errors
        .iter()
        .map(|(k, e)| (k.wire_name().into_owned(), e.to_string()))
        .collect()
}

/// Fills a fresh form with the answers of one response, as if they were typed.
fn fill_form(variant: &FormVariant, response: &ParsedResponse) -> FormController {
    let mut builder = Builder::new(variant.clone());
    for (name, value) in response.fields.iter() {
        match FieldKey::from_wire_name(name) {
            Some(key) => {
                builder = builder.field(key, value);
            }
            None => {
                debug!("fill_form: {}: ignoring column {:?}", response.id, name);
            }
        }
    }
    builder.build()
}

fn submit_response(
    variant: &FormVariant,
    response: &ParsedResponse,
    transport: &dyn Transport,
) -> ResponseReport {
    let mut form = fill_form(variant, response);
    let outcome = form.submit(transport);
    if let Some(msg) = outcome.message() {
        info!("{}: {}", response.id, msg);
    }
    let (status, errors) = match outcome {
        SubmitOutcome::Delivered { redirect_url } => {
            debug!("{}: delivered, next page {}", response.id, redirect_url);
            (ResponseStatus::Submitted, BTreeMap::new())
        }
        SubmitOutcome::Invalid(errors) => {
            warn!("{}: {} invalid field(s)", response.id, errors.len());
            (ResponseStatus::Invalid, error_messages(&errors))
        }
        SubmitOutcome::TransportFailed(e) => {
            warn!("{}: {}", response.id, e);
            (ResponseStatus::TransportFailed, BTreeMap::new())
        }
        // A fresh form is always editable.
        x => {
            warn!("{}: unexpected outcome {:?}", response.id, x);
            (ResponseStatus::TransportFailed, BTreeMap::new())
        }
    };
    ResponseReport {
        source: response.id.clone(),
        status,
        errors,
    }
}

fn read_responses(root: &Path, source: &ResponseSource) -> FormsResult<Vec<ParsedResponse>> {
    let p: PathBuf = root.join(&source.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read responses {:?}", p2);
    match source.provider.as_str() {
        "json" => io_json::read_json_responses(&p2),
        "xlsx" => io_xlsx::read_xlsx_responses(&p2, source),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

fn build_variant(settings: &FormSettings) -> FormsResult<FormVariant> {
    let kind = match settings.variant.as_deref() {
        None => VariantKind::Standard,
        Some(s) => match VariantKind::parse(s) {
            Some(k) => k,
            None => whatever!("Unknown form variant {:?}", s),
        },
    };
    let mut variant = FormVariant::new(kind);
    if let Some(form_id) = settings.form_id.clone() {
        variant.form_id = form_id;
    }
    if let Some(url) = settings.redirect_url.clone() {
        variant.redirect_url = url;
    }
    Ok(variant)
}

fn build_summary_js(variant: &FormVariant, reports: &[ResponseReport]) -> JSValue {
    json!({
        "form": {
            "formId": variant.form_id,
            "variant": variant.kind.wire_name(),
        },
        "responses": reports,
    })
}

/// Reads the configuration, with the overrides of the command line.
///
/// Returns the configuration and the directory against which the response
/// files are resolved.
fn read_plan(args: &Args) -> FormsResult<(FormsConfig, PathBuf)> {
    let (mut config, root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {
                    path: config_path.clone(),
                })?
                .to_path_buf();
            (config, root)
        }
        None => (FormsConfig::default(), PathBuf::new()),
    };

    if let Some(input) = &args.input {
        config.response_sources = vec![ResponseSource {
            provider: args.input_type.clone().unwrap_or_else(|| "json".to_string()),
            file_path: input.clone(),
            excel_worksheet_name: args.excel_worksheet_name.clone(),
            first_row_index: None,
        }];
        // Given on the command line: relative to the working directory.
        return Ok((apply_overrides(config, args), PathBuf::new()));
    }

    if config.response_sources.is_empty() {
        whatever!("No sources of answers: use --input or a configuration file with responseSources");
    }
    config = apply_overrides(config, args);
    Ok((config, root))
}

fn apply_overrides(mut config: FormsConfig, args: &Args) -> FormsConfig {
    if let Some(v) = &args.variant {
        config.form_settings.variant = Some(v.clone());
    }
    if let Some(url) = &args.collector_url {
        config.form_settings.collector_url = Some(url.clone());
    }
    if let Some(name) = &args.excel_worksheet_name {
        for source in config.response_sources.iter_mut() {
            source.excel_worksheet_name = Some(name.clone());
        }
    }
    config
}

/// Runs all the responses of the configuration through the form and returns
/// the summary.
pub fn run_config(config: &FormsConfig, root: &Path, dry_run: bool) -> FormsResult<JSValue> {
    info!("config: {:?}", config);
    let variant = build_variant(&config.form_settings)?;

    let http: Option<HttpTransport> = match (&config.form_settings.collector_url, dry_run) {
        (Some(url), false) => {
            let timeout = Duration::from_secs(config.form_settings.timeout_seconds());
            Some(HttpTransport::new(url, timeout)?)
        }
        _ => None,
    };
    let transport: &dyn Transport = match &http {
        Some(t) => t,
        None => {
            info!("No collector: the records are not sent");
            &DryRunTransport
        }
    };

    let mut reports: Vec<ResponseReport> = Vec::new();
    for source in config.response_sources.iter() {
        let responses = read_responses(root, source)?;
        info!("Read {} response(s) from {}", responses.len(), source.file_path);
        for response in responses.iter() {
            reports.push(submit_response(&variant, response, transport));
        }
    }
    Ok(build_summary_js(&variant, &reports))
}

pub fn run_forms(args: &Args) -> FormsResult<()> {
    let (config, root) = read_plan(args)?;
    let summary_js = run_config(&config, &root, args.dry_run)?;

    let pretty_js_summary = serde_json::to_string_pretty(&summary_js).context(WritingJsonSnafu {})?;
    match args.out.as_deref() {
        None | Some("stdout") => println!("{}", pretty_js_summary),
        Some(out_path) => {
            info!("Writing summary to {}", out_path);
            fs::write(out_path, &pretty_js_summary).context(WritingFileSnafu {
                path: out_path.to_string(),
            })?;
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(WritingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_summary {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_summary.as_str(),
                "\n",
            );
            return ReferenceMismatchSnafu {
                path: summary_p.clone(),
            }
            .fail();
        }
    }

    Ok(())
}

fn run_forms_test(test_name: &str, config_lpath: &str, summary_lpath: &str) -> FormsResult<()> {
    let test_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data");
    info!("Running test {}", test_name);
    let args = Args {
        config: Some(format!("{}/{}/{}", test_dir, test_name, config_lpath)),
        reference: Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
        out: Some(format!("{}/{}_summary.json", std::env::temp_dir().display(), test_name)),
        dry_run: true,
        ..Args::default()
    };
    run_forms(&args)
}

pub fn test_wrapper(test_name: &str) {
    let res = run_forms_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    );
    if let Err(e) = res {
        eprintln!("An error occured {}", e);
        panic!("test {} failed: {:?}", test_name, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractal_form::TransportError;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn maria() -> ParsedResponse {
        let fields = [
            ("fullName", "maria silva"),
            ("email", "maria@example.com"),
            ("birthPlace", "Fortaleza"),
            ("nationalId", "52998224725"),
            ("birthDate", "1990-05-17"),
            ("purposeStatement", "Autoconhecimento"),
            ("applicationMode", "auto"),
            ("activityChoice", "propria"),
            ("answerText1", "Comprar uma casa"),
            ("rank1", "3"),
            ("justification1", "Segurança"),
            ("answerText2", "Viajar"),
            ("rank2", "Média importância"),
            ("justification2", "Conhecer o mundo"),
            ("answerText3", "Doar"),
            ("rank3", "low"),
            ("justification3", "Ajudar"),
            ("finalFeedback", "Foi interessante"),
            ("Carimbo de data/hora", "2024-03-09 14:12"),
        ];
        ParsedResponse {
            id: "maria".to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn valid_response_is_submitted() {
        init();
        let report = submit_response(&FormVariant::standard(), &maria(), &DryRunTransport);
        assert_eq!(report.status, ResponseStatus::Submitted);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn assisted_without_applicator_is_invalid() {
        let mut response = maria();
        response
            .fields
            .push(("applicationMode".to_string(), "assistida".to_string()));
        let calls = std::cell::Cell::new(0);
        let counting = |_: &FormRecord| {
            calls.set(calls.get() + 1);
            Ok::<(), TransportError>(())
        };
        let report = submit_response(&FormVariant::standard(), &response, &counting);
        assert_eq!(report.status, ResponseStatus::Invalid);
        assert_eq!(
            report.errors.get("applicatorName").map(|s| s.as_str()),
            Some("Nome do aplicador é obrigatório")
        );
        assert_eq!(report.errors.len(), 1);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn transport_failure_is_reported() {
        let failing = |_: &FormRecord| Err::<(), TransportError>(TransportError::new("no network"));
        let report = submit_response(&FormVariant::standard(), &maria(), &failing);
        assert_eq!(report.status, ResponseStatus::TransportFailed);
    }

    #[test]
    fn unknown_variant() {
        let settings = FormSettings {
            variant: Some("pergunta9".to_string()),
            ..FormSettings::default()
        };
        assert!(build_variant(&settings).is_err());
    }

    #[test]
    fn form_id_override() {
        let settings = FormSettings {
            variant: Some("behaviorFractal".to_string()),
            form_id: Some("pergunta2-b".to_string()),
            ..FormSettings::default()
        };
        let variant = build_variant(&settings).unwrap();
        assert!(variant.has_behavior_fractal());
        assert_eq!(variant.form_id, "pergunta2-b");
    }

    #[test]
    fn unknown_provider() {
        let source = ResponseSource {
            provider: "csv".to_string(),
            file_path: "answers.csv".to_string(),
            excel_worksheet_name: None,
            first_row_index: None,
        };
        assert!(read_responses(Path::new("."), &source).is_err());
    }

    #[test]
    fn command_line_input_overrides_sources() {
        let args = Args {
            input: Some("answers.xlsx".to_string()),
            input_type: Some("xlsx".to_string()),
            excel_worksheet_name: Some("Respostas".to_string()),
            variant: Some("behaviorFractal".to_string()),
            ..Args::default()
        };
        let (config, root) = read_plan(&args).unwrap();
        assert_eq!(root, PathBuf::new());
        assert_eq!(config.response_sources.len(), 1);
        let source = &config.response_sources[0];
        assert_eq!(source.provider, "xlsx");
        assert_eq!(source.excel_worksheet_name.as_deref(), Some("Respostas"));
        assert_eq!(config.form_settings.variant.as_deref(), Some("behaviorFractal"));
    }

    #[test]
    fn no_sources() {
        assert!(read_plan(&Args::default()).is_err());
    }

    #[test]
    fn valid_standard() {
        test_wrapper("valid_standard");
    }

    #[test]
    fn mixed_behavior_fractal() {
        test_wrapper("mixed_behavior_fractal");
    }

    #[test]
    fn xlsx_export() {
        test_wrapper("xlsx_export");
    }
}
