// ********* Form data structures ***********

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The importance given by the respondent to one of the three ranked answers.
///
/// On the historical forms, the selector showed `3 - Maior importância`,
/// `2 - Média importância` and `1 - Menor importância`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Rank {
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "high")]
    High,
}

impl Rank {
    /// In the order of the selector: most important first.
    pub const ALL: [Rank; 3] = [Rank::High, Rank::Medium, Rank::Low];

    /// Accepts the English names, the digits of the selector and the Portuguese labels.
    pub fn parse(s: &str) -> Option<Rank> {
        match s.trim() {
            "high" | "3" | "Maior importância" => Some(Rank::High),
            "medium" | "2" | "Média importância" => Some(Rank::Medium),
            "low" | "1" | "Menor importância" => Some(Rank::Low),
            _ => None,
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Rank::High => "high",
            Rank::Medium => "medium",
            Rank::Low => "low",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rank::High => "3 - Maior importância",
            Rank::Medium => "2 - Média importância",
            Rank::Low => "1 - Menor importância",
        }
    }
}

/// Whether the respondent filled the form alone or with an applicator.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum ApplicationMode {
    #[serde(rename = "self-applied")]
    SelfApplied,
    /// Requires the name of the applicator.
    #[serde(rename = "assisted")]
    Assisted,
}

impl ApplicationMode {
    pub fn parse(s: &str) -> Option<ApplicationMode> {
        match s.trim() {
            "self-applied" | "auto" => Some(ApplicationMode::SelfApplied),
            "assisted" | "assistida" => Some(ApplicationMode::Assisted),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationMode::SelfApplied => "Auto Aplicação",
            ApplicationMode::Assisted => "Aplicação Assistida",
        }
    }
}

/// Who chose the activity.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum ActivityChoice {
    #[serde(rename = "self")]
    Respondent,
    #[serde(rename = "applicator")]
    Applicator,
}

impl ActivityChoice {
    pub fn parse(s: &str) -> Option<ActivityChoice> {
        match s.trim() {
            "self" | "propria" | "própria" => Some(ActivityChoice::Respondent),
            "applicator" | "aplicador" => Some(ActivityChoice::Applicator),
            _ => None,
        }
    }
}

/// One of the three rows of the ranked answers table.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum AnswerSlot {
    First,
    Second,
    Third,
}

impl AnswerSlot {
    pub const ALL: [AnswerSlot; 3] = [AnswerSlot::First, AnswerSlot::Second, AnswerSlot::Third];

    pub fn index(&self) -> usize {
        match self {
            AnswerSlot::First => 0,
            AnswerSlot::Second => 1,
            AnswerSlot::Third => 2,
        }
    }

    pub fn from_index(idx: usize) -> Option<AnswerSlot> {
        AnswerSlot::ALL.get(idx).copied()
    }
}

/// The columns of the ranked answers table.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum AnswerField {
    Text,
    Rank,
    Justification,
}

/// All the fields that can be edited, validated and touched.
///
/// The ordering follows the layout of the form, which keeps the error maps
/// in reading order.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum FieldKey {
    FullName,
    Email,
    BirthPlace,
    NationalId,
    BirthDate,
    PurposeStatement,
    ApplicationMode,
    ApplicatorName,
    ActivityChoice,
    BehaviorFractal,
    Answer(AnswerSlot, AnswerField),
    FinalFeedback,
}

impl FieldKey {
    /// The name of the field in answer files, spreadsheet headers and error reports.
    pub fn wire_name(&self) -> Cow<'static, str> {
        match self {
            FieldKey::FullName => Cow::Borrowed("fullName"),
            FieldKey::Email => Cow::Borrowed("email"),
            FieldKey::BirthPlace => Cow::Borrowed("birthPlace"),
            FieldKey::NationalId => Cow::Borrowed("nationalId"),
            FieldKey::BirthDate => Cow::Borrowed("birthDate"),
            FieldKey::PurposeStatement => Cow::Borrowed("purposeStatement"),
            FieldKey::ApplicationMode => Cow::Borrowed("applicationMode"),
            FieldKey::ApplicatorName => Cow::Borrowed("applicatorName"),
            FieldKey::ActivityChoice => Cow::Borrowed("activityChoice"),
            FieldKey::BehaviorFractal => Cow::Borrowed("behaviorFractal"),
            FieldKey::FinalFeedback => Cow::Borrowed("finalFeedback"),
            FieldKey::Answer(slot, field) => {
                let prefix = match field {
                    AnswerField::Text => "answerText",
                    AnswerField::Rank => "rank",
                    AnswerField::Justification => "justification",
                };
                Cow::Owned(format!("{}{}", prefix, slot.index() + 1))
            }
        }
    }

    pub fn from_wire_name(name: &str) -> Option<FieldKey> {
        let key = match name.trim() {
            "fullName" => FieldKey::FullName,
            "email" => FieldKey::Email,
            "birthPlace" => FieldKey::BirthPlace,
            "nationalId" => FieldKey::NationalId,
            "birthDate" => FieldKey::BirthDate,
            "purposeStatement" => FieldKey::PurposeStatement,
            "applicationMode" => FieldKey::ApplicationMode,
            "applicatorName" => FieldKey::ApplicatorName,
            "activityChoice" => FieldKey::ActivityChoice,
            "behaviorFractal" => FieldKey::BehaviorFractal,
            "finalFeedback" => FieldKey::FinalFeedback,
            other => {
                let (field, number) = if let Some(n) = other.strip_prefix("answerText") {
                    (AnswerField::Text, n)
                } else if let Some(n) = other.strip_prefix("rank") {
                    (AnswerField::Rank, n)
                } else if let Some(n) = other.strip_prefix("justification") {
                    (AnswerField::Justification, n)
                } else {
                    return None;
                };
                let slot = match number {
                    "1" => AnswerSlot::First,
                    "2" => AnswerSlot::Second,
                    "3" => AnswerSlot::Third,
                    _ => return None,
                };
                FieldKey::Answer(slot, field)
            }
        };
        Some(key)
    }

    /// The fields displayed by a form variant, in reading order.
    pub fn all(variant: &FormVariant) -> Vec<FieldKey> {
        let mut keys = vec![
            FieldKey::FullName,
            FieldKey::Email,
            FieldKey::BirthPlace,
            FieldKey::NationalId,
            FieldKey::BirthDate,
            FieldKey::PurposeStatement,
            FieldKey::ApplicationMode,
            FieldKey::ApplicatorName,
            FieldKey::ActivityChoice,
        ];
        if variant.has_behavior_fractal() {
            keys.push(FieldKey::BehaviorFractal);
        }
        for slot in AnswerSlot::ALL {
            keys.push(FieldKey::Answer(slot, AnswerField::Text));
            keys.push(FieldKey::Answer(slot, AnswerField::Rank));
            keys.push(FieldKey::Answer(slot, AnswerField::Justification));
        }
        keys.push(FieldKey::FinalFeedback);
        keys
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankedAnswer {
    #[serde(rename = "answerText")]
    pub answer_text: String,
    pub rank: Option<Rank>,
    pub justification: String,
}

/// The record built during a session, and sent to the collector once finalized.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FormRecord {
    #[serde(rename = "formId")]
    pub form_id: String,
    #[serde(rename = "responseId")]
    pub response_id: String,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    #[serde(rename = "completionSeconds")]
    pub completion_seconds: u64,
    #[serde(rename = "submissionDate")]
    pub submission_date: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: String,
    #[serde(rename = "birthPlace")]
    pub birth_place: String,
    /// As displayed: `XXX.XXX.XXX-XX` once complete.
    #[serde(rename = "nationalId")]
    pub national_id: String,
    #[serde(rename = "birthDate")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "purposeStatement")]
    pub purpose_statement: String,
    #[serde(rename = "applicationMode")]
    pub application_mode: Option<ApplicationMode>,
    #[serde(rename = "applicatorName")]
    pub applicator_name: String,
    #[serde(rename = "activityChoice")]
    pub activity_choice: Option<ActivityChoice>,
    /// Only present in the variants that ask for it.
    #[serde(rename = "behaviorFractal", skip_serializing_if = "Option::is_none")]
    pub behavior_fractal: Option<String>,
    #[serde(rename = "rankedAnswers")]
    pub ranked_answers: [RankedAnswer; 3],
    #[serde(rename = "finalFeedback")]
    pub final_feedback: String,
}

impl FormRecord {
    /// An empty draft for the given variant.
    pub fn empty(variant: &FormVariant) -> FormRecord {
        FormRecord {
            form_id: variant.form_id.clone(),
            response_id: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            completion_seconds: 0,
            submission_date: String::new(),
            full_name: String::new(),
            email: String::new(),
            birth_place: String::new(),
            national_id: String::new(),
            birth_date: None,
            purpose_statement: String::new(),
            application_mode: None,
            applicator_name: String::new(),
            activity_choice: None,
            behavior_fractal: if variant.has_behavior_fractal() {
                Some(String::new())
            } else {
                None
            },
            ranked_answers: Default::default(),
            final_feedback: String::new(),
        }
    }

    pub fn answer(&self, slot: AnswerSlot) -> &RankedAnswer {
        &self.ranked_answers[slot.index()]
    }

    pub(crate) fn answer_mut(&mut self, slot: AnswerSlot) -> &mut RankedAnswer {
        &mut self.ranked_answers[slot.index()]
    }

    /// The national ID without its punctuation.
    pub fn national_id_digits(&self) -> String {
        self.national_id
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect()
    }
}

// ********* Variants **********

/// The historical questionnaires. They share all their logic and differ by
/// the presence of the behavior fractal label and by their prompts.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum VariantKind {
    #[serde(rename = "standard")]
    Standard,
    #[serde(rename = "behaviorFractal")]
    BehaviorFractal,
}

impl VariantKind {
    pub fn parse(s: &str) -> Option<VariantKind> {
        match s.trim() {
            "standard" | "pergunta3" => Some(VariantKind::Standard),
            "behaviorFractal" | "pergunta2" => Some(VariantKind::BehaviorFractal),
            _ => None,
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            VariantKind::Standard => "standard",
            VariantKind::BehaviorFractal => "behaviorFractal",
        }
    }
}

pub const DEFAULT_REDIRECT_URL: &str = "https://www.lifenergy.com.br/";

/// Alert shown once the collector accepted the record.
pub const SUCCESS_MESSAGE: &str = "Formulário enviado com sucesso!";

/// Alert shown when the record could not be sent.
pub const FAILURE_MESSAGE: &str = "Erro ao enviar os dados.";

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FormVariant {
    pub kind: VariantKind,
    pub form_id: String,
    /// Where the page navigates after a successful submission.
    pub redirect_url: String,
}

impl FormVariant {
    pub fn new(kind: VariantKind) -> FormVariant {
        let form_id = match kind {
            VariantKind::Standard => "pergunta3",
            VariantKind::BehaviorFractal => "pergunta2",
        };
        FormVariant {
            kind,
            form_id: form_id.to_string(),
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
        }
    }

    pub fn standard() -> FormVariant {
        FormVariant::new(VariantKind::Standard)
    }

    pub fn behavior_fractal() -> FormVariant {
        FormVariant::new(VariantKind::BehaviorFractal)
    }

    pub fn has_behavior_fractal(&self) -> bool {
        self.kind == VariantKind::BehaviorFractal
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            VariantKind::Standard => "Fractal De Comportamento",
            VariantKind::BehaviorFractal => "Fractal De Comportamento (Atividade)",
        }
    }

    /// The question answered by the three ranked answers.
    pub fn ranked_prompt(&self) -> &'static str {
        match self.kind {
            VariantKind::Standard => "Suponha que você joga na Mega-Sena e ganha. Cite as 3 primeiras coisas que faria com o dinheiro. Hierarquize e justifique.",
            VariantKind::BehaviorFractal => "Cite três aspectos mais frequentes que seus amigos pensam de você. Hierarquize e justifique.",
        }
    }
}

// ********* Errors **********

/// A validation failure for one field. Displayed in Portuguese, as shown to
/// the respondent.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum FieldError {
    Required(FieldKey),
    /// The full name needs at least a first and a last name.
    IncompleteName,
    InvalidEmail,
    InvalidNationalId,
}

impl Error for FieldError {}

impl Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            FieldError::Required(key) => match key {
                FieldKey::FullName => "Nome completo é obrigatório",
                FieldKey::Email => "Email é obrigatório",
                FieldKey::BirthPlace => "Naturalidade é obrigatória",
                FieldKey::NationalId => "CPF é obrigatório",
                FieldKey::BirthDate => "Data de nascimento é obrigatória",
                FieldKey::PurposeStatement => "Objetivo é obrigatório",
                FieldKey::ApplicationMode => "Selecione o tipo de aplicação",
                FieldKey::ApplicatorName => "Nome do aplicador é obrigatório",
                FieldKey::ActivityChoice => "Escolha da atividade é obrigatória",
                FieldKey::BehaviorFractal => "Fractal de comportamento é obrigatório",
                FieldKey::Answer(_, AnswerField::Text) => "Resposta é obrigatória",
                FieldKey::Answer(_, AnswerField::Rank) => "Hierarquia é obrigatória",
                FieldKey::Answer(_, AnswerField::Justification) => "Justificativa é obrigatória",
                FieldKey::FinalFeedback => "Feedback final é obrigatório",
            },
            FieldError::IncompleteName => "Digite o nome completo com pelo menos duas palavras",
            FieldError::InvalidEmail => "Email inválido",
            FieldError::InvalidNationalId => "CPF inválido",
        };
        write!(f, "{}", msg)
    }
}

pub type ErrorMap = BTreeMap<FieldKey, FieldError>;

/// The collector could not be reached. The form stays editable and the
/// submission can be retried.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> TransportError {
        TransportError {
            message: message.into(),
        }
    }
}

impl Error for TransportError {}

impl Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TransportError: {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names() {
        assert!(matches!(FieldKey::Email.wire_name(), Cow::Borrowed("email")));
        let rank2 = FieldKey::Answer(AnswerSlot::Second, AnswerField::Rank);
        assert_eq!(rank2.wire_name(), "rank2");
        for key in FieldKey::all(&FormVariant::behavior_fractal()) {
            assert_eq!(FieldKey::from_wire_name(&key.wire_name()), Some(key));
        }
    }
}
