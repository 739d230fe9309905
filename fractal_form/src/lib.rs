mod config;
pub mod builder;
pub mod manual;
pub mod transport;
pub mod validation;

use log::{debug, info, warn};

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rand::distributions::Alphanumeric;
use rand::Rng;

pub use crate::config::*;
pub use crate::transport::{Clock, SystemClock, Transport};

use crate::transport::{format_date, format_time};
use crate::validation::{capitalize_words, format_national_id, national_id_digits, NATIONAL_ID_LEN};

// **** Session state ****

/// Where the controller is in its life.
///
/// Validation happens synchronously inside `begin_submit`, so it never shows
/// up as a phase.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Phase {
    Editing,
    /// A record was handed to the transport and its outcome is not known yet.
    Submitting,
    /// The collector accepted the record. Terminal.
    Submitted,
}

/// A record waiting for its transport outcome.
///
/// Only one of them can exist for a controller at any time.
#[derive(Debug)]
pub struct PendingSubmission {
    record: FormRecord,
}

impl PendingSubmission {
    pub fn record(&self) -> &FormRecord {
        &self.record
    }
}

/// The first half of a submission.
#[derive(Debug)]
pub enum Submission {
    /// The record is valid and finalized: it must be given to the transport.
    Ready(PendingSubmission),
    /// Nothing is sent. All the fields are now touched.
    Invalid(ErrorMap),
    AlreadySubmitting,
    Closed,
}

/// The outcome of a submission, as reported to the respondent.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SubmitOutcome {
    /// The page should navigate to the given location.
    Delivered { redirect_url: String },
    Invalid(ErrorMap),
    /// The form stays editable and the submission can be retried.
    TransportFailed(TransportError),
    AlreadySubmitting,
    Closed,
}

impl SubmitOutcome {
    /// The alert to show, if any.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            SubmitOutcome::Delivered { .. } => Some(SUCCESS_MESSAGE),
            SubmitOutcome::TransportFailed(_) => Some(FAILURE_MESSAGE),
            _ => None,
        }
    }
}

/// Generates a response id: the epoch milliseconds and a short random suffix.
pub fn generate_response_id<R: Rng + ?Sized>(now: &DateTime<FixedOffset>, rng: &mut R) -> String {
    let suffix: String = (0..6)
        .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_lowercase())
        .collect();
    format!("{}-{}", now.timestamp_millis(), suffix)
}

/// The state of one form session.
///
/// It owns the draft record and everything the rendering layer needs to
/// display it: the errors, the touched fields and the submission phase.
pub struct FormController<C: Clock = SystemClock> {
    variant: FormVariant,
    clock: C,
    record: FormRecord,
    started_at: DateTime<FixedOffset>,
    errors: ErrorMap,
    touched: BTreeSet<FieldKey>,
    phase: Phase,
}

impl FormController<SystemClock> {
    /// Starts a session on the local clock.
    pub fn initialize(variant: FormVariant) -> FormController<SystemClock> {
        FormController::with_clock(variant, SystemClock)
    }
}

impl<C: Clock> FormController<C> {
    pub fn with_clock(variant: FormVariant, clock: C) -> FormController<C> {
        FormController::with_clock_and_rng(variant, clock, &mut rand::thread_rng())
    }

    pub fn with_clock_and_rng<R: Rng + ?Sized>(
        variant: FormVariant,
        clock: C,
        rng: &mut R,
    ) -> FormController<C> {
        let started_at = clock.now();
        let mut record = FormRecord::empty(&variant);
        record.response_id = generate_response_id(&started_at, rng);
        record.start_time = format_time(&started_at);
        info!(
            "initialize: form {} response {} started at {}",
            record.form_id, record.response_id, record.start_time
        );
        FormController {
            variant,
            clock,
            record,
            started_at,
            errors: ErrorMap::new(),
            touched: BTreeSet::new(),
            phase: Phase::Editing,
        }
    }

    pub fn variant(&self) -> &FormVariant {
        &self.variant
    }

    pub fn record(&self) -> &FormRecord {
        &self.record
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == Phase::Submitting
    }

    pub fn is_touched(&self, key: FieldKey) -> bool {
        self.touched.contains(&key)
    }

    /// The errors to display: only the ones of touched fields.
    pub fn visible_errors(&self) -> ErrorMap {
        self.errors
            .iter()
            .filter(|(k, _)| self.touched.contains(k))
            .map(|(k, e)| (*k, *e))
            .collect()
    }

    pub fn error(&self, key: FieldKey) -> Option<&FieldError> {
        if self.touched.contains(&key) {
            self.errors.get(&key)
        } else {
            None
        }
    }

    fn is_editable(&self, op: &str) -> bool {
        if self.phase == Phase::Editing {
            true
        } else {
            warn!("{}: ignored in phase {:?}", op, self.phase);
            false
        }
    }

    /// Applies a value typed or selected by the respondent.
    ///
    /// The national ID keeps its previous value when more than 11 digits are
    /// typed. Enumerations and the birth date become unset when the value
    /// cannot be understood.
    pub fn update_field(&mut self, key: FieldKey, value: &str) {
        if !self.is_editable("update_field") {
            return;
        }
        debug!("update_field: {:?} = {:?}", key, value);
        match key {
            FieldKey::FullName => self.record.full_name = capitalize_words(value),
            FieldKey::Email => self.record.email = value.to_string(),
            FieldKey::BirthPlace => self.record.birth_place = value.to_string(),
            FieldKey::NationalId => {
                let digits = national_id_digits(value);
                if digits.len() > NATIONAL_ID_LEN {
                    debug!("update_field: national id too long: {:?}", value);
                    return;
                }
                self.record.national_id = format_national_id(&digits);
            }
            FieldKey::BirthDate => {
                self.record.birth_date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
            }
            FieldKey::PurposeStatement => self.record.purpose_statement = value.to_string(),
            FieldKey::ApplicationMode => {
                self.record.application_mode = ApplicationMode::parse(value)
            }
            FieldKey::ApplicatorName => self.record.applicator_name = value.to_string(),
            FieldKey::ActivityChoice => self.record.activity_choice = ActivityChoice::parse(value),
            FieldKey::BehaviorFractal => {
                if self.variant.has_behavior_fractal() {
                    self.record.behavior_fractal = Some(value.to_string());
                } else {
                    debug!("update_field: no behavior fractal in form {}", self.record.form_id);
                }
            }
            FieldKey::Answer(slot, AnswerField::Text) => {
                self.record.answer_mut(slot).answer_text = value.to_string()
            }
            FieldKey::Answer(slot, AnswerField::Rank) => {
                // Goes through the exclusivity rule, which refreshes the errors.
                self.set_ranked_answer_rank(slot, Rank::parse(value));
                return;
            }
            FieldKey::Answer(slot, AnswerField::Justification) => {
                self.record.answer_mut(slot).justification = value.to_string()
            }
            FieldKey::FinalFeedback => self.record.final_feedback = value.to_string(),
        }
        self.refresh_if_touched(key);
        // The applicator name depends on the application mode.
        if key == FieldKey::ApplicationMode {
            self.refresh_if_touched(FieldKey::ApplicatorName);
        }
    }

    /// Assigns a rank to one answer. Any other answer holding the same rank
    /// loses it, so that a rank is held by at most one answer.
    pub fn set_ranked_answer_rank(&mut self, slot: AnswerSlot, rank: Option<Rank>) {
        if !self.is_editable("set_ranked_answer_rank") {
            return;
        }
        if let Some(r) = rank {
            for other in AnswerSlot::ALL.iter().filter(|s| **s != slot) {
                if self.record.answer(*other).rank == Some(r) {
                    debug!("set_ranked_answer_rank: {:?} taken from {:?}", r, other);
                    self.record.answer_mut(*other).rank = None;
                    self.refresh_if_touched(FieldKey::Answer(*other, AnswerField::Rank));
                }
            }
        }
        self.record.answer_mut(slot).rank = rank;
        self.refresh_if_touched(FieldKey::Answer(slot, AnswerField::Rank));
    }

    /// The ranks currently held by an answer.
    pub fn ranks_in_use(&self) -> BTreeSet<Rank> {
        self.record
            .ranked_answers
            .iter()
            .filter_map(|a| a.rank)
            .collect()
    }

    /// The ranks to offer in the selector of an answer: the free ones and
    /// its own.
    pub fn available_ranks(&self, slot: AnswerSlot) -> Vec<Rank> {
        let own = self.record.answer(slot).rank;
        let in_use = self.ranks_in_use();
        Rank::ALL
            .iter()
            .copied()
            .filter(|r| !in_use.contains(r) || Some(*r) == own)
            .collect()
    }

    pub fn validate_field(&self, key: FieldKey) -> Option<FieldError> {
        validation::validate_field(&self.record, &self.variant, key)
    }

    pub fn validate_all(&self) -> ErrorMap {
        validation::validate_all(&self.record, &self.variant)
    }

    fn refresh_error(&mut self, key: FieldKey) {
        match self.validate_field(key) {
            Some(e) => {
                self.errors.insert(key, e);
            }
            None => {
                self.errors.remove(&key);
            }
        }
    }

    fn refresh_if_touched(&mut self, key: FieldKey) {
        if self.touched.contains(&key) {
            self.refresh_error(key);
        }
    }

    /// The respondent left a field: from now on its error is displayed and
    /// kept current.
    pub fn blur(&mut self, key: FieldKey) {
        self.touched.insert(key);
        self.refresh_error(key);
    }

    /// Validates and finalizes the record.
    ///
    /// When the result is `Ready`, the record must be delivered and the
    /// outcome given back with `finish_submit`. Until then, every other
    /// submission is refused.
    pub fn begin_submit(&mut self) -> Submission {
        match self.phase {
            Phase::Submitting => {
                debug!("begin_submit: a submission is already in progress");
                return Submission::AlreadySubmitting;
            }
            Phase::Submitted => {
                warn!("begin_submit: form {} already submitted", self.record.response_id);
                return Submission::Closed;
            }
            Phase::Editing => {}
        }

        let errors = self.validate_all();
        self.touched.extend(FieldKey::all(&self.variant));
        self.errors = errors.clone();
        if !errors.is_empty() {
            info!(
                "begin_submit: {} invalid field(s): {:?}",
                errors.len(),
                errors.keys().collect::<Vec<_>>()
            );
            return Submission::Invalid(errors);
        }

        let now = self.clock.now();
        self.record.end_time = format_time(&now);
        // Whole minutes: the collector sheet has always stored minutes in this column.
        self.record.completion_seconds = (now - self.started_at).num_minutes().max(0) as u64;
        self.record.submission_date = format_date(&now);
        self.phase = Phase::Submitting;
        info!(
            "begin_submit: response {} finalized after {} min",
            self.record.response_id, self.record.completion_seconds
        );
        Submission::Ready(PendingSubmission {
            record: self.record.clone(),
        })
    }

    /// Applies the outcome of the transport to a pending submission.
    pub fn finish_submit(
        &mut self,
        pending: PendingSubmission,
        result: Result<(), TransportError>,
    ) -> SubmitOutcome {
        if self.phase != Phase::Submitting
            || pending.record.response_id != self.record.response_id
        {
            warn!(
                "finish_submit: unexpected completion for response {} in phase {:?}",
                pending.record.response_id, self.phase
            );
            return match self.phase {
                Phase::Submitted => SubmitOutcome::Closed,
                _ => SubmitOutcome::AlreadySubmitting,
            };
        }
        match result {
            Ok(()) => {
                info!("finish_submit: response {} delivered", self.record.response_id);
                self.phase = Phase::Submitted;
                SubmitOutcome::Delivered {
                    redirect_url: self.variant.redirect_url.clone(),
                }
            }
            Err(e) => {
                warn!(
                    "finish_submit: response {} not delivered: {}",
                    self.record.response_id, e
                );
                self.phase = Phase::Editing;
                SubmitOutcome::TransportFailed(e)
            }
        }
    }

    /// Validates, finalizes and delivers the record in one go.
    pub fn submit<T: Transport + ?Sized>(&mut self, transport: &T) -> SubmitOutcome {
        match self.begin_submit() {
            Submission::Ready(pending) => {
                let result = transport.deliver(pending.record());
                self.finish_submit(pending, result)
            }
            Submission::Invalid(errors) => SubmitOutcome::Invalid(errors),
            Submission::AlreadySubmitting => SubmitOutcome::AlreadySubmitting,
            Submission::Closed => SubmitOutcome::Closed,
        }
    }
}
