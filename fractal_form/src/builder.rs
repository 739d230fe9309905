pub use crate::config::*;

use crate::transport::Clock;
use crate::FormController;

/// A builder for replaying the answers of a respondent.
///
/// Each value goes through the same path as a value typed in the form: it is
/// formatted, then the field is left, so that its error is computed.
///
/// ```
/// use fractal_form::builder::Builder;
/// use fractal_form::*;
///
/// let form = Builder::new(FormVariant::standard())
///     .full_name("maria silva")
///     .national_id("529.982.247-25")
///     .answer(AnswerSlot::First, "Viajar", Some(Rank::High), "Sempre quis")
///     .build();
///
/// assert_eq!(form.record().full_name, "Maria Silva");
/// assert!(form.error(FieldKey::Email).is_none());
/// assert!(!form.validate_all().is_empty());
/// ```
pub struct Builder {
    pub(crate) _variant: FormVariant,
    pub(crate) _fields: Vec<(FieldKey, String)>,
}

impl Builder {
    pub fn new(variant: FormVariant) -> Builder {
        Builder {
            _variant: variant,
            _fields: Vec::new(),
        }
    }

    /// Adds a value for a field. Later values override earlier ones.
    pub fn field(mut self, key: FieldKey, value: &str) -> Builder {
        self._fields.push((key, value.to_string()));
        self
    }

    pub fn full_name(self, value: &str) -> Builder {
        self.field(FieldKey::FullName, value)
    }

    pub fn email(self, value: &str) -> Builder {
        self.field(FieldKey::Email, value)
    }

    pub fn birth_place(self, value: &str) -> Builder {
        self.field(FieldKey::BirthPlace, value)
    }

    pub fn national_id(self, value: &str) -> Builder {
        self.field(FieldKey::NationalId, value)
    }

    /// `YYYY-MM-DD`
    pub fn birth_date(self, value: &str) -> Builder {
        self.field(FieldKey::BirthDate, value)
    }

    pub fn purpose_statement(self, value: &str) -> Builder {
        self.field(FieldKey::PurposeStatement, value)
    }

    pub fn application_mode(self, mode: ApplicationMode) -> Builder {
        let value = match mode {
            ApplicationMode::SelfApplied => "self-applied",
            ApplicationMode::Assisted => "assisted",
        };
        self.field(FieldKey::ApplicationMode, value)
    }

    pub fn applicator_name(self, value: &str) -> Builder {
        self.field(FieldKey::ApplicatorName, value)
    }

    pub fn activity_choice(self, choice: ActivityChoice) -> Builder {
        let value = match choice {
            ActivityChoice::Respondent => "self",
            ActivityChoice::Applicator => "applicator",
        };
        self.field(FieldKey::ActivityChoice, value)
    }

    pub fn behavior_fractal(self, value: &str) -> Builder {
        self.field(FieldKey::BehaviorFractal, value)
    }

    /// Fills a full row of the ranked answers table.
    pub fn answer(
        self,
        slot: AnswerSlot,
        text: &str,
        rank: Option<Rank>,
        justification: &str,
    ) -> Builder {
        self.field(FieldKey::Answer(slot, AnswerField::Text), text)
            .field(
                FieldKey::Answer(slot, AnswerField::Rank),
                rank.map(|r| r.wire_name()).unwrap_or(""),
            )
            .field(FieldKey::Answer(slot, AnswerField::Justification), justification)
    }

    pub fn final_feedback(self, value: &str) -> Builder {
        self.field(FieldKey::FinalFeedback, value)
    }

    /// Starts a session on the local clock and replays the answers.
    pub fn build(self) -> FormController {
        let mut form = FormController::initialize(self._variant.clone());
        self.replay(&mut form);
        form
    }

    pub fn build_with_clock<C: Clock>(self, clock: C) -> FormController<C> {
        let mut form = FormController::with_clock(self._variant.clone(), clock);
        self.replay(&mut form);
        form
    }

    fn replay<C: Clock>(&self, form: &mut FormController<C>) {
        for (key, value) in self._fields.iter() {
            form.update_field(*key, value);
            form.blur(*key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::ManualClock;
    use crate::SubmitOutcome;

    fn complete(variant: FormVariant) -> Builder {
        Builder::new(variant)
            .full_name("MARIA SILVA")
            .email("maria@example.com")
            .birth_place("Fortaleza")
            .national_id("52998224725")
            .birth_date("1990-05-17")
            .purpose_statement("Autoconhecimento")
            .application_mode(ApplicationMode::SelfApplied)
            .activity_choice(ActivityChoice::Respondent)
            .answer(AnswerSlot::First, "Comprar uma casa", Some(Rank::High), "Segurança")
            .answer(AnswerSlot::Second, "Viajar", Some(Rank::Medium), "Conhecer o mundo")
            .answer(AnswerSlot::Third, "Doar", Some(Rank::Low), "Ajudar")
            .final_feedback("Foi interessante")
    }

    #[test]
    fn complete_form_is_valid() {
        let form = complete(FormVariant::standard()).build();
        assert!(form.validate_all().is_empty());
        assert!(form.visible_errors().is_empty());
        assert_eq!(form.record().full_name, "Maria Silva");
        assert_eq!(form.record().national_id, "529.982.247-25");
    }

    #[test]
    fn missing_behavior_fractal() {
        let form = complete(FormVariant::behavior_fractal()).build();
        let errors = form.validate_all();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get(&FieldKey::BehaviorFractal),
            Some(&FieldError::Required(FieldKey::BehaviorFractal))
        );
        // Never typed, so never touched.
        assert_eq!(form.error(FieldKey::BehaviorFractal), None);
    }

    #[test]
    fn replayed_ranks_stay_unique() {
        let form = complete(FormVariant::standard())
            .answer(AnswerSlot::Third, "Doar", Some(Rank::High), "Ajudar")
            .build();
        let record = form.record();
        assert_eq!(record.answer(AnswerSlot::First).rank, None);
        assert_eq!(record.answer(AnswerSlot::Third).rank, Some(Rank::High));
        assert_eq!(
            form.error(FieldKey::Answer(AnswerSlot::First, AnswerField::Rank)),
            Some(&FieldError::Required(FieldKey::Answer(
                AnswerSlot::First,
                AnswerField::Rank
            )))
        );
    }

    #[test]
    fn submit_built_form() {
        let clock = ManualClock::new();
        let mut form = complete(FormVariant::behavior_fractal())
            .behavior_fractal("Generosidade")
            .build_with_clock(&clock);
        clock.advance(95);
        let sent = std::cell::RefCell::new(None);
        let outcome = form.submit(&|r: &FormRecord| {
            *sent.borrow_mut() = Some(r.clone());
            Ok::<(), TransportError>(())
        });
        assert!(matches!(outcome, SubmitOutcome::Delivered { .. }));
        let record = sent.borrow().clone().unwrap();
        assert_eq!(record.form_id, "pergunta2");
        assert_eq!(record.completion_seconds, 1);
        assert_eq!(record.behavior_fractal.as_deref(), Some("Generosidade"));
    }
}
