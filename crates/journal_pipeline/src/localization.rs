//! Localized messages
//!
//! Messages live in Fluent resources embedded per locale. A [`Localizer`]
//! only holds the negotiated language; the bundle is built inside each
//! formatting call and never held across an `.await`.

use std::collections::HashMap;

use core_kernel::HandlingMonth;
use domain_journal::{ImportErrorDetail, JournalError, ProgressStep};
use fluent::{FluentArgs, FluentBundle, FluentResource};
use fluent_langneg::{convert_vec_str_to_langids_lossy, negotiate_languages, NegotiationStrategy};
use tracing::warn;
use unic_langid::LanguageIdentifier;

const JA_MESSAGES: &str = include_str!("../locales/ja/journal.ftl");
const EN_MESSAGES: &str = include_str!("../locales/en/journal.ftl");

/// Locales with embedded resources
pub const AVAILABLE_LANGUAGES: [&str; 2] = ["ja", "en"];

/// Display labels of field ids, used in field-scoped import errors
pub type FieldLabels = HashMap<String, String>;

/// Formats user-facing messages in one negotiated language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Localizer {
    language: LanguageIdentifier,
}

impl Localizer {
    /// Picks the best available locale for `requested`, else `default`
    pub fn negotiate(requested: &str, default: &str) -> Self {
        let available: Vec<LanguageIdentifier> = AVAILABLE_LANGUAGES
            .iter()
            .filter_map(|code| code.parse().ok())
            .collect();
        let fallback: LanguageIdentifier = default
            .parse()
            .ok()
            .filter(|lang| available.contains(lang))
            .or_else(|| available.first().cloned())
            .unwrap_or_default();
        let requested = if requested.trim().is_empty() {
            default
        } else {
            requested
        };
        let requested = convert_vec_str_to_langids_lossy([requested]);

        let negotiated = negotiate_languages(
            &requested,
            &available,
            Some(&fallback),
            NegotiationStrategy::Filtering,
        )
        .first()
        .map(|lang| (*lang).clone());

        Self {
            language: negotiated.unwrap_or(fallback),
        }
    }

    pub fn language(&self) -> &LanguageIdentifier {
        &self.language
    }

    /// Turns the sink's structured errors into readable messages
    ///
    /// Field-scoped errors name the field by its label when one is known.
    /// Errors without a line fall back to the affected range.
    pub fn import_errors(&self, details: &[ImportErrorDetail], labels: &FieldLabels) -> Vec<String> {
        let messages = self.messages();
        if details.is_empty() {
            return vec![messages.format("import-error-unknown", None)];
        }

        details
            .iter()
            .map(|detail| {
                let mut args = FluentArgs::new();
                args.set("message", detail.message.clone());
                match (&detail.field_id, detail.current_line) {
                    (Some(field_id), line) if line > 0 => {
                        let label = labels.get(field_id).unwrap_or(field_id);
                        args.set("line", line.to_string());
                        args.set("field", label.clone());
                        messages.format("import-error-field", Some(&args))
                    }
                    (_, line) if line > 0 => {
                        args.set("line", line.to_string());
                        messages.format("import-error-line", Some(&args))
                    }
                    _ => {
                        args.set("first", detail.first_line.to_string());
                        args.set("last", detail.last_line.to_string());
                        messages.format("import-error-range", Some(&args))
                    }
                }
            })
            .collect()
    }

    pub fn payment_remark(&self, month: &HandlingMonth) -> String {
        self.with_month("remark-payment", month)
    }

    pub fn depreciation_remark(&self, month: &HandlingMonth) -> String {
        self.with_month("remark-depreciation", month)
    }

    pub fn progress(&self, step: ProgressStep) -> String {
        self.messages()
            .format(&format!("progress-{}", step.as_str()), None)
    }

    pub fn run_completed(&self, inserted: u64) -> String {
        let mut args = FluentArgs::new();
        args.set("inserted", inserted.to_string());
        self.messages().format("run-completed", Some(&args))
    }

    pub fn run_failed(&self, error: &JournalError) -> String {
        let mut args = FluentArgs::new();
        args.set("error", error.to_string());
        self.messages().format("run-failed", Some(&args))
    }

    fn with_month(&self, id: &str, month: &HandlingMonth) -> String {
        let mut args = FluentArgs::new();
        args.set("month", month.to_string());
        self.messages().format(id, Some(&args))
    }

    fn messages(&self) -> Messages {
        let source = match self.language.language.as_str() {
            "en" => EN_MESSAGES,
            _ => JA_MESSAGES,
        };
        Messages::load(self.language.clone(), source)
    }
}

struct Messages {
    bundle: FluentBundle<FluentResource>,
}

impl Messages {
    fn load(language: LanguageIdentifier, source: &str) -> Self {
        let resource = FluentResource::try_new(source.to_string()).unwrap_or_else(|(partial, errors)| {
            warn!(language = %language, errors = errors.len(), "Message resource has syntax errors");
            partial
        });

        let mut bundle = FluentBundle::new(vec![language]);
        bundle.set_use_isolating(false);
        if let Err(errors) = bundle.add_resource(resource) {
            warn!(errors = errors.len(), "Duplicate message ids in resource");
        }
        Self { bundle }
    }

    /// Formats a message; an unknown id formats as the id itself
    fn format(&self, id: &str, args: Option<&FluentArgs<'_>>) -> String {
        let Some(pattern) = self.bundle.get_message(id).and_then(|message| message.value()) else {
            warn!(message_id = id, "Missing localized message");
            return id.to_string();
        };

        let mut errors = Vec::new();
        let text = self.bundle.format_pattern(pattern, args, &mut errors);
        if !errors.is_empty() {
            warn!(message_id = id, errors = errors.len(), "Message formatted with errors");
        }
        text.into_owned()
    }
}
