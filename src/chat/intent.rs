//! Consultation-intent detection and contact-field extraction.
//!
//! One component owns both jobs so the phrase tables cannot drift between
//! call sites. Classification is a pure function of the message and the
//! configured tables.

use std::collections::BTreeMap;

use regex::Regex;

/// What a chat turn is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// The user wants a consultation; `explicit` distinguishes a direct
    /// scheduling request from a passing mention.
    ScheduleConsultation { explicit: bool },
    None,
}

/// Fields pulled out of a scheduling-flavored message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub message: Option<String>,
}

impl ContactFields {
    pub fn as_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("name".to_string(), self.name.clone());
        map.insert("email".to_string(), self.email.clone());
        for (key, value) in [
            ("phone", &self.phone),
            ("company", &self.company),
            ("date", &self.date),
            ("time", &self.time),
            ("message", &self.message),
        ] {
            if let Some(value) = value {
                map.insert(key.to_string(), value.clone());
            }
        }
        map
    }
}

const EXPLICIT_PHRASES: [&str; 14] = [
    "schedule a consultation",
    "book a consultation",
    "schedule consultation",
    "book consultation",
    "book a demo",
    "want to schedule",
    "want to book",
    "need consultation",
    "get consultation",
    "have consultation",
    "set up consultation",
    "arrange consultation",
    "plan consultation",
    "organize consultation",
];

const WEAK_KEYWORDS: [&str; 8] = [
    "consultation",
    "meeting",
    "appointment",
    "call",
    "demo",
    "discuss",
    "talk",
    "consult",
];

struct FieldPatterns {
    name: Regex,
    email: Regex,
    phone: Regex,
    company: Regex,
    date: Regex,
    time: Regex,
    message: Regex,
}

pub struct IntentClassifier {
    explicit_phrases: Vec<&'static str>,
    weak_keywords: Vec<&'static str>,
    patterns: FieldPatterns,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        // The patterns are fixed at compile time, so compilation cannot fail
        // at runtime; expect() here documents that assumption.
        let patterns = FieldPatterns {
            name: Regex::new(
                r"(?i)(?:my name is|call me|i am|name)\s*:?\s*([A-Za-z][A-Za-z\s]*?)(?:\s*,|\s+and\s+|\s*\.|\s*$)",
            )
            .expect("name pattern"),
            email: Regex::new(r"([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})")
                .expect("email pattern"),
            phone: Regex::new(r"(?i)(?:phone|contact|call|number)\s*:?\s*(\+?[0-9][0-9\s().-]*[0-9])")
                .expect("phone pattern"),
            company: Regex::new(
                r"(?i)(?:company|firm|business|organization|work at|work for)\s*:?\s*([A-Za-z0-9][A-Za-z0-9\s&.]*?)(?:\s*,|\s+and\s+|\s*\.|\s*$)",
            )
            .expect("company pattern"),
            date: Regex::new(
                r"(?i)(?:date|schedule|appointment|meeting)\s*:?\s*([A-Za-z0-9][A-Za-z0-9\s]*?)(?:\s*,|\s+and\s+|\s*\.|\s*$)",
            )
            .expect("date pattern"),
            time: Regex::new(r"(?i)(?:time|at|around)\s*:?\s*([0-9]{1,2}(?::[0-9]{2})?\s*(?:am|pm))")
                .expect("time pattern"),
            message: Regex::new(r"(?i)(?:message|details|regarding|project)\s*:\s*(.+)")
                .expect("message pattern"),
        };

        Self {
            explicit_phrases: EXPLICIT_PHRASES.to_vec(),
            weak_keywords: WEAK_KEYWORDS.to_vec(),
            patterns,
        }
    }

    /// Case-insensitive phrase/keyword match. Explicit phrases win over the
    /// weak keyword set.
    pub fn classify(&self, message: &str) -> Intent {
        let lowered = message.to_lowercase();

        if self
            .explicit_phrases
            .iter()
            .any(|phrase| lowered.contains(phrase))
        {
            return Intent::ScheduleConsultation { explicit: true };
        }

        if self
            .weak_keywords
            .iter()
            .any(|keyword| lowered.contains(keyword))
        {
            return Intent::ScheduleConsultation { explicit: false };
        }

        Intent::None
    }

    /// Regex captures for contact details.
    ///
    /// The scheduling-indicator check is a precondition: a message carrying a
    /// name and email but no consultation keyword is not a scheduling
    /// request, so nothing is extracted from it. Returns `Some` only when
    /// both name and email matched.
    pub fn extract_contact_fields(&self, message: &str) -> Option<ContactFields> {
        if self.classify(message) == Intent::None {
            return None;
        }

        let name = capture(&self.patterns.name, message)?;
        let email = capture(&self.patterns.email, message)?;

        Some(ContactFields {
            name: collapse_spaces(&name),
            email,
            phone: capture(&self.patterns.phone, message),
            company: capture(&self.patterns.company, message),
            date: capture(&self.patterns.date, message),
            time: capture(&self.patterns.time, message),
            message: capture(&self.patterns.message, message),
        })
    }
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::new()
    }

    #[test]
    fn explicit_request_is_detected() {
        let intent = classifier()
            .classify("My name is Jane, email jane@x.com, let's schedule a consultation");
        assert_eq!(intent, Intent::ScheduleConsultation { explicit: true });
    }

    #[test]
    fn weak_mention_is_not_explicit() {
        let intent = classifier().classify("let's have a call sometime");
        assert_eq!(intent, Intent::ScheduleConsultation { explicit: false });
    }

    #[test]
    fn plain_greeting_has_no_intent() {
        assert_eq!(classifier().classify("hello"), Intent::None);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let intent = classifier().classify("I WANT TO BOOK a demo next week");
        assert_eq!(intent, Intent::ScheduleConsultation { explicit: true });
    }

    #[test]
    fn extraction_needs_scheduling_indicator() {
        // Name and email present, but no consultation keyword: not a request.
        let fields = classifier()
            .extract_contact_fields("My name is Jane and my email is jane@x.com");
        assert!(fields.is_none());
    }

    #[test]
    fn extraction_needs_both_name_and_email() {
        let fields = classifier()
            .extract_contact_fields("I want to schedule a consultation, my name is Jane");
        assert!(fields.is_none());
    }

    #[test]
    fn extraction_captures_contact_details() {
        let fields = classifier()
            .extract_contact_fields(
                "I want to book a consultation, my name is Sam, email sam@acme.com, company Acme, at 10 AM",
            )
            .expect("fields");
        assert_eq!(fields.name, "Sam");
        assert_eq!(fields.email, "sam@acme.com");
        assert_eq!(fields.company.as_deref(), Some("Acme"));
        assert_eq!(fields.time.as_deref(), Some("10 AM"));
    }
}
