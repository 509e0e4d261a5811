//! Contact details pulled from resume text for reporting alongside scores

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: Option<String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
}

impl ContactDetails {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.emails.is_empty()
            && self.phones.is_empty()
            && self.linkedin.is_none()
            && self.github.is_none()
    }
}

/// Profile link patterns for one site: full URL, bare domain, "Site: handle"
struct ProfilePatterns {
    url: Regex,
    partial: Regex,
    handle: Regex,
    base: &'static str,
}

impl ProfilePatterns {
    fn find(&self, text: &str) -> Option<String> {
        if let Some(m) = self.url.find(text) {
            return Some(m.as_str().to_string());
        }
        if let Some(m) = self.partial.find(text) {
            return Some(format!("https://{}", m.as_str()));
        }
        self.handle
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|handle| format!("{}{}", self.base, handle.as_str()))
    }
}

pub struct ContactExtractor {
    email_regex: Regex,
    phone_regex: Regex,
    name_label_regex: Regex,
    linkedin: ProfilePatterns,
    github: ProfilePatterns,
}

impl Default for ContactExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactExtractor {
    pub fn new() -> Self {
        let email_regex = Regex::new(r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+").expect("Invalid email regex");
        let phone_regex = Regex::new(r"\+?977\d{10}|\b\d{10}\b").expect("Invalid phone regex");
        let name_label_regex = Regex::new(r"(?i)\bname\b").expect("Invalid name regex");

        let linkedin = ProfilePatterns {
            url: Regex::new(r"(?i)https?://(?:www\.)?linkedin\.com/in/[\w-]+").expect("Invalid LinkedIn regex"),
            partial: Regex::new(r"(?i)linkedin\.com/in/[\w-]+").expect("Invalid LinkedIn regex"),
            handle: Regex::new(r"(?i)\blinkedin\W*[:\s]\W*([\w-]{5,})").expect("Invalid LinkedIn regex"),
            base: "https://linkedin.com/in/",
        };

        let github = ProfilePatterns {
            url: Regex::new(r"(?i)https?://(?:www\.)?github\.com/[\w-]+").expect("Invalid GitHub regex"),
            partial: Regex::new(r"(?i)github\.com/[\w-]+").expect("Invalid GitHub regex"),
            handle: Regex::new(r"(?i)\bgit(?:hub)?\W*[:\s]\W*([\w-]{3,})").expect("Invalid GitHub regex"),
            base: "https://github.com/",
        };

        Self {
            email_regex,
            phone_regex,
            name_label_regex,
            linkedin,
            github,
        }
    }

    pub fn extract(&self, text: &str) -> ContactDetails {
        ContactDetails {
            name: self.extract_name(text),
            emails: dedup(self.email_regex.find_iter(text).map(|m| m.as_str().to_string())),
            phones: dedup(
                self.phone_regex
                    .find_iter(text)
                    .filter_map(|m| normalize_phone(m.as_str())),
            ),
            linkedin: self.linkedin.find(text),
            github: self.github.find(text),
        }
    }

    /// A "Name: ..." line wins; otherwise the first non-empty line
    fn extract_name(&self, text: &str) -> Option<String> {
        let labelled = text
            .lines()
            .find(|line| self.name_label_regex.is_match(line))
            .and_then(|line| line.rsplit(':').next())
            .map(str::trim)
            .filter(|name| !name.is_empty());

        labelled
            .or_else(|| text.lines().map(str::trim).find(|line| !line.is_empty()))
            .map(str::to_string)
    }
}

/// Local 10-digit numbers as-is, Nepali numbers as +977XXXXXXXXXX
fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 13 && digits.starts_with("977") {
        Some(format!("+977{}", &digits[3..]))
    } else if digits.len() == 10 {
        Some(digits)
    } else {
        None
    }
}

fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
