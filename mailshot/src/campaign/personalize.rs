use serde::{Deserialize, Serialize};

/// A recipient. Owned by the caller; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl Contact {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            first_name: None,
            last_name: None,
        }
    }

    pub fn named(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
        }
    }
}

pub const DEFAULT_GREETING: &str = "Valued Customer";

/// Fills `{{firstName}}`, `{{lastName}}`, `{{email}}` and `{{companyName}}`
/// in a template.
///
/// Missing or empty first names become [`DEFAULT_GREETING`], missing last
/// names become the empty string. Any other `{{...}}` is left as written.
/// Substitution is a single pass, so contact data containing braces is
/// never expanded.
#[derive(Debug, Clone)]
pub struct Personalizer {
    company_name: String,
}

impl Personalizer {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
        }
    }

    pub fn render(&self, template: &str, contact: &Contact) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let after = &rest[open + 2..];

            let value = after
                .find("}}")
                .and_then(|close| self.lookup(&after[..close], contact).map(|v| (v, close)));

            match value {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &after[close + 2..];
                }
                None => {
                    // Not one of ours. Keep one brace and rescan from the
                    // next, so `{{{firstName}}}` still finds its placeholder.
                    out.push('{');
                    rest = &rest[open + 1..];
                }
            }
        }

        out.push_str(rest);
        out
    }

    fn lookup<'a>(&'a self, name: &str, contact: &'a Contact) -> Option<&'a str> {
        match name {
            "firstName" => Some(
                contact
                    .first_name
                    .as_deref()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_GREETING),
            ),
            "lastName" => Some(contact.last_name.as_deref().unwrap_or("")),
            "email" => Some(contact.email.as_str()),
            "companyName" => Some(self.company_name.as_str()),
            _ => None,
        }
    }
}

impl Default for Personalizer {
    fn default() -> Self {
        Self::new("WebSparks AI")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_only_contact_uses_fallbacks() {
        let p = Personalizer::default();
        let out = p.render(
            "Hi {{firstName}} [{{lastName}}] <{{email}}>",
            &Contact::new("ada@example.com"),
        );
        assert_eq!(out, "Hi Valued Customer [] <ada@example.com>");
    }

    #[test]
    fn replaces_every_occurrence() {
        let p = Personalizer::new("Acme");
        let contact = Contact::named("ada@example.com", "Ada", "Lovelace");
        let out = p.render(
            "{{firstName}} {{lastName}}, {{firstName}} from {{companyName}}",
            &contact,
        );
        assert_eq!(out, "Ada Lovelace, Ada from Acme");
    }

    #[test]
    fn empty_first_name_falls_back() {
        let p = Personalizer::default();
        let contact = Contact::named("a@b.test", "", "");
        assert_eq!(p.render("Dear {{firstName}}", &contact), "Dear Valued Customer");
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let p = Personalizer::default();
        let contact = Contact::named("a@b.test", "Ada", "L");
        assert_eq!(
            p.render("{{unsubscribe}} {{ {{firstName}} {{oops", &contact),
            "{{unsubscribe}} {{ Ada {{oops"
        );
    }

    #[test]
    fn placeholder_inside_extra_braces_is_replaced() {
        let p = Personalizer::default();
        let contact = Contact::named("a@b.test", "Ada", "L");
        assert_eq!(p.render("Hi {{{firstName}}}", &contact), "Hi {Ada}");
        assert_eq!(p.render("{{{{email}}}}", &contact), "{{a@b.test}}");
    }

    #[test]
    fn inserted_values_are_not_rescanned() {
        let p = Personalizer::default();
        let contact = Contact::named("a@b.test", "{{email}}", "");
        assert_eq!(p.render("Hi {{firstName}}", &contact), "Hi {{email}}");
    }
}
