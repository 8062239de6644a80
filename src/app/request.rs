//! The demo payload.

use serde::Serialize;

use crate::config::NAME_PLACEHOLDER;

/// An outbound request travelling through the demo pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    /// URL the request is sent to.
    pub destination: String,
    /// Body template, still containing the name placeholder.
    pub data_template: String,
    /// Body with the placeholder filled in; empty until templated.
    pub templated_data: String,
}

impl Request {
    pub fn new(destination: impl Into<String>, data_template: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            data_template: data_template.into(),
            templated_data: String::new(),
        }
    }

    pub fn is_templated(&self) -> bool {
        !self.templated_data.is_empty()
    }
}

/// Replace every name placeholder in `template`.
pub fn fill_template(template: &str, name: &str) -> String {
    template.replace(NAME_PLACEHOLDER, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_is_not_templated() {
        let req = Request::new("http://localhost/", "Hi, {name}");
        assert!(!req.is_templated());
        assert_eq!(req.data_template, "Hi, {name}");
    }

    #[test]
    fn fill_template_replaces_every_placeholder() {
        assert_eq!(fill_template("{name} and {name}", "Bob"), "Bob and Bob");
        assert_eq!(fill_template("no placeholder", "Bob"), "no placeholder");
    }
}
