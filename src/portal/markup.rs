//! Markup queries against portal pages
//!
//! The token extraction rule is configuration data rather than a hard-coded
//! selector: the portal's page structure is outside this tool's control and
//! may change without notice.

use crate::error::{Error, Result};
use crate::portal::CardToken;
use scraper::{Html, Selector};

/// Replaceable rule describing where the card token lives in the account page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRule {
    /// CSS selector matching the element that carries the token
    pub selector: String,
    /// Attribute holding the token; the element's text content when `None`
    pub attribute: Option<String>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Config(format!("Invalid selector '{css}': {e}")))
}

/// Pull the hidden CSRF input value out of the login form markup.
pub fn extract_csrf(html: &str, field: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let input = selector(&format!(r#"input[name="{field}"]"#))?;

    let value = document
        .select(&input)
        .next()
        .and_then(|element| element.value().attr("value"))
        .ok_or_else(|| Error::Parse(format!("login form has no '{field}' input")))?;

    if value.is_empty() {
        return Err(Error::Parse(format!("login form '{field}' input is empty")));
    }

    Ok(value.to_string())
}

/// Apply a token rule to the account page markup.
pub fn extract_token(html: &str, rule: &TokenRule) -> Result<CardToken> {
    let document = Html::parse_document(html);

    let element = document
        .select(&selector(&rule.selector)?)
        .next()
        .ok_or_else(|| {
            Error::Parse(format!(
                "no element matches '{}'; the portal layout may have changed",
                rule.selector
            ))
        })?;

    let raw = match &rule.attribute {
        Some(attribute) => element
            .value()
            .attr(attribute)
            .ok_or_else(|| {
                Error::Parse(format!(
                    "element matching '{}' has no '{attribute}' attribute",
                    rule.selector
                ))
            })?
            .to_string(),
        None => element.text().collect::<String>(),
    };

    CardToken::parse(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_FORM: &str = r#"<html><body><form action="/Home/Logon" method="post">
        <input name="__RequestVerificationToken" type="hidden" value="tok-1" />
        <input name="UserName" /><input name="Password" type="password" />
    </form></body></html>"#;

    #[test]
    fn extracts_csrf_value() {
        let value = extract_csrf(LOGIN_FORM, "__RequestVerificationToken").unwrap();
        assert_eq!(value, "tok-1");
    }

    #[test]
    fn missing_csrf_input_is_a_parse_error() {
        let err = extract_csrf("<html><body></body></html>", "__RequestVerificationToken")
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "unexpected error: {err:?}");
    }

    #[test]
    fn empty_csrf_value_is_a_parse_error() {
        let html = r#"<input name="__RequestVerificationToken" value="" />"#;
        let err = extract_csrf(html, "__RequestVerificationToken").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn extracts_token_from_attribute() {
        let rule = TokenRule {
            selector: "[data-card-token]".to_string(),
            attribute: Some("data-card-token".to_string()),
        };
        let html = r#"<div id="balance"><span data-card-token="CARD-7">**** 7</span></div>"#;
        let token = extract_token(html, &rule).unwrap();
        assert_eq!(token.as_str(), "CARD-7");
    }

    #[test]
    fn extracts_token_from_element_text() {
        let rule = TokenRule {
            selector: "span.card-number".to_string(),
            attribute: None,
        };
        let html = r#"<span class="card-number"> 1234567890 </span>"#;
        let token = extract_token(html, &rule).unwrap();
        assert_eq!(token.as_str(), "1234567890");
    }

    #[test]
    fn missing_token_element_is_a_parse_error() {
        let rule = TokenRule {
            selector: "[data-card-token]".to_string(),
            attribute: Some("data-card-token".to_string()),
        };
        let err = extract_token("<html><body><p>maintenance</p></body></html>", &rule)
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "unexpected error: {err:?}");
    }

    #[test]
    fn missing_token_attribute_is_a_parse_error() {
        let rule = TokenRule {
            selector: "span".to_string(),
            attribute: Some("data-card-token".to_string()),
        };
        let err = extract_token("<span>CARD-7</span>", &rule).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn invalid_selector_is_a_config_error() {
        let rule = TokenRule {
            selector: "[[".to_string(),
            attribute: None,
        };
        let err = extract_token("<p></p>", &rule).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
