use scraper::{ElementRef, Html, Selector};

use crate::error::{AuthError, AuthResult};

/// Returns the raw value of the `SAMLResponse` input on the SSO page.
pub fn extract_saml_response(document: &str) -> AuthResult<String> {
    let doc = Html::parse_document(document);
    let selector = Selector::parse("input[name=\"SAMLResponse\"]")
        .map_err(|e| AuthError::Protocol(format!("invalid selector: {}", e)))?;

    let elements: Vec<ElementRef> = doc.select(&selector).collect();

    if elements.len() == 0 {
        trace!("extract_saml_response.no_input");
        debug!("{}", document);
        return Err(AuthError::Protocol(
            "Could not find saml response in the SSO page".into(),
        ));
    }

    match elements[0].value().attr("value") {
        Some(v) if !v.trim().is_empty() => Ok(v.into()),
        _ => Err(AuthError::Protocol("SAML response in the SSO page is empty".into())),
    }
}
