/// Strip the query string and fragment from a fetch locator.
///
/// Blob locators are pre-signed URLs whose query carries the access token.
pub fn redact_locator(locator: &str) -> &str {
    let end = locator.find(['?', '#']).unwrap_or(locator.len());
    &locator[..end]
}
