//! Recognition of the malformed chunked response some firmware sends after a
//! successful `POST /settings/sync`.
//!
//! The device applies the settings and then answers with a chunked body whose
//! size line the HTTP client cannot parse. The resulting transport error is the
//! only acknowledgement we get, so callers that opt in treat it as success.
//! Keep this check here and out of generic error handling so it can be dropped
//! once the firmware is fixed.

use std::error::Error;

/// Lowercase fragments identifying a chunk size parse failure.
const CHUNKED_FRAMING_MARKERS: &[&str] = &["chunk size"];

/// True when `error` (or anything in its source chain) is a chunk size parse
/// failure.
pub fn is_chunked_framing_defect(error: &(dyn Error + 'static)) -> bool {
    error_chain(error).any(|message| {
        let message = message.to_lowercase();
        CHUNKED_FRAMING_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
    })
}

/// Renders the error and all its sources, outermost first.
pub fn describe(error: &(dyn Error + 'static)) -> String {
    error_chain(error).collect::<Vec<_>>().join(": ")
}

fn error_chain<'a>(error: &'a (dyn Error + 'static)) -> impl Iterator<Item = String> + 'a {
    std::iter::successors(Some(error), |&e| e.source()).map(|e| e.to_string())
}
