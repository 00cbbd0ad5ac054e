//! Character reference decoding for attribute values.

use std::borrow::Cow;

/// Decodes named and numeric character references in `input`.
///
/// Unknown references and bare ampersands are kept verbatim. Returns
/// `Borrowed` when there is nothing to decode.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    html_escape::decode_html_entities(input)
}
