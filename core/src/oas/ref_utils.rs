#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Helpers for turning raw `$ref` strings into local component pointers.
//!
//! Nothing here fetches external documents. An absolute or relative reference is
//! only treated as local when its document part matches the current document's
//! `$self` URI.

use percent_encoding::percent_decode_str;
use std::path::Path;
use url::Url;

/// Prefix shared by every named schema pointer.
pub const SCHEMA_POINTER_PREFIX: &str = "#/components/schemas/";

/// Splits a reference into its document part and its fragment (without `#`).
fn split_reference(ref_str: &str) -> (&str, Option<&str>) {
    match ref_str.split_once('#') {
        Some((doc, frag)) => (doc, Some(frag)),
        None => (ref_str, None),
    }
}

/// Normalizes a `$ref` to a local JSON Pointer (e.g. `#/components/...`) if it targets the
/// current document as identified by `$self`.
///
/// Returns `None` if the reference is external or lacks a fragment.
pub(crate) fn normalize_ref_to_local(ref_str: &str, self_uri: Option<&str>) -> Option<String> {
    let (document, fragment) = split_reference(ref_str);
    if document.is_empty() {
        return fragment.map(|frag| format!("#{}", frag));
    }

    let frag = fragment?;
    let self_uri = self_uri?;
    if ref_doc_matches_self(document, self_uri) {
        return Some(format!("#{}", frag));
    }
    None
}

/// Extracts a component name from a local pointer of the form `#/components/{section}/{name}`.
///
/// Deeper pointers (e.g. `#/components/schemas/Pet/properties/id`) are not component
/// references and yield `None`.
pub(crate) fn extract_component_name(local_ref: &str, section: &str) -> Option<String> {
    let pointer = local_ref.strip_prefix("#/")?;
    let segments: Vec<&str> = pointer.split('/').collect();

    if segments.len() != 3 {
        return None;
    }
    if segments[0] != "components" || segments[1] != section {
        return None;
    }

    let name = decode_pointer_segment(segments[2]);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Decodes a JSON Pointer segment (handles `~1` and `~0`).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}

fn ref_doc_matches_self(ref_doc: &str, self_uri: &str) -> bool {
    if ref_doc == self_uri {
        return true;
    }

    if let (Ok(ref_url), Ok(self_url)) = (Url::parse(ref_doc), Url::parse(self_uri)) {
        return ref_url.scheme() == self_url.scheme()
            && ref_url.host() == self_url.host()
            && ref_url.port() == self_url.port()
            && ref_url.path() == self_url.path();
    }

    // `$self` given as an absolute path (e.g. "/api/openapi.yaml").
    if self_uri.starts_with('/') {
        if let Ok(ref_url) = Url::parse(ref_doc) {
            return ref_url.path() == self_uri;
        }
    }

    if !self_uri.contains("://") && !ref_doc.contains("://") {
        return Path::new(ref_doc) == Path::new(self_uri);
    }

    false
}
