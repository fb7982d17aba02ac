//! Form processing

use crate::Error;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Parse URL-encoded form data
pub fn parse_form<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_urlencoded::from_bytes(body)
        .map_err(|e| Error::BadRequest(format!("Failed to parse form data: {}", e)))
}

/// Parse URL-encoded form data into a HashMap
///
/// When a key repeats, the first value wins.
pub fn parse_form_map(body: &[u8]) -> Result<HashMap<String, String>, Error> {
    let form_data: Vec<(String, String)> = parse_form(body)?;

    let mut map = HashMap::with_capacity(form_data.len());
    for (key, value) in form_data {
        map.entry(key).or_insert(value);
    }
    Ok(map)
}
