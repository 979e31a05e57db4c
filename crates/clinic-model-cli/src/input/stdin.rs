use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Deserialize a piped document. JSON is tried first, then YAML.
/// `None` when stdin is a terminal or the pipe is empty.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let document = buffer.trim();
    if document.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str(document) {
        Ok(value) => Ok(Some(value)),
        Err(json_err) => serde_yaml::from_str(document).map(Some).map_err(|yaml_err| {
            format!("stdin is neither valid JSON ({json_err}) nor valid YAML ({yaml_err})").into()
        }),
    }
}
