pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Load a command's JSON payload from `--input <file>` or piped stdin.
pub fn load<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(p) = path {
        return file::read_json(p);
    }
    match stdin::read_stdin()? {
        Some(payload) => Ok(payload),
        None => Err(format!("--input <file.json> or stdin required for {what}").into()),
    }
}
