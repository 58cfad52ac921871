//! services/api/src/bin/openapi.rs
//!
//! Exports the Cardio API's OpenAPI document.
//!
//! ```text
//! openapi [PATH]    # default: openapi.json, `-` for stdout
//! ```

use std::io::Write;
use std::path::Path;

use api_lib::web::rest::openapi_document;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let target = std::env::args().nth(1).unwrap_or_else(|| "openapi.json".to_string());
    let json = openapi_document().to_pretty_json()?;

    if target == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        return Ok(());
    }

    let path = Path::new(&target);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    eprintln!("Wrote OpenAPI document to {}", path.display());
    Ok(())
}
