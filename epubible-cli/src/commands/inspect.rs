//! Inspect command implementation

use anyhow::{bail, Context, Result};
use epubible_core::package::{inspect as list_members, EPUB_MIMETYPE, MIMETYPE_MEMBER};
use serde::Serialize;
use std::path::Path;

/// Archive member output
#[derive(Serialize)]
struct Member {
    name: String,
    compressed: bool,
}

/// List an EPUB's members and check that `mimetype` comes first, stored
pub fn inspect(input: &Path, json: bool) -> Result<()> {
    let members =
        list_members(input).with_context(|| format!("Failed to read {}", input.display()))?;

    let output: Vec<Member> = members
        .iter()
        .map(|m| Member {
            name: m.name.clone(),
            compressed: !m.stored,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for member in &output {
            let method = if member.compressed { "deflated" } else { "stored" };
            println!("{:<9} {}", method, member.name);
        }
    }

    match members.first() {
        Some(first) if first.name == MIMETYPE_MEMBER && first.stored => Ok(()),
        _ => bail!(
            "{} is not a valid EPUB container: the first member must be an uncompressed {} declaring {}",
            input.display(),
            MIMETYPE_MEMBER,
            EPUB_MIMETYPE
        ),
    }
}
