use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use risky_asm::ProgramImage;

/// Whitespace-separated tokens of one source line.
pub type Line = Vec<String>;

pub fn load_source(path: &Path) -> Result<Vec<Line>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(tokenize(&text))
}

/// Every line is kept, blank ones included, so a line's index matches its
/// position in the file. `\r\n`, `\r` and `\n` all end a line.
pub fn tokenize(text: &str) -> Vec<Line> {
    split_lines(text)
        .map(|l| l.split_whitespace().map(str::to_owned).collect())
        .collect()
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let Some(end) = rest.find(['\r', '\n']) else {
            return Some(std::mem::take(&mut rest));
        };
        let line = &rest[..end];
        let skip = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[end + skip..];
        Some(line)
    })
}

pub fn write_image(path: &Path, image: &ProgramImage) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    image
        .write_to(BufWriter::new(file))
        .with_context(|| format!("writing {}", path.display()))
}
