use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rass::{build_listing, load_source, write_image, write_listing};
use risky_asm::{Encoder, EncoderConfig, FieldPolicy};

const USAGE: &str = "Usage: rass <assembly_input_file.rass> <bitcode_output_file.bin>";

#[derive(Parser, Debug)]
#[command(author, version, about = "Assemble RISKY mnemonics into a 64 KiB bitcode image")]
struct Opts {
    /// Assembly source, one instruction per line
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    /// Bitcode image to write
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
    /// Reject arguments that do not fit their field instead of wrapping them
    #[arg(long)]
    strict: bool,
    /// Also write a JSON listing of the encoded instructions
    #[arg(long, value_name = "FILE")]
    listing: Option<PathBuf>,
}

impl Opts {
    fn encoder_config(&self) -> EncoderConfig {
        let field_policy = if self.strict { FieldPolicy::Strict } else { FieldPolicy::Wrap };
        EncoderConfig { field_policy }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => {
            println!("{USAGE}");
            std::process::exit(1);
        }
    };
    run(&opts)
}

/// Nothing is written unless the whole source encodes.
fn run(opts: &Opts) -> Result<()> {
    let lines = load_source(&opts.input)?;
    let image = Encoder::new(opts.encoder_config())
        .encode_program(&lines)
        .with_context(|| format!("assembling {}", opts.input.display()))?;

    write_image(&opts.output, &image)?;
    if let Some(path) = &opts.listing {
        write_listing(path, &build_listing(&lines, &image))?;
    }

    info!(
        instructions = image.instruction_count(),
        bytes = image.byte_len(),
        output = %opts.output.display(),
        "wrote bitcode image"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rass_{}_{name}", std::process::id()))
    }

    #[test]
    fn exactly_two_positionals_required() {
        let opts = Opts::try_parse_from(["rass", "in.rass", "out.bin"]).unwrap();
        assert_eq!(opts.input, PathBuf::from("in.rass"));
        assert_eq!(opts.output, PathBuf::from("out.bin"));
        assert_eq!(opts.encoder_config().field_policy, FieldPolicy::Wrap);

        assert!(Opts::try_parse_from(["rass"]).is_err());
        assert!(Opts::try_parse_from(["rass", "in.rass"]).is_err());
        assert!(Opts::try_parse_from(["rass", "a", "b", "c"]).is_err());
    }

    #[test]
    fn strict_flag_selects_policy() {
        let opts = Opts::try_parse_from(["rass", "--strict", "in.rass", "out.bin"]).unwrap();
        assert_eq!(opts.encoder_config().field_policy, FieldPolicy::Strict);
    }

    #[test]
    fn run_writes_padded_image_and_listing() {
        let input = scratch("ok.rass");
        let output = scratch("ok.bin");
        let listing = scratch("ok.json");
        std::fs::write(&input, "add 1 2 3\nset 4 255\njmp 5 6\nnot 2 3\n").unwrap();

        let opts = Opts { input: input.clone(), output: output.clone(), strict: false, listing: Some(listing.clone()) };
        run(&opts).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(bytes.len(), 65536);
        assert_eq!(&bytes[..8], &[0x01, 0x23, 0xB4, 0xFF, 0xC0, 0x56, 0x52, 0x30]);
        assert!(bytes[8..].iter().all(|&b| b == 0));

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&listing).unwrap()).unwrap();
        assert_eq!(json["instructions"], 4);

        for p in [input, output, listing] {
            let _ = std::fs::remove_file(p);
        }
    }

    #[test]
    fn failed_encode_leaves_no_output() {
        let input = scratch("bad.rass");
        let output = scratch("bad.bin");
        let _ = std::fs::remove_file(&output);
        std::fs::write(&input, "add 1 2 3\nfoo 0 1 2\n").unwrap();

        let opts = Opts { input: input.clone(), output: output.clone(), strict: false, listing: None };
        let err = run(&opts).unwrap_err();
        assert!(format!("{err:#}").contains("line 2: unknown opcode `foo`"));
        assert!(!output.exists());

        let _ = std::fs::remove_file(input);
    }
}
