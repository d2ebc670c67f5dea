//! Verify PDF Signatures
//!
//! Verifies the embedded signatures of a PDF and prints the result as JSON.
//!
//! Usage:
//!   cargo run --release --bin verify_signatures -- document.pdf
//!   cargo run --release --bin verify_signatures -- document.pdf --anchors roots.pem --no-system
//!
//! Exit status: 0 if every signature is valid (or the document is unsigned),
//! 1 if any signature is invalid, 2 on usage, input or IO errors.
//! Set `RUST_LOG=debug` for per-signature progress.

use pdf_sigverify::config::VerifierOptions;
use pdf_sigverify::signatures::{SignatureVerifier, TrustAnchors};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug)]
struct VerifyConfig {
    pdf_path: PathBuf,
    anchor_files: Vec<PathBuf>,
    use_system: bool,
    pretty: bool,
    include_pem: bool,
}

const USAGE: &str =
    "Usage: verify_signatures <file.pdf> [--anchors <roots.pem>]... [--no-system] [--pretty] [--pem]";

impl VerifyConfig {
    fn from_args() -> Result<Self, String> {
        Self::parse(std::env::args().skip(1))
    }

    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut args = args.into_iter();
        let mut pdf_path = None;
        let mut anchor_files = Vec::new();
        let mut use_system = true;
        let mut pretty = false;
        let mut include_pem = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--anchors" => match args.next() {
                    Some(path) => anchor_files.push(PathBuf::from(path)),
                    None => return Err("--anchors requires a PEM file".to_string()),
                },
                "--no-system" => {
                    use_system = false;
                },
                "--pretty" => {
                    pretty = true;
                },
                "--pem" => {
                    include_pem = true;
                },
                flag if flag.starts_with('-') => {
                    return Err(format!("unknown option: {}", flag));
                },
                path => {
                    if pdf_path.is_some() {
                        return Err(format!("unexpected argument: {}", path));
                    }
                    pdf_path = Some(PathBuf::from(path));
                },
            }
        }

        Ok(Self {
            pdf_path: pdf_path.ok_or_else(|| "missing PDF file".to_string())?,
            anchor_files,
            use_system,
            pretty,
            include_pem,
        })
    }
}

fn build_anchors(config: &VerifyConfig) -> pdf_sigverify::Result<TrustAnchors> {
    let mut anchors = if config.use_system {
        TrustAnchors::system_or_empty()
    } else {
        TrustAnchors::new()
    };
    for path in &config.anchor_files {
        let data = std::fs::read(path)?;
        let added = anchors.add_pem_bundle(&data)?;
        log::info!("Added {} trust anchor(s) from {}", added, path.display());
    }
    Ok(anchors)
}

fn run(config: &VerifyConfig) -> pdf_sigverify::Result<bool> {
    let anchors = build_anchors(config)?;
    let verifier = SignatureVerifier::new(Arc::new(anchors))
        .with_options(VerifierOptions::new().with_certificate_pem(config.include_pem));

    let bytes = std::fs::read(&config.pdf_path)?;
    let result = verifier.verify(&bytes)?;

    let json = if config.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", json);

    if config.include_pem {
        for sig in &result.signatures {
            if let Some(pem) = &sig.raw_certificate_pem {
                eprint!("{}", pem);
            }
        }
    }

    Ok(result.all_valid)
}

fn main() -> ExitCode {
    env_logger::init();

    let config = match VerifyConfig::from_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        },
    };

    match run(&config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {}: {}", config.pdf_path.display(), e);
            ExitCode::from(2)
        },
    }
}
