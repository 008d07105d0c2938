// crates/fixsbe-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fixsbe_core::SeparatorHint;
use fixsbe_merkle::path_from_signed;
use fixsbe_orchestra::{compile_to_sbe, parse_repository, CompileOptions};
use fixsbe_pipeline::bundle::proof_for_path;
use fixsbe_pipeline::io::{read_bundle_auto, write_bundle_auto, write_commitment_auto};
use fixsbe_pipeline::{MessageSelector, PipelineConfig, SchemaCache};
use fixsbe_sbe::{decode_message, descriptor_from_pairs, encode_message};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "fixsbe",
    about = "fixsbe reference CLI",
    long_about = "fixsbe reference CLI.\n\nCompile Orchestra repositories to SBE schemas, encode/decode FIX messages, and commit descriptors to Merkle roots with per-field inclusion proofs.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compile an Orchestra repository into an SBE schema
    Compile {
        /// Input Orchestra XML path
        #[arg(long)]
        orchestra: PathBuf,

        /// Output SBE schema path
        #[arg(long, default_value = "schema.xml")]
        out: PathBuf,

        /// Compile only the named message
        #[arg(long)]
        message: Option<String>,

        /// Schema id for the emitted header
        #[arg(long, default_value_t = 1)]
        schema_id: u16,
    },

    /// Encode a FIX message to SBE bytes
    Encode {
        #[command(flatten)]
        select: Select,

        /// FIX input: a file path, or the message itself
        #[arg(long)]
        input: String,

        /// Separator handling
        #[arg(long, value_enum, default_value_t = SeparatorOpt::Auto)]
        separator: SeparatorOpt,

        /// Output path for the raw bytes; hex to stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Decode SBE bytes back to tag/value JSON
    Decode {
        #[command(flatten)]
        select: Select,

        /// Input path holding the raw SBE bytes
        #[arg(long)]
        input: PathBuf,
    },

    /// Encode a FIX message and commit its fields to a Merkle root, without per-field proofs
    Commit {
        #[command(flatten)]
        select: Select,

        /// FIX input: a file path, or the message itself
        #[arg(long)]
        input: String,

        /// Separator handling
        #[arg(long, value_enum, default_value_t = SeparatorOpt::Auto)]
        separator: SeparatorOpt,

        /// Output path for the commitment (JSON/CBOR by extension)
        #[arg(long, default_value = "commitment.json")]
        out: PathBuf,
    },

    /// Encode, commit, and prove every field of a FIX message
    Bundle {
        #[command(flatten)]
        select: Select,

        /// FIX input: a file path, or the message itself
        #[arg(long)]
        input: String,

        /// Separator handling
        #[arg(long, value_enum, default_value_t = SeparatorOpt::Auto)]
        separator: SeparatorOpt,

        /// Output path for the proof bundle (JSON/CBOR by extension)
        #[arg(long, default_value = "bundle.json")]
        out: PathBuf,
    },

    /// Print the inclusion proof for one field path from a bundle
    Prove {
        /// Bundle path (JSON/CBOR)
        #[arg(long)]
        bundle: PathBuf,

        /// Leaf path, comma-separated (e.g. "453,0,448")
        #[arg(long)]
        path: String,
    },

    /// Re-verify every proof in a bundle against its root
    Verify {
        /// Bundle path (JSON/CBOR)
        #[arg(long)]
        bundle: PathBuf,
    },
}

/// Message selection shared by the codec subcommands.
#[derive(clap::Args, Debug)]
struct Select {
    /// SBE schema path
    #[arg(long)]
    schema: PathBuf,

    /// Message template id
    #[arg(long, conflicts_with = "message")]
    template: Option<u16>,

    /// Message name
    #[arg(long)]
    message: Option<String>,
}

impl Select {
    fn selector(&self) -> Result<MessageSelector> {
        match (self.template, &self.message) {
            (Some(id), _) => Ok(MessageSelector::Id(id)),
            (None, Some(name)) => Ok(MessageSelector::Name(name.clone())),
            (None, None) => bail!("one of --template or --message is required"),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum SeparatorOpt {
    Auto,
    Soh,
    Pipe,
    Newline,
}

impl From<SeparatorOpt> for SeparatorHint {
    fn from(opt: SeparatorOpt) -> Self {
        match opt {
            SeparatorOpt::Auto => Self::Auto,
            SeparatorOpt::Soh => Self::Soh,
            SeparatorOpt::Pipe => Self::Pipe,
            SeparatorOpt::Newline => Self::Newline,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Compile {
            orchestra,
            out,
            message,
            schema_id,
        } => compile(&orchestra, &out, message, schema_id),
        Cmd::Encode {
            select,
            input,
            separator,
            out,
        } => encode(&select, &input, separator, out.as_deref()),
        Cmd::Decode { select, input } => decode(&select, &input),
        Cmd::Commit {
            select,
            input,
            separator,
            out,
        } => commit(&select, &input, separator, &out),
        Cmd::Bundle {
            select,
            input,
            separator,
            out,
        } => bundle(&select, &input, separator, &out),
        Cmd::Prove { bundle, path } => prove(&bundle, &path),
        Cmd::Verify { bundle } => verify(&bundle),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// FIX input may be a path or the literal message text.
fn read_fix_input(input: &str) -> Result<String> {
    let candidate = Path::new(input);
    if candidate.exists() {
        fs::read_to_string(candidate).with_context(|| format!("reading {}", candidate.display()))
    } else {
        Ok(input.to_owned())
    }
}

fn compile(
    orchestra: &Path,
    out: &Path,
    message: Option<String>,
    schema_id: u16,
) -> Result<()> {
    info!(orchestra=%orchestra.display(), out=%out.display(), "compiling Orchestra repository");
    let xml = fs::read_to_string(orchestra)
        .with_context(|| format!("reading {}", orchestra.display()))?;
    let repo = parse_repository(&xml).context("parsing Orchestra repository")?;
    let options = CompileOptions {
        schema_id,
        target_message: message,
        ..CompileOptions::default()
    };
    let schema = compile_to_sbe(&repo, &options).context("compiling to SBE")?;
    fs::write(out, &schema).with_context(|| format!("writing {}", out.display()))?;
    println!(
        "Compiled {} messages → {}",
        repo.messages.len(),
        out.display()
    );
    Ok(())
}

fn encode(
    select: &Select,
    input: &str,
    separator: SeparatorOpt,
    out: Option<&Path>,
) -> Result<()> {
    let cache = SchemaCache::new();
    let schema = cache.load(&select.schema)?;
    let config = PipelineConfig {
        schema_path: select.schema.clone(),
        message: select.selector()?,
        separator: separator.into(),
        scaling_overrides: Vec::new(),
    };
    let layout = config.select(&schema)?;

    let fix = read_fix_input(input)?;
    let pairs = fixsbe_core::parse_tag_values(&fix, separator.into())
        .context("parsing FIX input")?;
    let descriptor = descriptor_from_pairs(layout, &pairs).context("folding descriptor")?;
    let bytes = encode_message(&schema, layout, &descriptor).context("encoding")?;

    match out {
        Some(path) => {
            fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
            println!("Encoded {} bytes → {}", bytes.len(), path.display());
        }
        None => println!("{}", hex::encode(&bytes)),
    }
    Ok(())
}

fn decode(select: &Select, input: &Path) -> Result<()> {
    let cache = SchemaCache::new();
    let schema = cache.load(&select.schema)?;
    let config = PipelineConfig {
        schema_path: select.schema.clone(),
        message: select.selector()?,
        separator: SeparatorHint::Auto,
        scaling_overrides: Vec::new(),
    };
    let layout = config.select(&schema)?;

    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let decoded = decode_message(layout, &bytes).context("decoding")?;
    let rendered =
        serde_json::to_string_pretty(&decoded).context("rendering decoded message")?;
    println!("{rendered}");
    Ok(())
}

fn commit(select: &Select, input: &str, separator: SeparatorOpt, out: &Path) -> Result<()> {
    let config = PipelineConfig {
        schema_path: select.schema.clone(),
        message: select.selector()?,
        separator: separator.into(),
        scaling_overrides: Vec::new(),
    };
    let cache = SchemaCache::new();
    let fix = read_fix_input(input)?;
    let commitment = fixsbe_pipeline::commit(&config, &cache, &fix)?;

    write_commitment_auto(out, &commitment)
        .with_context(|| format!("writing commitment to {}", out.display()))?;
    println!(
        "Committed {} leaves, root={} → {}",
        commitment.leaves.len(),
        hex::encode(commitment.root),
        out.display()
    );
    Ok(())
}

fn bundle(select: &Select, input: &str, separator: SeparatorOpt, out: &Path) -> Result<()> {
    let config = PipelineConfig {
        schema_path: select.schema.clone(),
        message: select.selector()?,
        separator: separator.into(),
        scaling_overrides: Vec::new(),
    };
    let cache = SchemaCache::new();
    let fix = read_fix_input(input)?;
    let bundle = fixsbe_pipeline::run(&config, &cache, &fix)?;

    write_bundle_auto(out, &bundle)
        .with_context(|| format!("writing bundle to {}", out.display()))?;
    println!(
        "Committed {} leaves, root={}, wrote {} ({} SBE bytes)",
        bundle.leaves.len(),
        hex::encode(bundle.root),
        out.display(),
        bundle.sbe.len()
    );
    Ok(())
}

fn prove(bundle_path: &Path, path_arg: &str) -> Result<()> {
    let bundle = read_bundle_auto(bundle_path)
        .with_context(|| format!("reading bundle {}", bundle_path.display()))?;

    let elements: Vec<i64> = path_arg
        .split(',')
        .map(|p| p.trim().parse::<i64>().context("path elements are integers"))
        .collect::<Result<_>>()?;
    let path = path_from_signed(&elements).context("invalid leaf path")?;

    let Some(proof) = proof_for_path(&bundle, &path) else {
        bail!("no leaf with path {path:?} in {}", bundle_path.display());
    };
    let rendered = serde_json::to_string_pretty(proof).context("rendering proof")?;
    println!("{rendered}");
    Ok(())
}

fn verify(bundle_path: &Path) -> Result<()> {
    let bundle = read_bundle_auto(bundle_path)
        .with_context(|| format!("reading bundle {}", bundle_path.display()))?;
    if !bundle.verify() {
        bail!("bundle does not verify against root {}", hex::encode(bundle.root));
    }
    println!(
        "OK: {} proofs verify against root {}",
        bundle.proofs.len(),
        hex::encode(bundle.root)
    );
    Ok(())
}
