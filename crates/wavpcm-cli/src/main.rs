//! wavpcm: convert between WAV containers and raw PCM files
//!
//! All container logic lives in wavpcm-codec; this binary only reads and
//! writes files around it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wavpcm_codec::{read_header_with_extra, wav_to_pcm, PcmParams};
use wavpcm_common::{AppConfig, EncodeDefaults};

#[derive(Parser, Debug)]
#[command(name = "wavpcm", version, about = "Convert between WAV containers and raw PCM")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level regardless of config
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the decoded header of a WAV file
    Inspect {
        file: PathBuf,
        /// Print metadata as JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract the PCM payload of a WAV file
    ToPcm { input: PathBuf, output: PathBuf },
    /// Wrap raw PCM samples in a WAV container
    ToWav {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        channels: Option<u16>,
        #[arg(long)]
        sample_rate: Option<u32>,
        #[arg(long)]
        bits: Option<u16>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    init_tracing(&config, cli.verbose)?;

    match cli.command {
        Command::Inspect { file, json } => inspect(&file, json),
        Command::ToPcm { input, output } => to_pcm(&input, &output),
        Command::ToWav {
            input,
            output,
            channels,
            sample_rate,
            bits,
        } => {
            let params = encode_params(&config.encode, channels, sample_rate, bits);
            to_wav(&input, &output, params)
        }
    }
}

fn init_tracing(config: &AppConfig, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_new("debug")?
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Command-line flags win over config values
fn encode_params(
    defaults: &EncodeDefaults,
    channels: Option<u16>,
    sample_rate: Option<u32>,
    bits: Option<u16>,
) -> PcmParams {
    PcmParams::new(
        channels.unwrap_or(defaults.channels),
        sample_rate.unwrap_or(defaults.sample_rate),
        bits.unwrap_or(defaults.bits_per_sample),
    )
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Reading {}", path.display()))
}

fn inspect(path: &Path, json: bool) -> Result<()> {
    let wav = read_file(path)?;
    let meta = read_header_with_extra(&wav)
        .with_context(|| format!("Decoding {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
    } else {
        println!("{}: {}", path.display(), meta.info_line());
    }
    Ok(())
}

fn to_pcm(input: &Path, output: &Path) -> Result<()> {
    let wav = read_file(input)?;
    let (pcm, meta) = wav_to_pcm(&wav).with_context(|| format!("Decoding {}", input.display()))?;
    info!("{}: {}", input.display(), meta.info_line());

    fs::write(output, pcm).with_context(|| format!("Writing {}", output.display()))?;
    info!("Wrote {} PCM bytes to {}", pcm.len(), output.display());
    Ok(())
}

fn to_wav(input: &Path, output: &Path, params: PcmParams) -> Result<()> {
    let pcm = read_file(input)?;
    let wav = params
        .encode(&pcm)
        .with_context(|| format!("Encoding {}", input.display()))?;

    fs::write(output, &wav).with_context(|| format!("Writing {}", output.display()))?;
    info!(
        "Wrote {} ({}ch {}Hz {}bit, {} bytes)",
        output.display(),
        params.channels,
        params.sample_rate,
        params.bits_per_sample,
        wav.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_to_wav_flags() {
        let cli = Cli::try_parse_from([
            "wavpcm", "to-wav", "in.pcm", "out.wav", "--channels", "2", "--sample-rate", "44100",
        ])
        .unwrap();
        match cli.command {
            Command::ToWav {
                channels,
                sample_rate,
                bits,
                ..
            } => {
                assert_eq!(channels, Some(2));
                assert_eq!(sample_rate, Some(44100));
                assert_eq!(bits, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let defaults = EncodeDefaults::default();
        let params = encode_params(&defaults, Some(2), None, Some(8));
        assert_eq!(params, PcmParams::new(2, 16000, 8));
    }

    #[test]
    fn test_config_fills_missing_flags() {
        let defaults = EncodeDefaults {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 24,
        };
        assert_eq!(
            encode_params(&defaults, None, None, None),
            PcmParams::new(2, 48000, 24)
        );
    }

    #[test]
    fn test_to_wav_then_to_pcm() {
        let dir = std::env::temp_dir().join(format!("wavpcm-cli-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let raw = dir.join("in.pcm");
        let wav = dir.join("out.wav");
        let back = dir.join("back.pcm");
        fs::write(&raw, [1u8, 2, 3, 4, 5, 6]).unwrap();

        to_wav(&raw, &wav, PcmParams::new(1, 8000, 16)).unwrap();
        to_pcm(&wav, &back).unwrap();

        assert_eq!(fs::read(&back).unwrap(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(fs::read(&wav).unwrap().len(), 44 + 6);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_inspect_rejects_non_wav() {
        let dir = std::env::temp_dir().join(format!("wavpcm-inspect-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("junk.wav");
        fs::write(&path, [0u8; 64]).unwrap();

        let err = inspect(&path, false).unwrap_err();
        assert!(err.to_string().starts_with("Decoding"), "{}", err);
        fs::remove_dir_all(&dir).unwrap();
    }
}
