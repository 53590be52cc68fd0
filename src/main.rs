use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hmac_url::models::{ExceptedFields, FieldMap, FieldValue, SecretKey};
use hmac_url::services::{add_temporal_mark_now, TemporalOffset};
use hmac_url::{HmacConfig, HmacError, HmacService, SigningProfile};

#[derive(Parser)]
#[command(name = "hmac-url")]
#[command(about = "Issue and verify tamper-evident URLs")]
struct Cli {
    /// Signing configuration file (YAML)
    #[arg(long, short, global = true, env = "HMAC_URL_CONFIG")]
    config: Option<PathBuf>,

    /// Secret to use when no configuration file is given
    #[arg(long, global = true, env = "HMAC_URL_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Signing context (profile name)
    #[arg(long, global = true, default_value = "default")]
    context: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign fields into a URL (or print only the MAC)
    Sign {
        /// URL base, e.g. https://example.com/confirm
        base: Option<String>,

        /// Field as name=value (repeatable)
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Field carried in the URL but left out of the MAC (repeatable)
        #[arg(long)]
        except: Vec<String>,

        /// URL fragment
        #[arg(long)]
        fragment: Option<String>,

        /// Time-to-live in seconds
        #[arg(long, conflicts_with = "valid_for")]
        ttl: Option<u32>,

        /// Time-to-live in days
        #[arg(long)]
        valid_for: Option<u32>,

        /// Print only the MAC of the fields
        #[arg(long)]
        mac_only: bool,
    },
    /// Verify a signed URL (exit code 1 when invalid)
    Verify {
        url: String,

        /// Field left out of the MAC (repeatable)
        #[arg(long)]
        except: Vec<String>,

        /// Report expiry as an error instead of a plain "invalid"
        #[arg(long)]
        strict: bool,
    },
    /// Print the fields of a URL as JSON, without verifying it
    Parse { url: String },
    /// Generate a random secret
    Secret,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hmac_url=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Secret => {
            println!("{}", SecretKey::random().expose());
            Ok(())
        }
        Commands::Sign {
            base,
            fields,
            except,
            fragment,
            ttl,
            valid_for,
            mac_only,
        } => {
            let service = load_service(cli.config, cli.secret, &cli.context)?;
            let mut fields: FieldMap = fields
                .into_iter()
                .map(|(name, value)| (name, FieldValue::Text(value)))
                .collect();
            let offset = match (ttl, valid_for) {
                (Some(seconds), _) => Some(TemporalOffset::seconds(seconds)),
                (None, Some(days)) => Some(TemporalOffset::days(days)),
                (None, None) => None,
            };
            if let Some(offset) = offset {
                add_temporal_mark_now(&mut fields, offset)?;
            }
            let excepted: ExceptedFields = except.into_iter().collect();

            if mac_only {
                println!("{}", service.calculate_hmac(&cli.context, &fields, &excepted)?);
                return Ok(());
            }
            let Some(base) = base else {
                bail!("a URL base is required unless --mac-only is given");
            };
            let url = service.calculate_url(
                &cli.context,
                &fields,
                &excepted,
                &base,
                fragment.as_deref(),
            )?;
            println!("{url}");
            Ok(())
        }
        Commands::Verify {
            url,
            except,
            strict,
        } => {
            let service = load_service(cli.config, cli.secret, &cli.context)?;
            let excepted: ExceptedFields = except.into_iter().collect();
            match service.validate_url(&cli.context, &url, &excepted, strict) {
                Ok(true) => {
                    println!("valid");
                    Ok(())
                }
                Ok(false) => {
                    println!("invalid");
                    std::process::exit(1);
                }
                Err(HmacError::UrlExpired(reason)) => {
                    eprintln!("expired: {reason}");
                    std::process::exit(1);
                }
                Err(e) => Err(e.into()),
            }
        }
        Commands::Parse { url } => {
            let service = load_service(cli.config, cli.secret, &cli.context)?;
            let fields = service.url_fields(&cli.context, &url)?;
            println!("{}", serde_json::to_string_pretty(&fields)?);
            Ok(())
        }
    }
}

/// Build the service from the config file, or from a bare secret
fn load_service(
    config: Option<PathBuf>,
    secret: Option<String>,
    context: &str,
) -> anyhow::Result<HmacService> {
    let config = match (config, secret) {
        (Some(path), _) => HmacConfig::load(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        (None, Some(secret)) => HmacConfig::single(SigningProfile::new(context, secret)),
        (None, None) => bail!("either --config/HMAC_URL_CONFIG or --secret/HMAC_URL_SECRET is required"),
    };
    Ok(HmacService::new(config)?)
}
