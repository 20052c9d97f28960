mod commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "genolink", about = "Genotype queries on behalf of authorized users")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of the discovered one.
    #[arg(long, global = true, env = "GENOLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Only search this directory for `genolink.{toml,yaml,yml,json}`.
    #[arg(long, global = true, env = "GENOLINK_CONFIG_DIR", conflicts_with = "config")]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange an authorization code and store the user's credential.
    Provision {
        #[arg(long)]
        user: String,
        /// Code delivered to the OAuth redirect URI.
        #[arg(long)]
        code: String,
    },
    /// List the profiles on the user's account.
    Profiles {
        #[arg(long)]
        user: String,
    },
    /// Fetch genotypes for one or more variants.
    Genotypes {
        #[arg(long)]
        user: String,
        /// Variant id such as rs123; repeat for several.
        #[arg(long = "rsid", required = true)]
        rsids: Vec<String>,
        /// Restrict to these profiles instead of every cached one.
        #[arg(long = "profile")]
        profiles: Vec<String>,
    },
    /// Re-list the user's profiles and update the cached snapshot.
    ResyncProfiles {
        #[arg(long)]
        user: String,
    },
    /// Show the stored credential state without contacting the provider.
    Status {
        #[arg(long)]
        user: String,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "genolink starting");

    if let Some(dir) = &cli.config_dir {
        genolink_config::set_config_dir(dir.clone());
    }
    let config = match &cli.config {
        Some(path) => genolink_config::load_config(path)?,
        None => genolink_config::discover_and_load(),
    };
    let service = commands::build_service(&config).await?;

    let output = match cli.command {
        Commands::Provision { user, code } => commands::provision(&service, &user, &code).await?,
        Commands::Profiles { user } => commands::profiles(&service, &user).await?,
        Commands::Genotypes {
            user,
            rsids,
            profiles,
        } => commands::genotypes(&service, &user, &rsids, &profiles).await?,
        Commands::ResyncProfiles { user } => commands::resync_profiles(&service, &user).await?,
        Commands::Status { user } => commands::status(&service, &user).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genotypes_accepts_repeated_flags() {
        let cli = Cli::try_parse_from([
            "genolink",
            "genotypes",
            "--user",
            "alice",
            "--rsid",
            "rs123",
            "--rsid",
            "rs456",
            "--profile",
            "p1",
        ])
        .unwrap();
        match cli.command {
            Commands::Genotypes {
                user,
                rsids,
                profiles,
            } => {
                assert_eq!(user, "alice");
                assert_eq!(rsids, vec!["rs123", "rs456"]);
                assert_eq!(profiles, vec!["p1"]);
            },
            _ => panic!("expected genotypes subcommand"),
        }
    }

    #[test]
    fn genotypes_requires_a_variant() {
        assert!(Cli::try_parse_from(["genolink", "genotypes", "--user", "alice"]).is_err());
    }

    #[test]
    fn config_dir_and_config_file_conflict() {
        let cli = Cli::try_parse_from([
            "genolink",
            "status",
            "--user",
            "a",
            "--config-dir",
            "/etc/g",
        ])
        .unwrap();
        assert_eq!(cli.config_dir, Some(PathBuf::from("/etc/g")));
        assert!(
            Cli::try_parse_from([
                "genolink",
                "status",
                "--user",
                "a",
                "--config-dir",
                "/etc/g",
                "--config",
                "/etc/g/genolink.toml",
            ])
            .is_err()
        );
    }

    #[test]
    fn resync_uses_kebab_case() {
        let cli =
            Cli::try_parse_from(["genolink", "resync-profiles", "--user", "bob", "--json-logs"])
                .unwrap();
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Commands::ResyncProfiles { .. }));
    }
}
