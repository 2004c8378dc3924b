mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use orghook_github::{Client, Credentials, Hook, ListOptions, Response};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "orghook")]
#[command(about = "Manage GitHub organization webhooks")]
struct Cli {
    /// API root, overrides GITHUB_API_BASE
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a hook
    Create {
        #[command(flatten)]
        org: OrgArgs,

        /// Hook name
        #[arg(long, default_value = "web")]
        name: String,

        #[command(flatten)]
        hook: HookArgs,
    },
    /// List hooks
    List {
        #[command(flatten)]
        org: OrgArgs,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        per_page: Option<u32>,
    },
    /// Show a single hook
    Get {
        #[command(flatten)]
        target: HookTarget,
    },
    /// Update a hook
    Edit {
        #[command(flatten)]
        target: HookTarget,

        #[command(flatten)]
        hook: HookArgs,
    },
    /// Delete a hook
    Delete {
        #[command(flatten)]
        target: HookTarget,
    },
    /// Trigger a test delivery
    Test {
        #[command(flatten)]
        target: HookTarget,
    },
}

#[derive(Args)]
struct OrgArgs {
    /// Organization login
    #[arg(short, long)]
    org: String,
}

#[derive(Args)]
struct HookTarget {
    #[command(flatten)]
    org: OrgArgs,

    /// Hook id
    #[arg(long)]
    id: i64,
}

#[derive(Args)]
struct HookArgs {
    /// Payload URL
    #[arg(long)]
    url: Option<String>,

    /// Payload content type (json or form)
    #[arg(long)]
    content_type: Option<String>,

    /// Secret used to sign deliveries
    #[arg(long)]
    secret: Option<String>,

    /// Event to subscribe to, repeatable
    #[arg(short, long = "event")]
    events: Vec<String>,

    /// Enable or disable deliveries
    #[arg(long)]
    active: Option<bool>,

    /// Extra config entry as key=value, repeatable
    #[arg(long = "config", value_parser = parse_key_value)]
    config: Vec<(String, String)>,
}

impl HookArgs {
    fn apply(self, mut hook: Hook) -> Hook {
        if let Some(url) = self.url {
            hook = hook.with_config("url", url);
        }
        if let Some(content_type) = self.content_type {
            hook = hook.with_config("content_type", content_type);
        }
        if let Some(secret) = self.secret {
            hook = hook.with_config("secret", secret);
        }
        for (key, value) in self.config {
            hook = hook.with_config(key, value);
        }
        if !self.events.is_empty() {
            hook = hook.with_events(self.events);
        }
        if let Some(active) = self.active {
            hook = hook.with_active(active);
        }
        hook
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{}`", s))?;
    if key.is_empty() {
        return Err(format!("empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orghook=info,orghook_github=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(api_base) = cli.api_base {
        config.github_api_base = api_base;
    }

    let client = build_client(&config).await?;
    let orgs = client.organizations();

    match cli.command {
        Commands::Create { org, name, hook } => {
            let hook = hook.apply(Hook::new(name));
            let (created, response) = orgs.create_hook(&org.org, &hook).await?;
            report(&response);
            print_json(&created)?;
        }
        Commands::List {
            org,
            page,
            per_page,
        } => {
            let options = ListOptions { page, per_page };
            let (hooks, response) = orgs.list_hooks(&org.org, Some(&options)).await?;
            report(&response);
            print_json(&hooks)?;
        }
        Commands::Get { target } => {
            let (hook, response) = orgs.get_hook(&target.org.org, target.id).await?;
            report(&response);
            print_json(&hook)?;
        }
        Commands::Edit { target, hook } => {
            let patch = hook.apply(Hook::default());
            let (updated, response) = orgs.edit_hook(&target.org.org, target.id, &patch).await?;
            report(&response);
            print_json(&updated)?;
        }
        Commands::Delete { target } => {
            let response = orgs.delete_hook(&target.org.org, target.id).await?;
            report(&response);
            info!("deleted hook {} from {}", target.id, target.org.org);
        }
        Commands::Test { target } => {
            let response = orgs.test_hook(&target.org.org, target.id).await?;
            report(&response);
            info!("requested test delivery for hook {}", target.id);
        }
    }

    Ok(())
}

async fn build_client(config: &Config) -> Result<Client> {
    let credentials = match (&config.github_token, &config.github_app) {
        (Some(token), _) => Credentials::Token(token.clone()),
        (None, Some(app)) => {
            let bootstrap = Client::builder().base_url(&config.github_api_base).build()?;
            let token = bootstrap
                .installation_token(&app.credentials(), app.installation_id)
                .await?;
            Credentials::Token(token)
        }
        (None, None) => {
            warn!("neither GITHUB_TOKEN nor GITHUB_APP_ID is set, sending unauthenticated requests");
            Credentials::None
        }
    };

    Ok(Client::builder()
        .base_url(&config.github_api_base)
        .credentials(credentials)
        .build()?)
}

fn report(response: &Response) {
    info!(status = %response.status, "{}", response.url);
    if let Some(next) = response.next_page {
        info!(next_page = next, last_page = ?response.last_page, "more results available");
    }
    if let Some(rate) = response.rate {
        info!(limit = rate.limit, remaining = rate.remaining, reset = %rate.reset, "rate limit");
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
