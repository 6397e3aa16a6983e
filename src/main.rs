use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use hydrator::{
    adapters::{FileSchemaProvider, HydrationHandler, InMemoryRequest, ParsedCommand},
    config::{HydratorConfig, HydratorConfigValidator, loader::load_config},
    core::Hydrator,
    metrics,
    ports::SchemaProvider,
    tracing_setup,
    utils::GracefulShutdown,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "hydrator.yaml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate a schema file
    Validate {
        #[clap(short, long, default_value = "hydrator.yaml")]
        config: String,
    },
    /// Write a starter schema file
    Init {
        #[clap(short, long, default_value = "hydrator.yaml")]
        config: String,
    },
    /// Hydrate a DTO from a request fixture and print it as JSON
    Hydrate {
        #[clap(short, long, default_value = "hydrator.yaml")]
        config: String,
        /// Registered DTO name
        #[clap(short, long)]
        dto: String,
        /// JSON file with `headers`, `parameters`, `vars`, `json` and `form`
        #[clap(short, long)]
        fixture: String,
    },
    /// Hydrate a DTO from the arguments following `--`
    Command {
        #[clap(short, long, default_value = "hydrator.yaml")]
        config: String,
        #[clap(short, long)]
        dto: String,
        #[clap(last = true)]
        args: Vec<String>,
    },
    /// Serve the configured routes over HTTP (default)
    Serve {
        #[clap(short, long, default_value = "hydrator.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => validate_config_command(&config).await,
        Some(Commands::Init { config }) => init_config_command(&config).await,
        Some(Commands::Hydrate {
            config,
            dto,
            fixture,
        }) => hydrate_command(&config, &dto, &fixture).await,
        Some(Commands::Command { config, dto, args }) => command_command(&config, &dto, args).await,
        Some(Commands::Serve { config }) => serve(&config).await,
        None => serve(&args.config).await,
    }
}

async fn serve(config_path: &str) -> Result<()> {
    let provider: Arc<dyn SchemaProvider> = Arc::new(
        FileSchemaProvider::new(config_path).context("Failed to create schema provider")?,
    );

    let config = provider
        .load_config()
        .await
        .with_context(|| format!("Failed to load schema from {config_path}"))?;
    HydratorConfigValidator::validate(&config).map_err(|e| eyre!("{e}"))?;

    tracing_setup::init_tracing_with_config(&config.logging)
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;
    metrics::init_metrics().map_err(|e| eyre!("Failed to initialize metrics: {}", e))?;

    let handler =
        HydrationHandler::from_config(&config).context("Failed to build hydration state")?;
    metrics::set_registered_dtos(config.dtos.len());

    for route in &config.routes {
        tracing::info!(path = %route.path, methods = ?route.methods, dto = %route.dto, "Configured route");
    }

    spawn_schema_watcher(provider, handler.clone(), config_path.to_string());

    let graceful_shutdown = Arc::new(GracefulShutdown::new());
    let signal_handler_shutdown = graceful_shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signal_handler_shutdown.run_signal_handler().await {
            tracing::error!("Signal handler error: {}", e);
        }
    });

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .context("Failed to parse listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!("Hydrator listening on {}", addr);
    println!("Hydrator listening on {addr} ({} dtos, {} routes)", config.dtos.len(), config.routes.len());

    let shutdown = graceful_shutdown.clone();
    axum::serve(listener, handler.router())
        .with_graceful_shutdown(async move {
            let reason = shutdown.wait_for_shutdown_signal().await;
            tracing::info!(?reason, "Shutting down");
        })
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown completed");
    Ok(())
}

/// Reload the hydration state whenever the schema file changes. A file that
/// fails to load or validate leaves the running state untouched.
fn spawn_schema_watcher(
    provider: Arc<dyn SchemaProvider>,
    handler: HydrationHandler,
    config_path: String,
) {
    let debounce_duration = Duration::from_secs(2);
    let mut notify_rx = provider.watch();

    tokio::spawn(async move {
        tracing::info!("Schema watcher task started.");
        let mut last_reload = tokio::time::Instant::now();
        last_reload = last_reload.checked_sub(debounce_duration).unwrap_or(last_reload);

        while notify_rx.recv().await.is_some() {
            if last_reload.elapsed() < debounce_duration {
                tracing::debug!("Debouncing schema reload event.");
                while notify_rx.try_recv().is_ok() {}
                continue;
            }
            last_reload = tokio::time::Instant::now();

            tracing::info!("Reloading schema from {}", config_path);
            let reloaded = match provider.load_config().await {
                Ok(config) => HydratorConfigValidator::validate(&config)
                    .map_err(|e| eyre!("{e}"))
                    .and_then(|()| handler.reload(&config)),
                Err(e) => Err(e),
            };
            if let Err(e) = reloaded {
                tracing::error!("Failed to reload schema: {}. Keeping the current one.", e);
            }

            while notify_rx.try_recv().is_ok() {}
        }

        tracing::info!("Schema watcher task is shutting down.");
    });
}

async fn load_hydrator(config_path: &str) -> Result<Hydrator> {
    let config: HydratorConfig = load_config(config_path)
        .await
        .with_context(|| format!("Failed to load schema from {config_path}"))?;
    let registry = config
        .build_registry()
        .map_err(|e| eyre!("Invalid dto declarations: {e}"))?;

    Ok(Hydrator::new(Arc::new(registry)).with_mode(config.hydration.coercion_mode()))
}

/// Print a hydration result; binding errors go to stderr with exit code 1
fn report(result: hydrator::core::BindingResult<hydrator::core::HydratedDto>) -> Result<()> {
    match result {
        Ok(dto) => {
            println!("{}", serde_json::to_string_pretty(&dto)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", serde_json::to_string_pretty(&e.to_json())?);
            std::process::exit(1);
        }
    }
}

async fn hydrate_command(config_path: &str, dto: &str, fixture: &str) -> Result<()> {
    tracing_setup::init_console_tracing()?;
    let hydrator = load_hydrator(config_path).await?;

    let raw = tokio::fs::read_to_string(fixture)
        .await
        .with_context(|| format!("Failed to read fixture {fixture}"))?;
    let request: InMemoryRequest =
        serde_json::from_str(&raw).with_context(|| format!("Invalid fixture {fixture}"))?;

    report(hydrator.hydrate(dto, &request.normalized()))
}

async fn command_command(config_path: &str, dto: &str, args: Vec<String>) -> Result<()> {
    tracing_setup::init_console_tracing()?;
    let hydrator = load_hydrator(config_path).await?;

    report(hydrator.hydrate_command(dto, &ParsedCommand::parse(args)))
}

/// Validate a schema file and exit
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating schema file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Schema file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path).await {
        Ok(config) => {
            println!("✅ Schema parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Schema parsing failed:");
            eprintln!("   {e:#}");
            std::process::exit(1);
        }
    };

    match HydratorConfigValidator::validate(&config) {
        Ok(()) => {
            println!("✅ Schema validation: OK");
            println!();
            println!("📋 Schema Summary:");
            println!("   • Listen Address: {}", config.listen_addr);
            println!("   • DTOs: {}", config.dtos.len());
            for dto in &config.dtos {
                println!("     - {} ({} fields)", dto.name, dto.fields.len());
            }
            println!("   • Routes: {}", config.routes.len());
            println!("   • Strict numbers: {}", config.hydration.strict_numbers);
            println!();
            println!("🎉 Schema is valid and ready to use!");
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Schema validation failed:");
            eprintln!("{e}");
            println!();
            println!("💡 Common fixes:");
            println!("   • Prefix every source with header:, parameter:, var:, json: or formdata:");
            println!("   • Give every date field a format and every dto field a dto");
            println!("   • Declare every dto a route or nested field refers to");
            std::process::exit(1);
        }
    }
}

/// Write a starter schema file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Schema file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# Hydrator schema

listen_addr: "127.0.0.1:8080"

logging:
  level: info
  json: false

hydration:
  # Reject "12abc" for int fields instead of reading 12
  strict_numbers: false
  max_body_bytes: 1048576

dtos:
  - name: CreateOrder
    fields:
      - { name: token, source: "header:x-api-token", type: string, nullable: true }
      - { name: customer, source: "var:customer", type: string }
      - { name: note, source: "json:meta.note", type: string, nullable: true }
      - { name: placed, source: "json:placed", type: date, format: "Y-m-d H:i:s" }
      - { name: lines, source: "json:lines", type: array, element: OrderLine }

  - name: OrderLine
    fields:
      - { name: sku, source: "json:sku", type: string }
      - { name: quantity, source: "json:quantity", type: int }

  - name: Deploy
    fields:
      - { name: flags, type: object }
      - { name: words, type: array }

routes:
  - path: "/customers/{customer}/orders"
    methods: [POST]
    dto: CreateOrder
"#;

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write schema file")?;
    println!("✅ Created starter schema at: {config_path}");
    println!("   Run 'hydrator serve --config {config_path}' to start the server");
    Ok(())
}
