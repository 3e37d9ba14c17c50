use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use studyscout::api::{self, AppState};

#[derive(Parser, Debug)]
#[command(name = "studyscout", version, about = "Learning-resource curation service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server.
    Serve(ServeCmd),
    /// Diagnose configuration without printing secrets.
    Doctor(DoctorCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(Args, Debug)]
struct ServeCmd {
    /// Address to bind.
    #[arg(long, env = "STUDYSCOUT_BIND", default_value = "127.0.0.1")]
    bind: String,
    /// Port to listen on.
    #[arg(long, env = "STUDYSCOUT_PORT", default_value_t = 8488)]
    port: u16,
}

#[derive(Args, Debug)]
struct DoctorCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

// Logs go to stderr so subcommand stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn has_env(key: &str) -> bool {
    std::env::var(key)
        .ok()
        .is_some_and(|v| !v.trim().is_empty())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            init_tracing();
            let state = AppState {
                http: studyscout_local::http_client()?,
            };
            let app = api::router(state);
            let listener =
                tokio::net::TcpListener::bind(format!("{}:{}", args.bind, args.port)).await?;
            tracing::info!(addr = %listener.local_addr()?, "studyscout listening");
            axum::serve(listener, app).await?;
        }
        Commands::Doctor(args) => {
            let t0 = std::time::Instant::now();

            // Presence booleans only; values never reach stdout.
            let gemini_configured =
                has_env("STUDYSCOUT_GEMINI_API_KEY") || has_env("GEMINI_API_KEY");
            let gemini_base_overridden = has_env("STUDYSCOUT_GEMINI_BASE_URL");
            let youtube_overridden = has_env("STUDYSCOUT_YOUTUBE_ENDPOINT");

            let mut checks: Vec<serde_json::Value> = Vec::new();
            checks.push(serde_json::json!({
                "name": "gemini_api_key",
                "ok": gemini_configured,
                "message": if gemini_configured {
                    "Gemini API key is set"
                } else {
                    "Gemini API key is missing"
                },
                "hint": if gemini_configured {
                    ""
                } else {
                    "Set STUDYSCOUT_GEMINI_API_KEY (or GEMINI_API_KEY)."
                },
            }));

            let client_ok = studyscout_local::http_client().is_ok();
            checks.push(serde_json::json!({
                "name": "http_client",
                "ok": client_ok,
                "message": if client_ok {
                    "HTTP client builds"
                } else {
                    "HTTP client failed to build"
                },
                "hint": "",
            }));

            let ok = checks
                .iter()
                .all(|c| c["ok"].as_bool().unwrap_or(false));
            let payload = serde_json::json!({
                "schema_version": 1,
                "kind": "doctor",
                "ok": ok,
                "name": "studyscout",
                "version": env!("CARGO_PKG_VERSION"),
                "platform": {
                    "os": std::env::consts::OS,
                    "arch": std::env::consts::ARCH,
                },
                "elapsed_ms": t0.elapsed().as_millis() as u64,
                "configured": {
                    "llm": {
                        "gemini": gemini_configured,
                        "gemini_model": if gemini_configured {
                            Some(studyscout_local::gemini::gemini_model_from_env())
                        } else {
                            None
                        },
                    },
                    "endpoints": {
                        "gemini_base_url_overridden": gemini_base_overridden,
                        "youtube_endpoint_overridden": youtube_overridden,
                    },
                },
                "checks": checks,
            });

            match args.output.to_ascii_lowercase().as_str() {
                "text" => {
                    println!("studyscout {} (ok={ok})", env!("CARGO_PKG_VERSION"));
                    println!("llm: gemini={gemini_configured}");
                    println!("checks:");
                    if let Some(items) = payload["checks"].as_array() {
                        for check in items {
                            let name = check["name"].as_str().unwrap_or("?");
                            let passed = check["ok"].as_bool().unwrap_or(false);
                            println!("- {name}: {}", if passed { "ok" } else { "fail" });
                        }
                    }
                }
                _ => println!("{payload}"),
            }
        }
        Commands::Version(args) => {
            let payload = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "studyscout",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("studyscout {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{payload}"),
            }
        }
    }
    Ok(())
}
