use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{redirect::Policy, Method};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Smoke-test client for the relay proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5002")]
    url: String,

    #[arg(short, long, env = "SECRET_KEY", default_value = "goruboe")]
    secret: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the GET/POST/PUT/DELETE, secret-path and missing-path checks
    Smoke,
    /// Send a single request through the proxy
    Send {
        #[arg(short, long, default_value = "GET")]
        method: String,
        #[arg(short, long, default_value = "/test")]
        path: String,
        /// Raw request body
        #[arg(short, long)]
        data: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder().redirect(Policy::none()).build()?;
    let base = cli.url.trim_end_matches('/').to_string();

    match cli.command {
        Commands::Smoke => {
            let payment = json!({"amount": 100, "currency": "USD"});
            let checks = [
                (Method::GET, "/api/payment/checkout".to_string(), None),
                (Method::POST, "/api/payment/checkout".to_string(), Some(payment.clone())),
                (Method::PUT, "/api/payment/checkout".to_string(), Some(payment)),
                (Method::DELETE, "/api/payment/checkout".to_string(), None),
                (Method::POST, format!("/hooks/{}", cli.secret), Some(json!({"event": "ping"}))),
                (Method::GET, "/nonexistent/path".to_string(), None),
            ];

            for (method, path, body) in checks {
                println!("==> {} {}", method, path);
                let mut request = client.request(method, format!("{}{}", base, path));
                if let Some(body) = body {
                    request = request.json(&body);
                }
                print_response(request.send().await?).await?;
            }
        }
        Commands::Send { method, path, data } => {
            let method: Method = method.to_uppercase().parse()?;
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

            let mut request = client
                .request(method, format!("{}{}", base, path))
                .headers(headers);
            if let Some(data) = data {
                request = request.body(data);
            }
            print_response(request.send().await?).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    println!("Status: {}", res.status());
    for (name, value) in res.headers() {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    println!();
    Ok(())
}
