use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use secure_api_client::api::keychain::KeychainPersistence;
use secure_api_client::api::types::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, VerifyOtpRequest,
};
use secure_api_client::{ApiClient, ApiResult, ClientConfig, RequestOptions};

#[derive(Parser, Debug)]
#[command(name = "secure-api-client", about = "Issue requests against the configured API")]
struct Args {
    /// Load environment variables from this file instead of ./.env
    #[arg(long)]
    env_file: Option<String>,

    /// Extra header, repeatable (`Name: value`)
    #[arg(long = "header", short = 'H', global = true)]
    headers: Vec<String>,

    /// Query parameter, repeatable (`key=value`)
    #[arg(long = "param", short = 'p', global = true)]
    params: Vec<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Get { path: String },
    Delete { path: String },
    Post { path: String, body: Option<String> },
    Put { path: String, body: Option<String> },
    Patch { path: String, body: Option<String> },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    VerifyOtp {
        #[arg(long)]
        email: String,
        #[arg(long)]
        otp: String,
    },
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        otp: String,
        #[arg(long)]
        new_password: String,
    },
    Logout,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match &args.env_file {
        Some(path) => {
            if let Err(e) = dotenvy::from_filename(path) {
                eprintln!("Failed to load {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    }

    env_logger::init();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match ApiClient::new(&config, Arc::new(KeychainPersistence::default())) {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to create API client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = match request_options(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match run(&client, args.command, options).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    print_result(&result)
}

async fn run(client: &ApiClient, command: Command, options: RequestOptions) -> Result<ApiResult<Value>, String> {
    let result: ApiResult<Value> = match command {
        Command::Get { path } => client.get(&path, options).await,
        Command::Delete { path } => client.delete(&path, options).await,
        Command::Post { path, body } => client.post(&path, &parse_body(body)?, options).await,
        Command::Put { path, body } => client.put(&path, &parse_body(body)?, options).await,
        Command::Patch { path, body } => client.patch(&path, &parse_body(body)?, options).await,
        Command::Login { email, password } => {
            let result = client.login(&LoginRequest { email, password }).await;
            erase(result)
        }
        Command::Register {
            name,
            username,
            email,
            password,
        } => {
            let request = RegisterRequest {
                name,
                username,
                email,
                confirm_password: password.clone(),
                password,
            };
            client.register(&request).await
        }
        Command::VerifyOtp { email, otp } => client.verify_otp(&VerifyOtpRequest { email, otp }).await,
        Command::ForgotPassword { email } => client.forgot_password(&ForgotPasswordRequest { email }).await,
        Command::ResetPassword {
            email,
            otp,
            new_password,
        } => {
            let request = ResetPasswordRequest {
                email,
                otp,
                confirm_password: new_password.clone(),
                new_password,
            };
            client.reset_password(&request).await
        }
        Command::Logout => client.logout().await,
    };
    Ok(result)
}

fn request_options(args: &Args) -> Result<RequestOptions, String> {
    let mut options = RequestOptions::default();
    for header in &args.headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| format!("Invalid header '{}', expected `Name: value`", header))?;
        options = options.header(name.trim(), value.trim());
    }
    for param in &args.params {
        let (key, value) = param
            .split_once('=')
            .ok_or_else(|| format!("Invalid param '{}', expected `key=value`", param))?;
        options = options.param(key, value);
    }
    if let Some(secs) = args.timeout {
        options = options.timeout(std::time::Duration::from_secs(secs));
    }
    Ok(options)
}

fn parse_body(body: Option<String>) -> Result<Value, String> {
    match body {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| format!("Body is not valid JSON: {}", e)),
        None => Ok(Value::Object(Default::default())),
    }
}

/// Login data is a typed token payload; the token itself is never printed.
fn erase<T>(result: ApiResult<T>) -> ApiResult<Value> {
    ApiResult {
        success: result.success,
        message: result.message,
        data: result.data.map(|_| Value::Null),
        meta: result.meta,
        status_code: result.status_code,
    }
}

fn print_result<T: Serialize>(result: &ApiResult<T>) -> ExitCode {
    match serde_json::to_string_pretty(result) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => log::error!("Failed to render result: {}", e),
    }
    if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
