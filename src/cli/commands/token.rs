use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::types::Role;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "User id placed in the token subject")]
    pub user: Uuid,

    #[arg(long, help = "Role, e.g. ADMIN_ROLE or PROFESOR_ROLE")]
    pub role: Role,

    #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
    pub hours: Option<u64>,
}

pub async fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let hours = args.hours.unwrap_or(config().security.jwt_expiry_hours);
    let claims = Claims::with_expiry(args.user, args.role, hours);
    let token = generate_jwt(&claims)?;

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "Token issued",
            Some(json!({ "token": token, "expires_at": claims.exp })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
