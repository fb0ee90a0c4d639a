use std::net::SocketAddr;

use clap::Parser;
use clubdesk::cli::{Args, build_config, handle_create_admin, init_logging, load_jwt_secret, open_database};
use clubdesk::{cleanup, create_app};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    if args.create_admin {
        let Some(email) = args.admin_email.as_deref() else {
            error!("--create-admin requires --admin-email");
            std::process::exit(1);
        };
        handle_create_admin(&db, email).await;
    }

    let config = build_config(db, jwt_secret, args.client_ip_header);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap();

    cleanup::spawn_cleanup_scheduler(config.rate_limits.clone());

    let app = create_app(&config);

    info!(address = %local_addr, "Listening");

    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    if let Err(e) = axum::serve(listener, make_service).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
