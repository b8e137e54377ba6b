use std::process::ExitCode;

use anyhow::{Error, Result};
use clap::Parser;
use notify_writer::{
    clients::{database::DatabaseClient, rbmq::RabbitMqClient},
    config::Config,
    errors::WriterError,
    pipeline::{PublishReceipt, PublishRequest, RoutingMode, run_pipeline},
    recorder::{AuditRecorder, NoopRecorder, Recorder},
    telemetry::init_tracing,
};
use tracing::error;

#[derive(Debug, Parser)]
#[command(about = "Publish one message to the notify exchange", long_about = None)]
struct Cli {
    /// Routing key the message is published under, e.g. sys1.message
    routing_key: String,
    /// Message body carried in the envelope
    message_body: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_format);

    match run(&config, cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            let stage = e
                .downcast_ref::<WriterError>()
                .map(WriterError::stage)
                .unwrap_or("startup");
            error!(stage, error = %e, "Writer failed");
            eprintln!("{}: {}", stage, e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config, cli: Cli) -> Result<PublishReceipt, Error> {
    let recorder: Box<dyn Recorder> = match &config.database_url {
        Some(database_url) if config.audit_enabled => Box::new(AuditRecorder::new(
            DatabaseClient::new(database_url, &config.audit_table)?,
            config.audit_timeout(),
        )),
        _ => Box::new(NoopRecorder),
    };

    let mode = if config.strict_routing {
        RoutingMode::Strict
    } else {
        RoutingMode::Lenient
    };

    let request = PublishRequest {
        routing_key: cli.routing_key,
        message_body: cli.message_body,
        system: config.system_name.clone(),
        employee_id: config.employee_id,
    };

    let broker = RabbitMqClient::connect(&config.rabbitmq_url).await?;
    let result = run_pipeline(
        &broker,
        recorder.as_ref(),
        &config.topology(),
        &request,
        mode,
        &mut std::io::stdout(),
    )
    .await;
    broker.close().await;

    let receipt = result?;

    if recorder.is_enabled() {
        println!("Message sent and recorded successfully!");
    } else {
        println!("Message sent successfully!");
    }

    Ok(receipt)
}
