use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryApplicationStore, LoggingNotifier};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use job_intake::applications::{
    ApplicantNotifier, ApplicationIntakeService, ApplicationStore, SmtpNotifier,
    SqlApplicationStore,
};
use job_intake::config::AppConfig;
use job_intake::error::AppError;
use job_intake::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if args.dry_run {
        warn!("dry run: applications are kept in memory and no email is sent");
        serve(
            &config,
            InMemoryApplicationStore::default(),
            LoggingNotifier,
        )
        .await
    } else {
        info!(
            backend = config.database.backend(),
            smtp_server = %config.mail.server,
            smtp_port = config.mail.port,
            smtp_tls = ?config.mail.tls,
            "using persistent store and SMTP relay"
        );
        serve(
            &config,
            SqlApplicationStore::new(&config.database),
            SmtpNotifier::new(&config.mail),
        )
        .await
    }
}

async fn serve<S, N>(config: &AppConfig, store: S, notifier: N) -> Result<(), AppError>
where
    S: ApplicationStore + 'static,
    N: ApplicantNotifier + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let application_service = Arc::new(ApplicationIntakeService::new(
        Arc::new(store),
        Arc::new(notifier),
    ));

    let app = with_application_routes(application_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "job application intake ready");

    axum::serve(listener, app).await?;
    Ok(())
}
