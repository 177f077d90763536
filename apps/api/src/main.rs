use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use call_webhook_cell::{ReconcilerService, WebhookState};
use notification_cell::{
    DisabledChannel, TextChannel, VoiceAgentClient, VoiceChannel, WhatsAppClient,
};
use reminder_cell::handlers::ReminderCellState;
use reminder_cell::{
    DeliveryExecutor, InMemoryReminderQueue, RedisReminderQueue, ReminderQueue, ReminderScheduler,
    ReminderWorkerService, SchedulerConfig, WorkerConfig,
};
use shared_config::AppConfig;
use shared_store::{AppointmentStore, InMemoryStore, RestStore};

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic reminders API server");

    // Load configuration
    let config = AppConfig::from_env();

    // The dependency graph is built once here and handed to the
    // scheduler, workers and reconciler explicitly.
    let store: Arc<dyn AppointmentStore> = if config.is_store_configured() {
        Arc::new(RestStore::new(&config))
    } else {
        warn!("Appointment store not configured, using in-memory store");
        Arc::new(InMemoryStore::new())
    };

    let queue: Arc<dyn ReminderQueue> = match &config.redis_url {
        Some(url) => match RedisReminderQueue::new(url).await {
            Ok(queue) => Arc::new(queue),
            Err(e) => {
                warn!("Redis queue unavailable ({}), using in-memory queue", e);
                Arc::new(InMemoryReminderQueue::new())
            }
        },
        None => {
            warn!("REDIS_URL not set, using in-memory queue; jobs are not durable");
            Arc::new(InMemoryReminderQueue::new())
        }
    };

    let text_channel: Arc<dyn TextChannel> = match WhatsAppClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!("WhatsApp channel disabled: {}", e);
            Arc::new(DisabledChannel("whatsapp"))
        }
    };

    let voice_channel: Arc<dyn VoiceChannel> = match VoiceAgentClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!("Voice-agent channel disabled: {}", e);
            Arc::new(DisabledChannel("voice_agent"))
        }
    };

    let executor = Arc::new(DeliveryExecutor::new(
        Arc::clone(&store),
        text_channel,
        voice_channel,
    ));

    let scheduler = Arc::new(ReminderScheduler::new(
        Arc::clone(&store),
        Arc::clone(&queue),
        SchedulerConfig::default(),
    ));

    let worker = Arc::new(ReminderWorkerService::new(
        WorkerConfig::default(),
        Arc::clone(&queue),
        executor,
    ));

    // Background tasks: periodic scheduling and the worker pool.
    let scheduler_task = Arc::clone(&scheduler);
    tokio::spawn(async move {
        scheduler_task.run().await;
    });

    let worker_task = Arc::clone(&worker);
    tokio::spawn(async move {
        if let Err(e) = worker_task.start().await {
            error!("Worker pool stopped: {}", e);
        }
    });

    let reminder_state = Arc::new(ReminderCellState {
        queue: Arc::clone(&queue),
        scheduler: Arc::clone(&scheduler),
    });

    let webhook_state = Arc::new(WebhookState {
        reconciler: ReconcilerService::new(Arc::clone(&store)),
        webhook_secret: config.webhook_secret.clone(),
    });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(reminder_state, webhook_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
