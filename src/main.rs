use anyhow::Context;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        store = ?settings.store,
        "shelf-app bootstrap starting"
    );

    let store = shelf_store::open(&settings.store).context("failed to configure store")?;

    let mut registry = ModuleRegistry::new();
    shelf_app::modules::register_all(&mut registry, &settings, store);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!("shelf-app bootstrap complete");

    let served = shelf_http::start_server(&registry, &settings).await;
    let stopped = registry.stop_all().await;

    served?;
    stopped
}
