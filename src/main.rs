use anyhow::Context;
use orioz_kernel::settings::Settings;
use orioz_kernel::Report;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load Orioz settings")?;
    orioz_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.name,
        "orioz-seed bootstrap starting"
    );

    let mut report = Report::new(&settings.database.name);
    let result = bootstrap(&settings, &mut report).await;

    // Completed steps are printed even when a later one failed.
    print!("{report}");

    if let Err(err) = &result {
        tracing::error!(error = ?err, "orioz-seed bootstrap failed");
    }
    result
}

async fn bootstrap(settings: &Settings, report: &mut Report) -> anyhow::Result<()> {
    let store = orioz_seed::connect(settings).await?;
    orioz_seed::run_into(settings, &store, report).await
}
