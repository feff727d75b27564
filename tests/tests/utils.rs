use mock_service::MockConfig;
use std::sync::OnceLock;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

/// Install logging once per test binary, then start a fresh mock precheck service and return its
/// base URL.
#[allow(unused)]
pub async fn init(config: MockConfig) -> anyhow::Result<String> {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        FmtSubscriber::builder()
            .with_env_filter("flashload=debug,mock_service=debug")
            .with_test_writer()
            .init();
    });

    let addr = mock_service::spawn(config).await?;
    Ok(format!("http://{addr}"))
}
