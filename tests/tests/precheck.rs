mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;
    use flashload::prelude::*;
    use flashload_core::{PatternConfig, Stage, ALREADY_PURCHASED_MARKER};
    use mock_service::MockConfig;
    use std::num::NonZeroU32;
    use std::time::Duration;

    fn already_purchased() -> Predicate {
        Predicate::All(vec![
            Predicate::StatusIs(409),
            Predicate::BodyContains(ALREADY_PURCHASED_MARKER.to_string()),
        ])
    }

    #[tokio::test]
    async fn single_identity_is_accepted_once() -> anyhow::Result<()> {
        let base_url = init(MockConfig::default()).await?;

        let config = RunConfig::new("single-identity", &base_url)
            .constant(5, Duration::from_secs(1))
            .pattern(PatternConfig::new(vec![ProfileConfig::fixed("attacker_1")]))
            .check("precheck accepted", Predicate::StatusIs(200))
            .check("already purchased", already_purchased())
            .pacing(Pacing::fixed(Duration::from_millis(20)));

        let report = LoadTest::new(config)?.await;

        assert!(report.iterations > 5);
        assert_eq!(report.transport_failures, 0);
        assert_eq!(report.statuses.get(&200), Some(&1));
        assert_eq!(report.statuses.get(&409), Some(&(report.iterations - 1)));
        assert_eq!(report.checks["precheck accepted"].passes, 1);
        assert_eq!(
            report.checks["already purchased"].passes,
            report.iterations - 1
        );
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_and_forced_failure_run_passes() -> anyhow::Result<()> {
        let base_url = init(MockConfig::default()).await?;

        let config = RunConfig::new("duplicated-sell", &base_url)
            .stage(Duration::from_millis(500), 5)
            .stage(Duration::from_secs(1), 10)
            .stage(Duration::from_millis(500), 0)
            .profile(ProfileConfig::duplicate(7))
            .profile(ProfileConfig::forced_failure(50, FailureScope::Iteration))
            .check("is status 200 or 409 or 429", Predicate::StatusIn(vec![200, 409, 429]))
            .check("already purchased", already_purchased())
            .threshold(ThresholdSpec::new("http_req_duration", "p(95)<300"))
            .threshold(ThresholdSpec::new("http_req_failed", "rate<0.15").tolerate(&[409, 429]))
            .pacing(Pacing::fixed(Duration::from_millis(50)))
            .seed(1);

        let report = LoadTest::new(config)?.await;
        println!("{report}");

        assert_eq!(
            report.timeline.iter().map(|t| t.target).collect::<Vec<_>>(),
            vec![5, 10, 0]
        );
        assert_eq!(report.peak_vus, 10);
        // Iteration 0 of every virtual user carries the sentinel.
        assert!(report.statuses[&500] >= 10);
        assert!(report.checks["already purchased"].passes > 0);
        assert!(report.verdict.passed, "{:#?}", report.verdict);
        Ok(())
    }

    #[tokio::test]
    async fn spoofed_header_is_detected() -> anyhow::Result<()> {
        let run = |base_url: String| async move {
            let mut config = Preset::AttackFakeHeader
                .config(&base_url)
                .threshold(ThresholdSpec::new("checks", "rate==1"))
                .pacing(Pacing::fixed(Duration::from_millis(20)));
            config.stages = vec![Stage::new(Duration::from_millis(500), 5)];
            anyhow::Ok(LoadTest::new(config)?.await)
        };

        let careful = run(init(MockConfig::default()).await?).await?;
        assert_eq!(careful.statuses.keys().collect::<Vec<_>>(), vec![&400]);
        assert!(careful.verdict.passed);

        let trusting = run(
            init(MockConfig {
                trust_client_header: true,
                ..MockConfig::default()
            })
            .await?,
        )
        .await?;
        assert!(trusting.statuses[&200] > 0);
        assert!(trusting.checks["spoofed header not trusted"].fails > 0);
        assert!(!trusting.verdict.passed);
        assert_eq!(trusting.verdict.exit_code(), 99);
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_target_fails_the_run() -> anyhow::Result<()> {
        init(MockConfig::default()).await?;
        let addr = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?;

        let config = RunConfig::new("down", &format!("http://{addr}"))
            .constant(3, Duration::from_millis(500))
            .check("precheck accepted", Predicate::StatusIs(200))
            .threshold(ThresholdSpec::new("http_req_failed", "rate<0.01"))
            .pacing(Pacing::fixed(Duration::from_millis(50)));

        let report = LoadTest::new(config)?.await;
        assert!(report.iterations > 0);
        assert_eq!(report.transport_failures, report.iterations);
        assert_eq!(report.checks["precheck accepted"].passes, 0);
        assert!(!report.verdict.passed);
        Ok(())
    }

    #[tokio::test]
    async fn request_rate_cap_holds() -> anyhow::Result<()> {
        let base_url = init(MockConfig::default()).await?;

        let config = RunConfig::new("capped", &base_url)
            .constant(10, Duration::from_secs(2))
            .max_rps(NonZeroU32::new(20).unwrap());

        let report = LoadTest::new(config)?.await;
        let rate = report.iterations as f64 / report.elapsed.as_secs_f64();
        assert!(report.iterations >= 20, "{} iterations", report.iterations);
        assert!(rate <= 23., "{rate} rps");
        Ok(())
    }
}
