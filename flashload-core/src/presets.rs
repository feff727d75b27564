//! Ready-made runs covering the scenarios the precheck endpoint is routinely validated against.
use crate::{
    BodyShape, ConfigError, FailureScope, IdentityFormat, Pacing, PatternConfig, Predicate,
    ProfileConfig, RunConfig, SpoofMode, ThresholdSpec, ALREADY_PURCHASED_MARKER, SOLD_OUT_MARKER,
};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Preset {
    /// 10 VUs for 30s, one fresh identity per iteration.
    Basic,
    /// 50 VUs for 10s, random numeric identities.
    Precheck,
    /// Staged ramp with every tenth VU forcing failures; strict error budget.
    LoadTest,
    /// Staged ramp of random buyers which also claim their identity by header.
    Stress,
    /// Staged ramp to 300 VUs with duplicate and forced-failure injection.
    MultiWorker,
    /// Staged ramp with duplicate and forced-failure injection; 409/429 tolerated.
    DuplicatedSellForceFail,
    /// 200 VUs sharing one identity.
    AttackSingleUser,
    /// 300 VUs of random bots.
    AttackMulti,
    /// 150 VUs claiming an identity only through a spoofed header.
    AttackFakeHeader,
}

impl Preset {
    pub const ALL: [Preset; 9] = [
        Preset::Basic,
        Preset::Precheck,
        Preset::LoadTest,
        Preset::Stress,
        Preset::MultiWorker,
        Preset::DuplicatedSellForceFail,
        Preset::AttackSingleUser,
        Preset::AttackMulti,
        Preset::AttackFakeHeader,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Basic => "basic",
            Preset::Precheck => "precheck",
            Preset::LoadTest => "load-test",
            Preset::Stress => "stress",
            Preset::MultiWorker => "multi-worker",
            Preset::DuplicatedSellForceFail => "duplicated-sell-force-fail",
            Preset::AttackSingleUser => "attack-single-user",
            Preset::AttackMulti => "attack-multi",
            Preset::AttackFakeHeader => "attack-fake-header",
        }
    }

    pub fn config(&self, base_url: &str) -> RunConfig {
        let run = RunConfig::new(self.name(), base_url);
        match self {
            Preset::Basic => run
                .constant(10, secs(30))
                .pattern(
                    PatternConfig::default()
                        .body(BodyShape::new("product", "p1"))
                        .identity(IdentityFormat::new("user_", "_")),
                )
                .pacing(Pacing::fixed(millis(200))),

            Preset::Precheck => run
                .constant(50, secs(10))
                .pattern(
                    PatternConfig::new(vec![ProfileConfig::uniform_random("", 0, 1_000_000)])
                        .body(BodyShape::new("product_id", "p1")),
                )
                .check("status is 200", Predicate::StatusIs(200))
                .pacing(Pacing::fixed(millis(100))),

            Preset::LoadTest => ramp(run, 50, 200)
                .profile(ProfileConfig::forced_failure(10, FailureScope::VirtualUser))
                .check("precheck accepted", Predicate::StatusIs(200))
                .threshold(ThresholdSpec::new("http_req_duration", "p(95)<300"))
                .threshold(ThresholdSpec::new("http_req_failed", "rate<0.01"))
                .pacing(Pacing::fixed(millis(100))),

            Preset::Stress => run
                .stage(secs(5), 200)
                .stage(secs(15), 200)
                .stage(secs(5), 0)
                .profile(ProfileConfig::uniform_random("user_", 0, 1_000_000))
                .profile(ProfileConfig::spoofed(SpoofMode::Mirror)),

            // 409/429 are expected here and counted as failures; the budget is loosened instead.
            Preset::MultiWorker => ramp(run, 100, 300)
                .profile(ProfileConfig::duplicate(7))
                .profile(ProfileConfig::forced_failure(50, FailureScope::Iteration))
                .check("accepted (200)", Predicate::StatusIs(200))
                .check("already purchased (409)", already_purchased())
                .check("out of stock (409)", sold_out())
                .check("rate limited (429)", Predicate::StatusIs(429))
                .threshold(ThresholdSpec::new("http_req_duration", "p(95)<300"))
                .threshold(ThresholdSpec::new("http_req_failed", "rate<0.1"))
                .pacing(Pacing::fixed(millis(50))),

            Preset::DuplicatedSellForceFail => ramp(run, 50, 200)
                .profile(ProfileConfig::duplicate(7))
                .profile(ProfileConfig::forced_failure(50, FailureScope::Iteration))
                .check(
                    "is status 200 or 409 or 429",
                    Predicate::StatusIn(vec![200, 409, 429]),
                )
                .check("precheck accepted", Predicate::StatusIs(200))
                .check("already purchased", already_purchased())
                .threshold(ThresholdSpec::new("http_req_duration", "p(95)<300"))
                .threshold(ThresholdSpec::new("http_req_failed", "rate<0.15").tolerate(&[409, 429]))
                .pacing(Pacing::jittered(millis(50), millis(50))),

            Preset::AttackSingleUser => run
                .constant(200, secs(30))
                .pattern(
                    PatternConfig::new(vec![ProfileConfig::fixed("attacker_1")])
                        .body(BodyShape::new("product", "p1")),
                )
                .check("precheck accepted", Predicate::StatusIs(200))
                .check("already purchased", already_purchased()),

            Preset::AttackMulti => run
                .constant(300, secs(30))
                .pattern(
                    PatternConfig::new(vec![ProfileConfig::UniformRandomIdentity {
                        prefix: "bot_".to_string(),
                        min: 0,
                        max: 2_000_000,
                        bot_user_agent: true,
                    }])
                    .body(BodyShape::new("product", "p1")),
                ),

            Preset::AttackFakeHeader => run
                .constant(150, secs(20))
                .profile(ProfileConfig::SpoofedIdentityHeaders {
                    header: crate::SPOOF_HEADER.to_string(),
                    prefix: "spoof_".to_string(),
                    max: 999_999,
                    mode: SpoofMode::Independent,
                    user_agent: Some("FakeBrowser/9.9".to_string()),
                    strip_body_identity: true,
                })
                .check(
                    "spoofed header not trusted",
                    Predicate::StatusIs(200).negate(),
                ),
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn ramp(run: RunConfig, warmup: usize, peak: usize) -> RunConfig {
    run.stage(secs(5), warmup)
        .stage(secs(20), peak)
        .stage(secs(10), 0)
}

fn already_purchased() -> Predicate {
    Predicate::All(vec![
        Predicate::StatusIs(409),
        Predicate::BodyContains(ALREADY_PURCHASED_MARKER.to_string()),
    ])
}

fn sold_out() -> Predicate {
    Predicate::All(vec![
        Predicate::StatusIs(409),
        Predicate::BodyContains(SOLD_OUT_MARKER.to_string()),
    ])
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_validates() {
        for preset in Preset::ALL {
            let config = preset.config("http://localhost:8080");
            config.validate().unwrap_or_else(|e| panic!("{preset}: {e}"));
            assert_eq!(config.name, preset.name());
        }
    }

    #[test]
    fn names_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>().unwrap(), preset);
        }
        assert!(matches!(
            "soak".parse::<Preset>(),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn duplicated_sell_tolerates_conflicts() {
        let config = Preset::DuplicatedSellForceFail.config("http://localhost:8080");
        let thresholds = config.compile_thresholds().unwrap();
        let failed = thresholds
            .iter()
            .find(|t| t.metric == crate::Metric::HttpReqFailed)
            .unwrap();
        assert_eq!(failed.classifier.tolerated(), &[409, 429]);
        assert_eq!(config.total_duration(), Duration::from_secs(35));
    }

    #[test]
    fn presets_survive_json() {
        for preset in Preset::ALL {
            let config = preset.config("http://localhost:8080");
            let json = config.to_json_pretty().unwrap();
            assert_eq!(RunConfig::from_json(&json).unwrap(), config);
        }
    }
}
