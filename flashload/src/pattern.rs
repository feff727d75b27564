mod forced_failure;
mod identity;
mod spoof;

pub(crate) use forced_failure::ForcedFailureInjection;
pub(crate) use identity::{DuplicateInjection, FixedSingleIdentity, UniformRandomIdentity};
pub(crate) use spoof::SpoofedIdentityHeaders;

use crate::context::IterationContext;
use crate::request::Request;
use flashload_core::{BodyShape, ConfigError, IdentityFormat, PatternConfig, ProfileConfig};
use reqwest::Method;
use serde_json::{Map, Value};

/// One composable request-pattern layer.
pub trait Pattern: Send + Sync {
    fn apply(&self, ctx: &IterationContext, draft: &mut RequestDraft);
}

/// Mutable request state passed through the pattern layers of one iteration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestDraft {
    pub identity: String,
    /// Whether the identity is written into the body.
    pub body_identity: bool,
    headers: Vec<(String, String)>,
}

impl RequestDraft {
    pub fn new(identity: String) -> Self {
        Self {
            identity,
            body_identity: true,
            headers: vec![],
        }
    }

    /// Set a header, replacing any earlier value of the same name.
    pub fn set_header(&mut self, name: &str, value: String) {
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value,
            None => self.headers.push((name.to_string(), value)),
        }
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

/// All configured pattern layers, applied in precedence order.
pub struct CompositePattern {
    layers: Vec<Box<dyn Pattern>>,
    body: BodyShape,
    identity: IdentityFormat,
}

impl CompositePattern {
    pub fn new(config: &PatternConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut profiles: Vec<&ProfileConfig> = config.profiles.iter().collect();
        // NOTE: validation leaves at most one layer per precedence.
        profiles.sort_by_key(|p| p.kind().precedence());

        let layers = profiles
            .into_iter()
            .map(|profile| layer(profile, &config.identity))
            .collect();

        Ok(Self {
            layers,
            body: config.body.clone(),
            identity: config.identity.clone(),
        })
    }

    /// Derive the request of one iteration. Pure: the same context always yields the same request.
    pub fn build(&self, ctx: &IterationContext, url: &str) -> Request {
        let mut draft = RequestDraft::new(self.identity.unique(ctx.vu, ctx.iteration));
        for layer in &self.layers {
            layer.apply(ctx, &mut draft);
        }

        let mut body = Map::new();
        if draft.body_identity {
            body.insert(
                self.body.user_field.clone(),
                Value::String(draft.identity.clone()),
            );
        }
        body.insert(
            self.body.product_field.clone(),
            Value::String(self.body.product.clone()),
        );

        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        headers.extend(draft.headers);

        Request::new(
            Method::POST,
            url,
            Value::Object(body).to_string().into_bytes(),
            headers,
        )
    }
}

fn layer(profile: &ProfileConfig, format: &IdentityFormat) -> Box<dyn Pattern> {
    match profile.clone() {
        ProfileConfig::UniformRandomIdentity {
            prefix,
            min,
            max,
            bot_user_agent,
        } => Box::new(UniformRandomIdentity::new(prefix, min, max, bot_user_agent)),
        ProfileConfig::FixedSingleIdentity { identity } => {
            Box::new(FixedSingleIdentity::new(identity))
        }
        ProfileConfig::DuplicateInjection { period } => {
            Box::new(DuplicateInjection::new(period, format.clone()))
        }
        ProfileConfig::ForcedFailureInjection {
            period,
            sentinel,
            scope,
        } => Box::new(ForcedFailureInjection::new(period, sentinel, scope)),
        ProfileConfig::SpoofedIdentityHeaders {
            header,
            prefix,
            max,
            mode,
            user_agent,
            strip_body_identity,
        } => Box::new(SpoofedIdentityHeaders {
            header,
            prefix,
            max,
            mode,
            user_agent,
            strip_body_identity,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashload_core::{
        FailureScope, ProfileConfig, SpoofMode, FORCED_FAILURE_SENTINEL, SPOOF_HEADER,
    };

    const URL: &str = "http://localhost:8080/flashsale/precheck";

    fn pattern(profiles: Vec<ProfileConfig>) -> CompositePattern {
        CompositePattern::new(&PatternConfig::new(profiles)).unwrap()
    }

    fn identity(request: &Request) -> Option<String> {
        request.json()?["user_id"].as_str().map(str::to_string)
    }

    #[test]
    fn default_identity_is_unique_per_iteration() {
        let p = pattern(vec![]);
        let request = p.build(&IterationContext::new(4, 9, 1), URL);

        assert_eq!(identity(&request).unwrap(), "user-4-9");
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(*request.method(), Method::POST);
        assert_eq!(request.url(), URL);
        assert_eq!(request.json().unwrap()["product_id"], "1001");
    }

    #[test]
    fn duplicate_injection_period() {
        let p = pattern(vec![ProfileConfig::duplicate(7)]);
        for n in [1u64, 3, 10] {
            // Start at an arbitrary offset: any 7N consecutive iterations hold N duplicates.
            let fixed = (5..5 + 7 * n)
                .map(|i| p.build(&IterationContext::new(2, i, 1), URL))
                .filter(|r| identity(r).unwrap() == "user-2-fixed")
                .count();
            assert_eq!(fixed as u64, n);
        }
        assert_eq!(
            identity(&p.build(&IterationContext::new(2, 8, 1), URL)).unwrap(),
            "user-2-8"
        );
    }

    #[test]
    fn forced_failure_overrides_duplicate() {
        // Listed in reverse order on purpose: precedence, not declaration order, decides.
        let p = pattern(vec![
            ProfileConfig::forced_failure(50, FailureScope::Iteration),
            ProfileConfig::duplicate(7),
        ]);

        let n = 4;
        let identities: Vec<String> = (0..50 * n)
            .map(|i| identity(&p.build(&IterationContext::new(1, i, 1), URL)).unwrap())
            .collect();

        let sentinels = identities
            .iter()
            .filter(|id| *id == FORCED_FAILURE_SENTINEL)
            .count();
        assert_eq!(sentinels as u64, n);

        // Iterations 0 and 350 satisfy both periods; the sentinel wins.
        assert_eq!(identities[0], FORCED_FAILURE_SENTINEL);
        assert_eq!(
            identity(&p.build(&IterationContext::new(1, 350, 1), URL)).unwrap(),
            FORCED_FAILURE_SENTINEL
        );
        assert_eq!(identities[7], "user-1-fixed");
        assert_eq!(identities[8], "user-1-8");
    }

    #[test]
    fn forced_failure_by_virtual_user() {
        let p = pattern(vec![ProfileConfig::forced_failure(
            10,
            FailureScope::VirtualUser,
        )]);
        for iteration in 0..20 {
            assert_eq!(
                identity(&p.build(&IterationContext::new(20, iteration, 1), URL)).unwrap(),
                FORCED_FAILURE_SENTINEL
            );
            assert_ne!(
                identity(&p.build(&IterationContext::new(21, iteration, 1), URL)).unwrap(),
                FORCED_FAILURE_SENTINEL
            );
        }
    }

    #[test]
    fn fixed_identity_everywhere() {
        let p = pattern(vec![ProfileConfig::fixed("attacker_1")]);
        for vu in 1..20 {
            for iteration in 0..20 {
                let r = p.build(&IterationContext::new(vu, iteration, 7), URL);
                assert_eq!(identity(&r).unwrap(), "attacker_1");
            }
        }
    }

    #[test]
    fn uniform_random_is_deterministic_and_in_range() {
        let p = pattern(vec![ProfileConfig::UniformRandomIdentity {
            prefix: "bot_".to_string(),
            min: 100,
            max: 200,
            bot_user_agent: true,
        }]);

        let mut distinct = std::collections::HashSet::new();
        for iteration in 0..200 {
            let ctx = IterationContext::new(1, iteration, 99);
            let a = p.build(&ctx, URL);
            assert_eq!(a, p.build(&ctx, URL));

            let id = identity(&a).unwrap();
            let n: u64 = id.strip_prefix("bot_").unwrap().parse().unwrap();
            assert!((100..200).contains(&n));
            assert_eq!(a.header("User-Agent").unwrap(), format!("Bot-{n}"));
            distinct.insert(n);
        }
        assert!(distinct.len() > 50);
    }

    #[test]
    fn spoofed_header_is_independent_of_body() {
        let p = pattern(vec![
            ProfileConfig::duplicate(7),
            ProfileConfig::spoofed(SpoofMode::Independent),
        ]);
        for iteration in 0..50 {
            let r = p.build(&IterationContext::new(3, iteration, 5), URL);
            let claimed = r.header(SPOOF_HEADER).unwrap();
            assert!(claimed.starts_with("spoof_"));
            assert_ne!(claimed, identity(&r).unwrap());
            assert_eq!(r.header("Content-Type"), Some("application/json"));
        }
    }

    #[test]
    fn spoofed_header_mirrors_final_identity() {
        let p = pattern(vec![
            ProfileConfig::spoofed(SpoofMode::Mirror),
            ProfileConfig::forced_failure(50, FailureScope::Iteration),
        ]);
        let r = p.build(&IterationContext::new(3, 50, 5), URL);
        assert_eq!(r.header(SPOOF_HEADER), Some(FORCED_FAILURE_SENTINEL));
        assert_eq!(identity(&r).unwrap(), FORCED_FAILURE_SENTINEL);
    }

    #[test]
    fn spoof_can_strip_body_identity() {
        let p = pattern(vec![ProfileConfig::SpoofedIdentityHeaders {
            header: SPOOF_HEADER.to_string(),
            prefix: "spoof_".to_string(),
            max: 999_999,
            mode: SpoofMode::Independent,
            user_agent: Some("FakeBrowser/9.9".to_string()),
            strip_body_identity: true,
        }]);
        let r = p.build(&IterationContext::new(1, 1, 1), URL);
        let body = r.json().unwrap();
        assert!(body.get("user_id").is_none());
        assert_eq!(body["product_id"], "1001");
        assert_eq!(r.header("user-agent"), Some("FakeBrowser/9.9"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let res = CompositePattern::new(&PatternConfig::new(vec![
            ProfileConfig::fixed("a"),
            ProfileConfig::uniform_random("b", 0, 10),
        ]));
        assert!(matches!(res, Err(ConfigError::ConflictingIdentity(..))));
    }
}
