use crate::{
    ConfigError, DEFAULT_DUPLICATE_PERIOD, DEFAULT_FIXED_IDENTITY, DEFAULT_FORCED_FAILURE_PERIOD,
    DEFAULT_PRODUCT, FORCED_FAILURE_SENTINEL, SPOOF_HEADER,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Which iterations the forced-failure sentinel is applied to.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureScope {
    /// `iteration % period == 0`
    #[default]
    Iteration,
    /// `vu % period == 0`, every iteration of the selected virtual users.
    VirtualUser,
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpoofMode {
    /// Header value unrelated to the body identity.
    #[default]
    Independent,
    /// Header value equal to the body identity.
    Mirror,
}

/// One layer of a request pattern. Layers compose; see [`ProfileKind::precedence`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProfileConfig {
    /// Distinct honest buyers: `prefix + n`, `n` uniform in `[min, max)`.
    UniformRandomIdentity {
        #[serde(default)]
        prefix: String,
        #[serde(default)]
        min: u64,
        max: u64,
        /// Send `User-Agent: Bot-<n>` alongside the identity.
        #[serde(default)]
        bot_user_agent: bool,
    },
    /// One attacker repeating the same purchase from every virtual user.
    FixedSingleIdentity {
        #[serde(default = "default_fixed_identity")]
        identity: String,
    },
    /// Every `period`-th iteration of a virtual user resubmits its fixed identity.
    DuplicateInjection {
        #[serde(default = "default_duplicate_period")]
        period: u64,
    },
    /// Replace the identity with the failure sentinel on selected iterations.
    ForcedFailureInjection {
        #[serde(default = "default_forced_failure_period")]
        period: u64,
        #[serde(default = "default_sentinel")]
        sentinel: String,
        #[serde(default)]
        scope: FailureScope,
    },
    /// Claim an identity through a client-supplied header.
    SpoofedIdentityHeaders {
        #[serde(default = "default_spoof_header")]
        header: String,
        #[serde(default = "default_spoof_prefix")]
        prefix: String,
        #[serde(default = "default_spoof_max")]
        max: u64,
        #[serde(default)]
        mode: SpoofMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_agent: Option<String>,
        #[serde(default)]
        strip_body_identity: bool,
    },
}

fn default_fixed_identity() -> String {
    DEFAULT_FIXED_IDENTITY.to_string()
}

fn default_duplicate_period() -> u64 {
    DEFAULT_DUPLICATE_PERIOD
}

fn default_forced_failure_period() -> u64 {
    DEFAULT_FORCED_FAILURE_PERIOD
}

fn default_sentinel() -> String {
    FORCED_FAILURE_SENTINEL.to_string()
}

fn default_spoof_header() -> String {
    SPOOF_HEADER.to_string()
}

fn default_spoof_prefix() -> String {
    "spoof_".to_string()
}

fn default_spoof_max() -> u64 {
    999_999
}

impl ProfileConfig {
    pub fn kind(&self) -> ProfileKind {
        match self {
            ProfileConfig::UniformRandomIdentity { .. } => ProfileKind::UniformRandomIdentity,
            ProfileConfig::FixedSingleIdentity { .. } => ProfileKind::FixedSingleIdentity,
            ProfileConfig::DuplicateInjection { .. } => ProfileKind::DuplicateInjection,
            ProfileConfig::ForcedFailureInjection { .. } => ProfileKind::ForcedFailureInjection,
            ProfileConfig::SpoofedIdentityHeaders { .. } => ProfileKind::SpoofedIdentityHeaders,
        }
    }

    pub fn uniform_random(prefix: &str, min: u64, max: u64) -> Self {
        ProfileConfig::UniformRandomIdentity {
            prefix: prefix.to_string(),
            min,
            max,
            bot_user_agent: false,
        }
    }

    pub fn fixed(identity: &str) -> Self {
        ProfileConfig::FixedSingleIdentity {
            identity: identity.to_string(),
        }
    }

    pub fn duplicate(period: u64) -> Self {
        ProfileConfig::DuplicateInjection { period }
    }

    pub fn forced_failure(period: u64, scope: FailureScope) -> Self {
        ProfileConfig::ForcedFailureInjection {
            period,
            sentinel: default_sentinel(),
            scope,
        }
    }

    pub fn spoofed(mode: SpoofMode) -> Self {
        ProfileConfig::SpoofedIdentityHeaders {
            header: default_spoof_header(),
            prefix: default_spoof_prefix(),
            max: default_spoof_max(),
            mode,
            user_agent: None,
            strip_body_identity: false,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.kind().name();
        match self {
            ProfileConfig::UniformRandomIdentity { min, max, .. } if min >= max => {
                Err(ConfigError::EmptyRange {
                    profile: name,
                    min: *min,
                    max: *max,
                })
            }
            ProfileConfig::FixedSingleIdentity { identity } if identity.is_empty() => {
                Err(ConfigError::EmptyField("identity"))
            }
            ProfileConfig::DuplicateInjection { period: 0 }
            | ProfileConfig::ForcedFailureInjection { period: 0, .. } => {
                Err(ConfigError::ZeroPeriod(name))
            }
            ProfileConfig::ForcedFailureInjection { sentinel, .. } if sentinel.is_empty() => {
                Err(ConfigError::EmptyField("sentinel"))
            }
            ProfileConfig::SpoofedIdentityHeaders { header, .. } if header.is_empty() => {
                Err(ConfigError::EmptyField("header"))
            }
            ProfileConfig::SpoofedIdentityHeaders {
                max: 0,
                mode: SpoofMode::Independent,
                ..
            } => Err(ConfigError::EmptyRange {
                profile: name,
                min: 0,
                max: 0,
            }),
            _ => Ok(()),
        }
    }
}

/// Identifier of a pattern profile, as used in configuration and on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    UniformRandomIdentity,
    FixedSingleIdentity,
    DuplicateInjection,
    ForcedFailureInjection,
    SpoofedIdentityHeaders,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 5] = [
        ProfileKind::UniformRandomIdentity,
        ProfileKind::FixedSingleIdentity,
        ProfileKind::DuplicateInjection,
        ProfileKind::ForcedFailureInjection,
        ProfileKind::SpoofedIdentityHeaders,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProfileKind::UniformRandomIdentity => "uniform-random-identity",
            ProfileKind::FixedSingleIdentity => "fixed-single-identity",
            ProfileKind::DuplicateInjection => "duplicate-injection",
            ProfileKind::ForcedFailureInjection => "forced-failure-injection",
            ProfileKind::SpoofedIdentityHeaders => "spoofed-identity-headers",
        }
    }

    /// Identity bases choose the body identity; at most one may be active.
    pub fn is_identity_base(&self) -> bool {
        matches!(
            self,
            ProfileKind::UniformRandomIdentity
                | ProfileKind::FixedSingleIdentity
                | ProfileKind::DuplicateInjection
        )
    }

    /// Application order of composed layers. The forced-failure sentinel must override any
    /// identity base, and header spoofing sees the final body identity.
    pub fn precedence(&self) -> u8 {
        match self {
            ProfileKind::UniformRandomIdentity
            | ProfileKind::FixedSingleIdentity
            | ProfileKind::DuplicateInjection => 0,
            ProfileKind::ForcedFailureInjection => 1,
            ProfileKind::SpoofedIdentityHeaders => 2,
        }
    }

    pub fn default_config(&self) -> ProfileConfig {
        match self {
            ProfileKind::UniformRandomIdentity => ProfileConfig::uniform_random("user_", 0, 1_000_000),
            ProfileKind::FixedSingleIdentity => ProfileConfig::fixed(DEFAULT_FIXED_IDENTITY),
            ProfileKind::DuplicateInjection => ProfileConfig::duplicate(DEFAULT_DUPLICATE_PERIOD),
            ProfileKind::ForcedFailureInjection => {
                ProfileConfig::forced_failure(DEFAULT_FORCED_FAILURE_PERIOD, FailureScope::Iteration)
            }
            ProfileKind::SpoofedIdentityHeaders => ProfileConfig::spoofed(SpoofMode::Independent),
        }
    }
}

impl FromStr for ProfileKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ProfileKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ConfigError::UnknownProfile(s.to_string()))
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// JSON field names and product value of the precheck body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyShape {
    #[serde(default = "default_user_field")]
    pub user_field: String,
    #[serde(default = "default_product_field")]
    pub product_field: String,
    #[serde(default = "default_product")]
    pub product: String,
}

fn default_user_field() -> String {
    "user_id".to_string()
}

fn default_product_field() -> String {
    "product_id".to_string()
}

fn default_product() -> String {
    DEFAULT_PRODUCT.to_string()
}

impl Default for BodyShape {
    fn default() -> Self {
        Self {
            user_field: default_user_field(),
            product_field: default_product_field(),
            product: default_product(),
        }
    }
}

impl BodyShape {
    pub fn new(product_field: &str, product: &str) -> Self {
        Self {
            product_field: product_field.to_string(),
            product: product.to_string(),
            ..Self::default()
        }
    }
}

/// Format of the per-iteration identity `<prefix><vu><separator><iteration>` used when no
/// identity base profile is configured, and of the duplicate identity `<prefix><vu><separator>fixed`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityFormat {
    #[serde(default = "default_identity_prefix")]
    pub prefix: String,
    #[serde(default = "default_identity_separator")]
    pub separator: String,
}

fn default_identity_prefix() -> String {
    "user-".to_string()
}

fn default_identity_separator() -> String {
    "-".to_string()
}

impl Default for IdentityFormat {
    fn default() -> Self {
        Self {
            prefix: default_identity_prefix(),
            separator: default_identity_separator(),
        }
    }
}

impl IdentityFormat {
    pub fn new(prefix: &str, separator: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            separator: separator.to_string(),
        }
    }

    pub fn unique(&self, vu: u64, iteration: u64) -> String {
        format!("{}{vu}{}{iteration}", self.prefix, self.separator)
    }

    pub fn fixed(&self, vu: u64) -> String {
        format!("{}{vu}{}fixed", self.prefix, self.separator)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,
    #[serde(default)]
    pub body: BodyShape,
    #[serde(default)]
    pub identity: IdentityFormat,
}

impl PatternConfig {
    pub fn new(profiles: Vec<ProfileConfig>) -> Self {
        Self {
            profiles,
            ..Self::default()
        }
    }

    pub fn body(mut self, body: BodyShape) -> Self {
        self.body = body;
        self
    }

    pub fn identity(mut self, identity: IdentityFormat) -> Self {
        self.identity = identity;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.body.user_field.is_empty() {
            return Err(ConfigError::EmptyField("user_field"));
        }
        if self.body.product_field.is_empty() {
            return Err(ConfigError::EmptyField("product_field"));
        }

        let mut seen = HashSet::new();
        let mut base: Option<ProfileKind> = None;
        for profile in &self.profiles {
            profile.validate()?;

            let kind = profile.kind();
            if !seen.insert(kind) {
                return Err(ConfigError::DuplicateProfile(kind.name()));
            }
            if kind.is_identity_base() {
                if let Some(existing) = base {
                    return Err(ConfigError::ConflictingIdentity(existing.name(), kind.name()));
                }
                base = Some(kind);
            }
        }
        Ok(())
    }
}
