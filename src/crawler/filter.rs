//! Eligibility rules for discovered links
//!
//! A resolved link may enter the frontier only if it stays on the seed's
//! authority, is not the bare site root, does not mention `javascript`, is not
//! excluded and (when enabled) is allowed by robots.txt.

use crate::robots::{is_allowed, ParsedRobots};
use crate::url::{extract_authority, is_bare_root, ExclusionSet};
use crate::UrlError;
use url::Url;

/// Verdict for a single discovered link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eligibility {
    /// May be queued
    Eligible,
    /// Host or port differs from the seed
    OtherHost,
    /// Site root without a query; already covered by the seed
    BareRoot,
    /// Contains the substring `javascript`
    Script,
    /// Matches the exclusion set
    Excluded,
    /// Disallowed by robots.txt
    RobotsDenied,
}

impl Eligibility {
    /// Returns true if the link may be queued
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Decides which discovered links are crawled
#[derive(Debug, Clone)]
pub struct LinkFilter {
    authority: String,
    user_agent: String,
    robots: Option<ParsedRobots>,
}

impl LinkFilter {
    /// Creates a filter bound to the seed's authority
    pub fn new(seed: &Url, user_agent: impl Into<String>) -> Result<Self, UrlError> {
        let authority = extract_authority(seed).ok_or(UrlError::MissingDomain)?;
        Ok(Self {
            authority,
            user_agent: user_agent.into(),
            robots: None,
        })
    }

    /// Enables robots.txt filtering with the given policy
    pub fn with_robots(mut self, robots: ParsedRobots) -> Self {
        self.robots = Some(robots);
        self
    }

    /// Classifies a resolved link
    ///
    /// A link refused by robots.txt is added to `exclusions`, so later
    /// discoveries of it stop at the cheaper exclusion check.
    pub fn check(&self, url: &Url, exclusions: &mut ExclusionSet) -> Eligibility {
        if extract_authority(url).as_deref() != Some(self.authority.as_str()) {
            return Eligibility::OtherHost;
        }

        if is_bare_root(url) {
            return Eligibility::BareRoot;
        }

        let link = url.as_str();
        if link.contains("javascript") {
            return Eligibility::Script;
        }

        if exclusions.matches(link) {
            return Eligibility::Excluded;
        }

        if let Some(robots) = &self.robots {
            if !is_allowed(robots, link, &self.user_agent) {
                exclusions.insert(link);
                return Eligibility::RobotsDenied;
            }
        }

        Eligibility::Eligible
    }

    /// Returns true if the link may be queued
    pub fn is_eligible(&self, url: &Url, exclusions: &mut ExclusionSet) -> bool {
        self.check(url, exclusions).is_eligible()
    }
}
