//! Reviewer resolution.
//!
//! Expands a list of reviewer specifiers (exact team names, partial name or
//! username matches, and integer counts meaning "N additional random
//! reviewers") into a concrete reviewer list. Deterministic matches come
//! first; random reviewers are drawn without replacement from the users not
//! already matched.

use rand::Rng;

use crate::error::Result;
use crate::teams::{TeamRoster, User};

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Source of uniform random indices, injectable so the draw is reproducible
/// in tests.
pub trait IndexSampler {
    /// A uniform index in `[0, upper)`. Callers guarantee `upper >= 1`.
    fn pick(&mut self, upper: usize) -> usize;
}

pub struct ThreadRngSampler;

impl IndexSampler for ThreadRngSampler {
    fn pick(&mut self, upper: usize) -> usize {
        rand::thread_rng().gen_range(0..upper)
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolves reviewer specifiers against the team roster. The roster is
/// fetched at most once and cached for the lifetime of the resolver;
/// construct a fresh resolver per test for isolation.
pub struct ReviewerResolver {
    teams_url: String,
    roster: Option<TeamRoster>,
}

impl ReviewerResolver {
    pub fn new(teams_url: impl Into<String>) -> Self {
        Self {
            teams_url: teams_url.into(),
            roster: None,
        }
    }

    /// Build a resolver with a pre-loaded roster; no network access happens.
    pub fn with_roster(roster: TeamRoster) -> Self {
        Self {
            teams_url: String::new(),
            roster: Some(roster),
        }
    }

    fn roster(&mut self) -> Result<&TeamRoster> {
        if self.roster.is_none() {
            self.roster = Some(TeamRoster::fetch(&self.teams_url)?);
        }
        Ok(self.roster.as_ref().expect("roster populated above"))
    }

    /// Resolve `specifiers` into users. `exclude` removes a username (usually
    /// the author) from both deterministic matches and the random pool.
    pub fn resolve(
        &mut self,
        specifiers: &[String],
        exclude: Option<&str>,
        sampler: &mut dyn IndexSampler,
    ) -> Result<Vec<User>> {
        let roster = self.roster()?;

        let expanded = expand_teams(roster, specifiers);
        let all = roster.all();

        let not_excluded =
            |user: &&User| exclude.map_or(true, |excluded| user.username != excluded);

        let matched: Vec<&User> = all
            .iter()
            .copied()
            .filter(|user| matches_any(user, &expanded))
            .filter(not_excluded)
            .collect();

        // Numeric specifiers are counts, summed over the raw (unexpanded)
        // specifier list.
        let random_count: usize = specifiers
            .iter()
            .map(|specifier| specifier.parse::<usize>().unwrap_or(0))
            .sum();

        let mut pool: Vec<&User> = all
            .iter()
            .copied()
            .filter(|user| !matched.iter().any(|m| m.uuid == user.uuid))
            .filter(not_excluded)
            .collect();

        let mut selected: Vec<User> = matched.into_iter().cloned().collect();
        for _ in 0..random_count {
            if pool.is_empty() {
                break;
            }
            let index = sampler.pick(pool.len());
            selected.push(pool.remove(index).clone());
        }
        Ok(selected)
    }

    /// Like [`ReviewerResolver::resolve`], projected to uuids.
    pub fn resolve_ids(
        &mut self,
        specifiers: &[String],
        exclude: Option<&str>,
        sampler: &mut dyn IndexSampler,
    ) -> Result<Vec<String>> {
        Ok(self
            .resolve(specifiers, exclude, sampler)?
            .into_iter()
            .map(|user| user.uuid)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Specifier handling
// ---------------------------------------------------------------------------

/// Replace any specifier exactly matching a team name with that team's
/// member usernames, preserving the relative order of other specifiers.
/// Duplicate specifiers collapse first.
fn expand_teams(roster: &TeamRoster, specifiers: &[String]) -> Vec<String> {
    let mut unique: Vec<&String> = Vec::new();
    for specifier in specifiers {
        if !unique.contains(&specifier) {
            unique.push(specifier);
        }
    }

    let mut expanded = Vec::new();
    for specifier in unique {
        match roster.team(specifier) {
            Some(members) => {
                expanded.extend(members.iter().map(|member| member.username.clone()));
            }
            None => expanded.push(specifier.clone()),
        }
    }
    expanded
}

/// A purely numeric specifier is a count, never a name match.
fn is_numeric(specifier: &str) -> bool {
    !specifier.is_empty() && specifier.chars().all(|c| c.is_ascii_digit())
}

fn matches_any(user: &User, specifiers: &[String]) -> bool {
    let display_name = user.display_name.to_lowercase();
    let username = user.username.to_lowercase();
    specifiers
        .iter()
        .filter(|specifier| !is_numeric(specifier))
        .map(|specifier| specifier.to_lowercase())
        .any(|specifier| display_name.contains(&specifier) || username.contains(&specifier))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
