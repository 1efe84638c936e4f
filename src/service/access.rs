//! Premium-access resolution.
//!
//! Everything here is a pure combination of already-fetched facts. The three
//! facts (authoritative source tag, subscription row, referral redemption)
//! are queried independently and may arrive in any order; callers build an
//! [`AccessFacts`] out of whatever they have and ask for a decision. No
//! definitive allow/deny is produced while any fact is still in flight.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{
    premiummodels::{PremiumSource, SubscriptionPlan},
    usermodel::UserRole,
};

/// Outcome of one independent fact fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FactState<T> {
    /// Query still in flight.
    Pending,
    /// Query completed.
    Ready(T),
    /// Query failed. Treated as "fact absent", never as access.
    Failed,
}

impl<T> FactState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, FactState::Pending)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            FactState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Display-oriented view of a subscription row. The expiry participates in
/// access decisions only when the authoritative tag is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionSnapshot {
    pub plan: SubscriptionPlan,
    pub expires_at: DateTime<Utc>,
    pub stripe_session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferralSnapshot {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// The three independently fetched facts feeding one decision.
#[derive(Debug, Clone)]
pub struct AccessFacts {
    pub premium_source: FactState<PremiumSource>,
    pub subscription: FactState<Option<SubscriptionSnapshot>>,
    pub referral: FactState<Option<ReferralSnapshot>>,
}

impl AccessFacts {
    /// All three facts resolved, nothing failed. The server-side gate always
    /// produces facts in this form.
    pub fn ready(
        premium_source: PremiumSource,
        subscription: Option<SubscriptionSnapshot>,
        referral: Option<ReferralSnapshot>,
    ) -> Self {
        AccessFacts {
            premium_source: FactState::Ready(premium_source),
            subscription: FactState::Ready(subscription),
            referral: FactState::Ready(referral),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AccessDecision {
    /// Caller holds active access from the named source.
    Granted(PremiumSource),
    Denied,
    /// At least one fact is still in flight. Callers must not render a
    /// denial state on this value.
    Unknown,
}

impl AccessDecision {
    pub fn has_active_access(&self) -> bool {
        matches!(self, AccessDecision::Granted(_))
    }

    pub fn source(&self) -> PremiumSource {
        match self {
            AccessDecision::Granted(source) => *source,
            _ => PremiumSource::None,
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, AccessDecision::Unknown)
    }
}

pub fn subscription_active(subscription: Option<&SubscriptionSnapshot>, now: DateTime<Utc>) -> bool {
    subscription.map(|s| s.expires_at > now).unwrap_or(false)
}

pub fn referral_active(referral: Option<&ReferralSnapshot>, now: DateTime<Utc>) -> bool {
    referral.map(|r| r.expires_at > now).unwrap_or(false)
}

/// Combine the fact set into a single decision.
///
/// The authoritative tag wins outright once it has arrived: a `none` tag
/// denies even when a stale subscription row still carries a future expiry,
/// and a non-`none` tag grants without consulting the timestamps. The
/// timestamp fallback applies only when the tag fetch itself failed.
pub fn resolve_access(facts: &AccessFacts, now: DateTime<Utc>) -> AccessDecision {
    if facts.premium_source.is_pending()
        || facts.subscription.is_pending()
        || facts.referral.is_pending()
    {
        return AccessDecision::Unknown;
    }

    if let Some(tag) = facts.premium_source.ready() {
        return if tag.grants_access() {
            AccessDecision::Granted(*tag)
        } else {
            AccessDecision::Denied
        };
    }

    // Tag fetch failed: fall back to expiry math over whatever arrived.
    // A failed subscription/referral fetch counts as no such grant.
    let subscription = facts.subscription.ready().and_then(|s| s.as_ref());
    let referral = facts.referral.ready().and_then(|r| r.as_ref());

    if subscription_active(subscription, now) {
        AccessDecision::Granted(PremiumSource::Stripe)
    } else if referral_active(referral, now) {
        AccessDecision::Granted(PremiumSource::Referral)
    } else {
        AccessDecision::Denied
    }
}

/// Raw grant state for one principal, as read from storage.
#[derive(Debug, Clone, Default)]
pub struct SourceInputs {
    /// `None` when no profile exists for the principal.
    pub role: Option<UserRole>,
    pub has_manual_grant: bool,
    pub subscription: Option<SubscriptionSnapshot>,
    pub referral: Option<ReferralSnapshot>,
}

/// Derive the authoritative tag from raw grant state.
///
/// Precedence: creator > admin > manual > stripe > referral > none.
/// Role-derived sources are not time-boxed; manual is an operator override
/// and outranks payment state.
pub fn derive_premium_source(inputs: &SourceInputs, now: DateTime<Utc>) -> PremiumSource {
    match inputs.role {
        Some(UserRole::Creator) => return PremiumSource::Creator,
        Some(UserRole::Admin) => return PremiumSource::Admin,
        _ => {}
    }

    if inputs.has_manual_grant {
        return PremiumSource::Manual;
    }

    if subscription_active(inputs.subscription.as_ref(), now) {
        return PremiumSource::Stripe;
    }

    if referral_active(inputs.referral.as_ref(), now) {
        return PremiumSource::Referral;
    }

    PremiumSource::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sub(expires_at: DateTime<Utc>) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            plan: SubscriptionPlan::Monthly,
            expires_at,
            stripe_session_id: "cs_test_123".to_string(),
        }
    }

    fn referral(expires_at: DateTime<Utc>) -> ReferralSnapshot {
        ReferralSnapshot {
            code: "LAUNCH30".to_string(),
            expires_at,
        }
    }

    #[test]
    fn any_non_none_tag_grants_access() {
        let now = Utc::now();
        for source in [
            PremiumSource::Stripe,
            PremiumSource::Referral,
            PremiumSource::Manual,
            PremiumSource::Admin,
            PremiumSource::Creator,
        ] {
            let decision = resolve_access(&AccessFacts::ready(source, None, None), now);
            assert_eq!(decision, AccessDecision::Granted(source));
            assert!(decision.has_active_access());
            assert_eq!(decision.source(), source);
        }
    }

    #[test]
    fn none_tag_with_no_fallback_data_denies() {
        let now = Utc::now();
        let decision = resolve_access(&AccessFacts::ready(PremiumSource::None, None, None), now);
        assert_eq!(decision, AccessDecision::Denied);
        assert!(!decision.has_active_access());
        assert_eq!(decision.source(), PremiumSource::None);
    }

    #[test]
    fn ready_tag_overrides_stale_timestamps() {
        // Profile still carries a future expiry but the freshly derived tag
        // says none: the tag decides.
        let now = Utc::now();
        let facts = AccessFacts::ready(
            PremiumSource::None,
            Some(sub(now + Duration::days(5))),
            Some(referral(now + Duration::days(5))),
        );
        assert_eq!(resolve_access(&facts, now), AccessDecision::Denied);
    }

    #[test]
    fn stale_stripe_tag_is_not_trusted_over_fresh_derivation() {
        // The documented invariant: once the tag is re-derived from an
        // expired subscription it reads none, and access is denied even
        // though the previous generation would have said "stripe".
        let now = Utc::now();
        let inputs = SourceInputs {
            role: Some(UserRole::User),
            has_manual_grant: false,
            subscription: Some(sub(now - Duration::seconds(1))),
            referral: None,
        };
        let tag = derive_premium_source(&inputs, now);
        assert_eq!(tag, PremiumSource::None);

        let facts = AccessFacts::ready(tag, inputs.subscription.clone(), None);
        assert_eq!(resolve_access(&facts, now), AccessDecision::Denied);
    }

    #[test]
    fn pending_fact_yields_unknown_never_denial() {
        let now = Utc::now();

        let all_pending = AccessFacts {
            premium_source: FactState::Pending,
            subscription: FactState::Pending,
            referral: FactState::Pending,
        };
        assert_eq!(resolve_access(&all_pending, now), AccessDecision::Unknown);

        // Even a tag that already arrived does not settle the decision
        // while a sibling fact is still in flight.
        let tag_first = AccessFacts {
            premium_source: FactState::Ready(PremiumSource::Stripe),
            subscription: FactState::Pending,
            referral: FactState::Ready(None),
        };
        let decision = resolve_access(&tag_first, now);
        assert_eq!(decision, AccessDecision::Unknown);
        assert!(!decision.is_settled());
        assert!(!decision.has_active_access());
    }

    #[test]
    fn failed_tag_falls_back_to_expiry_math() {
        let now = Utc::now();

        let with_active_sub = AccessFacts {
            premium_source: FactState::Failed,
            subscription: FactState::Ready(Some(sub(now + Duration::days(3)))),
            referral: FactState::Ready(None),
        };
        assert_eq!(
            resolve_access(&with_active_sub, now),
            AccessDecision::Granted(PremiumSource::Stripe)
        );

        let with_active_referral = AccessFacts {
            premium_source: FactState::Failed,
            subscription: FactState::Ready(Some(sub(now - Duration::days(3)))),
            referral: FactState::Ready(Some(referral(now + Duration::hours(1)))),
        };
        assert_eq!(
            resolve_access(&with_active_referral, now),
            AccessDecision::Granted(PremiumSource::Referral)
        );
    }

    #[test]
    fn all_fetches_failed_fails_closed() {
        let now = Utc::now();
        let facts = AccessFacts {
            premium_source: FactState::Failed,
            subscription: FactState::Failed,
            referral: FactState::Failed,
        };
        assert_eq!(resolve_access(&facts, now), AccessDecision::Denied);
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = Utc::now();
        assert!(!subscription_active(Some(&sub(now)), now));
        assert!(!referral_active(Some(&referral(now)), now));
        assert!(subscription_active(Some(&sub(now + Duration::nanoseconds(1))), now));
    }

    #[test]
    fn source_precedence_order() {
        let now = Utc::now();
        let everything = SourceInputs {
            role: Some(UserRole::Creator),
            has_manual_grant: true,
            subscription: Some(sub(now + Duration::days(10))),
            referral: Some(referral(now + Duration::days(10))),
        };
        assert_eq!(derive_premium_source(&everything, now), PremiumSource::Creator);

        let admin = SourceInputs {
            role: Some(UserRole::Admin),
            ..everything.clone()
        };
        assert_eq!(derive_premium_source(&admin, now), PremiumSource::Admin);

        let manual_and_paid = SourceInputs {
            role: Some(UserRole::User),
            ..everything.clone()
        };
        assert_eq!(derive_premium_source(&manual_and_paid, now), PremiumSource::Manual);

        let paid_only = SourceInputs {
            role: Some(UserRole::User),
            has_manual_grant: false,
            ..everything.clone()
        };
        assert_eq!(derive_premium_source(&paid_only, now), PremiumSource::Stripe);

        let referral_only = SourceInputs {
            role: Some(UserRole::User),
            has_manual_grant: false,
            subscription: None,
            referral: everything.referral.clone(),
        };
        assert_eq!(derive_premium_source(&referral_only, now), PremiumSource::Referral);
    }

    #[test]
    fn manual_grant_reads_manual_without_a_profile() {
        // Grant may precede profile creation; diagnosis still reports it.
        let now = Utc::now();
        let inputs = SourceInputs {
            role: None,
            has_manual_grant: true,
            subscription: None,
            referral: None,
        };
        assert_eq!(derive_premium_source(&inputs, now), PremiumSource::Manual);
    }

    #[test]
    fn no_grants_derives_none() {
        let now = Utc::now();
        let inputs = SourceInputs {
            role: Some(UserRole::User),
            ..Default::default()
        };
        assert_eq!(derive_premium_source(&inputs, now), PremiumSource::None);
        assert_eq!(derive_premium_source(&SourceInputs::default(), now), PremiumSource::None);
    }

    #[test]
    fn access_matches_tag_for_every_derivation() {
        // hasActiveAccess == (premiumSource != none), for any grant mix.
        let now = Utc::now();
        let mixes = [
            SourceInputs::default(),
            SourceInputs {
                role: Some(UserRole::User),
                subscription: Some(sub(now + Duration::days(1))),
                ..Default::default()
            },
            SourceInputs {
                role: Some(UserRole::User),
                referral: Some(referral(now - Duration::days(1))),
                ..Default::default()
            },
            SourceInputs {
                role: Some(UserRole::Admin),
                ..Default::default()
            },
            SourceInputs {
                has_manual_grant: true,
                ..Default::default()
            },
        ];

        for inputs in mixes {
            let tag = derive_premium_source(&inputs, now);
            let decision = resolve_access(&AccessFacts::ready(tag, None, None), now);
            assert_eq!(decision.has_active_access(), tag.grants_access());
            assert_eq!(decision.source(), tag);
        }
    }
}
