/// Flag resolution cascade
///
/// Pure functions over already-fetched rows; the short-circuit order is the
/// contract, see the module docs on [`crate::flags`].

use crate::models::flag::{FeatureFlag, FlagKind};
use crate::models::tenant::ReleaseChannel;

/// User-level inputs to a gate check
#[derive(Debug, Clone, Copy, Default)]
pub struct UserAccess {
    /// Platform admins pass user gating unconditionally
    pub platform_admin: bool,

    /// Whether an explicit grant row exists for this user
    pub has_grant: bool,
}

/// Resolves the tenant-level value of a flag
///
/// Evaluates in order, short-circuiting at the first defined value:
/// killswitch, tenant override, channel default, global default.
pub fn resolve_tenant_value(
    flag: &FeatureFlag,
    tenant_override: Option<bool>,
    channel: ReleaseChannel,
) -> bool {
    // A killswitch with its global default off wins over everything.
    if flag.kind == FlagKind::Killswitch && !flag.enabled_default {
        return false;
    }

    if let Some(enabled) = tenant_override {
        return enabled;
    }

    if let Some(enabled) = flag.channel_default(channel) {
        return enabled;
    }

    flag.enabled_default
}

/// Resolves the effective value of a flag for a specific user
///
/// The tenant-level result is ANDed with user access: flags without user
/// gating pass everyone; gated flags require platform-admin status or an
/// explicit grant.
pub fn resolve_user_value(
    flag: &FeatureFlag,
    tenant_override: Option<bool>,
    channel: ReleaseChannel,
    access: &UserAccess,
) -> bool {
    let tenant_value = resolve_tenant_value(flag, tenant_override, channel);

    let user_allowed = !flag.user_gated || access.platform_admin || access.has_grant;

    tenant_value && user_allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn flag(kind: FlagKind, enabled_default: bool) -> FeatureFlag {
        FeatureFlag {
            key: "dispatch_board_v2".to_string(),
            description: String::new(),
            kind,
            enabled_default,
            internal_default: None,
            pilot_default: None,
            general_default: None,
            user_gated: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_killswitch_forces_false_over_everything() {
        let f = flag(FlagKind::Killswitch, false);

        // Tenant override and channel defaults cannot resurrect it
        assert!(!resolve_tenant_value(&f, Some(true), ReleaseChannel::General));

        let mut with_channel = f.clone();
        with_channel.internal_default = Some(true);
        assert!(!resolve_tenant_value(
            &with_channel,
            Some(true),
            ReleaseChannel::Internal
        ));
    }

    #[test]
    fn test_killswitch_with_true_default_behaves_normally() {
        let f = flag(FlagKind::Killswitch, true);
        assert!(resolve_tenant_value(&f, None, ReleaseChannel::General));
        assert!(!resolve_tenant_value(&f, Some(false), ReleaseChannel::General));
    }

    #[test]
    fn test_tenant_override_beats_channel_and_global() {
        let mut f = flag(FlagKind::Release, true);
        f.general_default = Some(true);
        assert!(!resolve_tenant_value(&f, Some(false), ReleaseChannel::General));
    }

    #[test]
    fn test_channel_default_beats_global() {
        let mut f = flag(FlagKind::Release, true);
        f.pilot_default = Some(false);

        // A channel default of false still short-circuits ahead of the
        // global default.
        assert!(!resolve_tenant_value(&f, None, ReleaseChannel::Pilot));
        // Channels without a defined default fall through to global
        assert!(resolve_tenant_value(&f, None, ReleaseChannel::General));
    }

    #[test]
    fn test_global_default_is_last_resort() {
        let f = flag(FlagKind::Release, true);
        assert!(resolve_tenant_value(&f, None, ReleaseChannel::Internal));

        let f = flag(FlagKind::Release, false);
        assert!(!resolve_tenant_value(&f, None, ReleaseChannel::Internal));
    }

    #[test]
    fn test_user_gating_ands_with_tenant_value() {
        let mut f = flag(FlagKind::Release, true);
        f.user_gated = true;

        let nobody = UserAccess::default();
        let admin = UserAccess {
            platform_admin: true,
            has_grant: false,
        };
        let granted = UserAccess {
            platform_admin: false,
            has_grant: true,
        };

        assert!(!resolve_user_value(&f, None, ReleaseChannel::General, &nobody));
        assert!(resolve_user_value(&f, None, ReleaseChannel::General, &admin));
        assert!(resolve_user_value(&f, None, ReleaseChannel::General, &granted));
    }

    #[test]
    fn test_user_grant_cannot_open_a_closed_tenant_gate() {
        let mut f = flag(FlagKind::Release, false);
        f.user_gated = true;

        let granted = UserAccess {
            platform_admin: false,
            has_grant: true,
        };

        assert!(!resolve_user_value(&f, None, ReleaseChannel::General, &granted));
    }

    #[test]
    fn test_ungated_flag_passes_every_user() {
        let f = flag(FlagKind::Release, true);
        let nobody = UserAccess::default();
        assert!(resolve_user_value(&f, None, ReleaseChannel::General, &nobody));
    }
}
