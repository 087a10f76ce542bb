use super::transition::DunningStep;
use chrono::TimeDelta;

/// Elapsed-time thresholds for each automatic dunning step, measured from the
/// order's `created_at`.
///
/// Two profiles exist: `production` with human-scale delays and `accelerated`
/// for end-to-end testing. The active profile is passed explicitly into every
/// decision; there is no ambient default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingPolicy {
    pub name: &'static str,
    pub confirmation_after: TimeDelta,
    pub invoice_after: TimeDelta,
    pub reminder1_after: TimeDelta,
    pub reminder2_after: TimeDelta,
}

impl TimingPolicy {
    pub fn production() -> Self {
        Self {
            name: "production",
            confirmation_after: TimeDelta::hours(4),
            invoice_after: TimeDelta::hours(24),
            reminder1_after: TimeDelta::days(7),
            reminder2_after: TimeDelta::days(14),
        }
    }

    pub fn accelerated() -> Self {
        Self {
            name: "accelerated",
            confirmation_after: TimeDelta::seconds(10),
            invoice_after: TimeDelta::seconds(30),
            reminder1_after: TimeDelta::seconds(60),
            reminder2_after: TimeDelta::seconds(120),
        }
    }

    pub fn select(accelerated: bool) -> Self {
        if accelerated {
            Self::accelerated()
        } else {
            Self::production()
        }
    }

    pub fn threshold(&self, step: DunningStep) -> TimeDelta {
        match step {
            DunningStep::Confirmation => self.confirmation_after,
            DunningStep::Invoice => self.invoice_after,
            DunningStep::Reminder1 => self.reminder1_after,
            DunningStep::Reminder2 => self.reminder2_after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_thresholds() {
        let policy = TimingPolicy::production();
        assert_eq!(policy.threshold(DunningStep::Confirmation), TimeDelta::hours(4));
        assert_eq!(policy.threshold(DunningStep::Invoice), TimeDelta::hours(24));
        assert_eq!(policy.threshold(DunningStep::Reminder1), TimeDelta::days(7));
        assert_eq!(policy.threshold(DunningStep::Reminder2), TimeDelta::days(14));
    }

    #[test]
    fn test_accelerated_thresholds() {
        let policy = TimingPolicy::accelerated();
        assert_eq!(
            policy.threshold(DunningStep::Confirmation),
            TimeDelta::seconds(10)
        );
        assert_eq!(policy.threshold(DunningStep::Invoice), TimeDelta::seconds(30));
        assert_eq!(
            policy.threshold(DunningStep::Reminder1),
            TimeDelta::seconds(60)
        );
        assert_eq!(
            policy.threshold(DunningStep::Reminder2),
            TimeDelta::seconds(120)
        );
    }

    #[test]
    fn test_select_maps_flag_to_profile() {
        assert_eq!(TimingPolicy::select(true), TimingPolicy::accelerated());
        assert_eq!(TimingPolicy::select(false), TimingPolicy::production());
    }
}
