use bon::Builder;
use der::flagset::{FlagSet, flags};
use time::OffsetDateTime;

flags! {
    /// The individual chain-validation policies.
    ///
    /// Policies combine into a [`PolicySet`]; `validate` applies the set
    /// members in a fixed order and surfaces the first violation found.
    pub enum ValidationPolicy: u32 {
        /// Every certificate in the chain must be within its validity
        /// window at the validation time.
        Time,
        /// The chain must terminate at a certificate held in the store.
        Trusted,
        /// The leaf certificate must match the requested hostname.
        Hostname,
        /// The leaf key usage must permit TLS server authentication.
        SslKeyUsage,
        /// Every issuing certificate's key usage must permit certificate
        /// signing.
        CaKeyUsage,
        /// Every issuing certificate must be a CA within its path-length
        /// constraint.
        CaBasicConstraints,
    }
}

/// A set of validation policies.
pub type PolicySet = FlagSet<ValidationPolicy>;

/// The composite policy for ordinary TLS-peer validation: time, hostname,
/// trust anchoring, leaf and CA key usage, and CA basic constraints.
pub fn ssl_policy() -> PolicySet {
    ValidationPolicy::Time
        | ValidationPolicy::Hostname
        | ValidationPolicy::Trusted
        | ValidationPolicy::SslKeyUsage
        | ValidationPolicy::CaBasicConstraints
        | ValidationPolicy::CaKeyUsage
}

/// Parameters accompanying a validation call.
///
/// # Fields
/// * `hostname` - The hostname the leaf certificate must be valid for.
///   Required when the [`ValidationPolicy::Hostname`] policy is requested.
/// * `validation_date` - Overrides the validation time. Lets unit tests be
///   time-invariant; defaults to the current time.
#[derive(Clone, Debug, Default, Builder)]
pub struct ValidationParams {
    pub hostname: Option<String>,
    pub validation_date: Option<OffsetDateTime>,
}

impl ValidationParams {
    /// The effective validation timestamp.
    pub fn effective_date(&self) -> OffsetDateTime {
        self.validation_date
            .unwrap_or_else(OffsetDateTime::now_utc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssl_policy_is_the_documented_union() {
        let ssl = ssl_policy();
        assert!(ssl.contains(ValidationPolicy::Time));
        assert!(ssl.contains(ValidationPolicy::Trusted));
        assert!(ssl.contains(ValidationPolicy::Hostname));
        assert!(ssl.contains(ValidationPolicy::SslKeyUsage));
        assert!(ssl.contains(ValidationPolicy::CaKeyUsage));
        assert!(ssl.contains(ValidationPolicy::CaBasicConstraints));
    }

    #[test]
    fn test_params_effective_date_prefers_override() {
        let fixed = time::macros::datetime!(2024-06-01 12:00 UTC);
        let params = ValidationParams::builder().validation_date(fixed).build();
        assert_eq!(params.effective_date(), fixed);

        let now_params = ValidationParams::default();
        assert!(now_params.effective_date() > fixed);
    }
}
