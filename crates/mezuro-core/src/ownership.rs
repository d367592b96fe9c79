//! # Ownership Predicates
//!
//! Who may change what. A user owns a kalibro configuration outright; a
//! metric configuration (and every range under it) is owned through its
//! kalibro configuration.
//!
//! A record that does not exist is never owned, so a request against a
//! missing record reads as "not allowed" rather than "not found".

use crate::{
    Catalog, KalibroConfigurationId, MetricConfigurationId, MezuroError, ReadingGroupId, User,
};

/// The kalibro configuration exists and belongs to `user`.
pub fn kalibro_configuration_owner(
    catalog: &Catalog,
    user: &User,
    configuration: KalibroConfigurationId,
) -> Result<bool, MezuroError> {
    Ok(catalog
        .kalibro_configuration(configuration)?
        .is_some_and(|c| c.owner == user.id))
}

/// The metric configuration exists, sits under `configuration`, and `user`
/// owns that configuration.
pub fn metric_configuration_owner(
    catalog: &Catalog,
    user: &User,
    configuration: KalibroConfigurationId,
    metric_configuration: MetricConfigurationId,
) -> Result<bool, MezuroError> {
    let Some(mc) = catalog.metric_configuration(metric_configuration)? else {
        return Ok(false);
    };
    if mc.kalibro_configuration_id != configuration {
        return Ok(false);
    }
    kalibro_configuration_owner(catalog, user, configuration)
}

/// The reading group exists and belongs to `user`.
pub fn reading_group_owner(
    catalog: &Catalog,
    user: &User,
    group: ReadingGroupId,
) -> Result<bool, MezuroError> {
    Ok(catalog
        .reading_group(group)?
        .is_some_and(|g| g.owner == user.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AggregationForm, Metric, MetricKind, NewKalibroConfiguration, NewMetricConfiguration,
        NewReadingGroup,
    };

    #[test]
    fn ownership_follows_the_configuration() {
        let mut catalog = Catalog::new();
        let (owner, _) = catalog.create_user("Owner", "o@example.org").expect("owner");
        let (stranger, _) = catalog
            .create_user("Stranger", "s@example.org")
            .expect("stranger");

        let configuration = catalog
            .create_kalibro_configuration(NewKalibroConfiguration {
                name: "Ruby".to_string(),
                description: String::new(),
                owner: owner.id,
                public: false,
            })
            .expect("configuration");
        let other_configuration = catalog
            .create_kalibro_configuration(NewKalibroConfiguration {
                name: "Other".to_string(),
                description: String::new(),
                owner: owner.id,
                public: false,
            })
            .expect("configuration");
        let group = catalog
            .create_reading_group(NewReadingGroup {
                name: "Group".to_string(),
                description: String::new(),
                owner: owner.id,
            })
            .expect("group");
        let mc = catalog
            .create_metric_configuration(NewMetricConfiguration {
                kalibro_configuration_id: configuration.id,
                reading_group_id: group.id,
                metric: Metric {
                    name: "Flog".to_string(),
                    code: "flog".to_string(),
                    scope: "METHOD".to_string(),
                    kind: MetricKind::Native,
                    description: String::new(),
                    languages: vec!["RUBY".to_string()],
                    metric_collector_name: "MetricFu".to_string(),
                    script: None,
                },
                weight: 1.0,
                aggregation_form: AggregationForm::Mean,
            })
            .expect("mc");

        assert!(kalibro_configuration_owner(&catalog, &owner, configuration.id).expect("check"));
        assert!(
            !kalibro_configuration_owner(&catalog, &stranger, configuration.id).expect("check")
        );
        assert!(
            !kalibro_configuration_owner(&catalog, &owner, KalibroConfigurationId(99))
                .expect("check")
        );

        assert!(
            metric_configuration_owner(&catalog, &owner, configuration.id, mc.id).expect("check")
        );
        assert!(
            !metric_configuration_owner(&catalog, &stranger, configuration.id, mc.id)
                .expect("check")
        );
        // Right owner, wrong parent in the path.
        assert!(
            !metric_configuration_owner(&catalog, &owner, other_configuration.id, mc.id)
                .expect("check")
        );
        assert!(
            !metric_configuration_owner(
                &catalog,
                &owner,
                configuration.id,
                MetricConfigurationId(99)
            )
            .expect("check")
        );

        assert!(reading_group_owner(&catalog, &owner, group.id).expect("check"));
        assert!(!reading_group_owner(&catalog, &stranger, group.id).expect("check"));
    }
}
