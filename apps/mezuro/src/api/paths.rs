//! Route helpers used for redirects and view links.

use mezuro_core::{KalibroConfigurationId, MetricConfigurationId};

pub fn new_user_session_path() -> String {
    "/users/sign_in".to_string()
}

pub fn kalibro_configurations_path() -> String {
    "/kalibro_configurations".to_string()
}

/// Where a user lands after trying to change a configuration they don't own.
pub fn kalibro_configurations_with_id_path(configuration: KalibroConfigurationId) -> String {
    format!("/kalibro_configurations?id={configuration}")
}

pub fn kalibro_configuration_path(configuration: KalibroConfigurationId) -> String {
    format!("/kalibro_configurations/{configuration}")
}

pub fn kalibro_configuration_metric_configuration_path(
    configuration: KalibroConfigurationId,
    metric_configuration: MetricConfigurationId,
) -> String {
    format!("/kalibro_configurations/{configuration}/metric_configurations/{metric_configuration}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_paths() {
        assert_eq!(
            kalibro_configuration_metric_configuration_path(
                KalibroConfigurationId(3),
                MetricConfigurationId(7)
            ),
            "/kalibro_configurations/3/metric_configurations/7"
        );
        assert_eq!(
            kalibro_configurations_with_id_path(KalibroConfigurationId(3)),
            "/kalibro_configurations?id=3"
        );
    }
}
